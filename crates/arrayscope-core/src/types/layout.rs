//! Type layouts as seen in debug information.
//!
//! A [`TypeDescriptor`] is everything the visualizers need to know about a
//! type: its name, its in-memory size (including padding), and its shape.
//! Descriptors are immutable and shared through `Arc`, so a container's
//! element type can be handed to every synthetic child without copying.

use std::sync::Arc;

/// How the bits of a base (scalar) type are interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseEncoding
{
    Signed,
    Unsigned,
    Float,
    Boolean,
    SignedChar,
    UnsignedChar,
    /// Anything else DWARF can describe (complex, decimal, UTF, ...)
    Other,
}

/// A named member of a structure, class or union
#[derive(Debug, Clone)]
pub struct FieldDescriptor
{
    /// Member name as written in the source
    pub name: String,
    /// Byte offset from the start of the enclosing value
    pub offset: u64,
    /// Member type
    pub ty: Arc<TypeDescriptor>,
}

/// The shape of a type
#[derive(Debug, Clone)]
pub enum TypeKind
{
    /// Integer, float, bool or character
    Base(BaseEncoding),
    /// Pointer or reference. `pointee` is `None` for `void*` and for pointers
    /// whose target type could not be resolved.
    Pointer
    {
        pointee: Option<Arc<TypeDescriptor>>,
    },
    /// Structure, class or union
    Struct
    {
        fields: Vec<FieldDescriptor>,
    },
    /// Typedef or cv-qualifier; transparent for layout purposes
    Alias
    {
        target: Option<Arc<TypeDescriptor>>,
    },
    /// Fixed-size array
    Array
    {
        element: Arc<TypeDescriptor>,
        count: Option<u64>,
    },
    /// C/C++ enumeration, stored as an integer of `byte_size` bytes
    Enum,
    /// Recognized by name only
    Unknown,
}

/// Layout of a single type
#[derive(Debug, Clone)]
pub struct TypeDescriptor
{
    /// Fully qualified name (`cmn::IllegalArray<int>`, `unsigned long`, `int *`)
    pub name: String,
    /// In-memory size in bytes, padding included. `None` for incomplete types.
    pub byte_size: Option<u64>,
    pub kind: TypeKind,
}

const MAX_ALIAS_DEPTH: usize = 32;

impl TypeDescriptor
{
    /// A base type such as `int` or `double`
    pub fn base(name: impl Into<String>, byte_size: u64, encoding: BaseEncoding) -> Arc<Self>
    {
        Arc::new(Self {
            name: name.into(),
            byte_size: Some(byte_size),
            kind: TypeKind::Base(encoding),
        })
    }

    /// A pointer of `pointer_size` bytes to `pointee`
    ///
    /// The name is derived from the pointee the way C++ spells it (`int *`).
    pub fn pointer_to(pointee: Option<Arc<TypeDescriptor>>, pointer_size: u64) -> Arc<Self>
    {
        let name = match &pointee {
            Some(target) => format!("{} *", target.name),
            None => "void *".to_string(),
        };
        Arc::new(Self {
            name,
            byte_size: Some(pointer_size),
            kind: TypeKind::Pointer { pointee },
        })
    }

    /// A structure with the given members
    pub fn structure(name: impl Into<String>, byte_size: u64, fields: Vec<FieldDescriptor>) -> Arc<Self>
    {
        Arc::new(Self {
            name: name.into(),
            byte_size: Some(byte_size),
            kind: TypeKind::Struct { fields },
        })
    }

    /// A typedef or qualifier wrapping `target`
    pub fn alias(name: impl Into<String>, target: Option<Arc<TypeDescriptor>>) -> Arc<Self>
    {
        let byte_size = target.as_ref().and_then(|t| t.byte_size);
        Arc::new(Self {
            name: name.into(),
            byte_size,
            kind: TypeKind::Alias { target },
        })
    }

    /// A type we only know by name
    pub fn opaque(name: impl Into<String>, byte_size: Option<u64>) -> Arc<Self>
    {
        Arc::new(Self {
            name: name.into(),
            byte_size,
            kind: TypeKind::Unknown,
        })
    }

    /// Strip typedefs and qualifiers
    ///
    /// Stops at the first alias with an unresolved target, returning that
    /// alias. Alias chains deeper than the DWARF reference limit are cut off
    /// the same way.
    pub fn canonical(&self) -> &TypeDescriptor
    {
        let mut current = self;
        for _ in 0..MAX_ALIAS_DEPTH {
            match &current.kind {
                TypeKind::Alias { target: Some(target) } => current = target,
                _ => break,
            }
        }
        current
    }

    /// Size in bytes after stripping aliases
    pub fn resolved_byte_size(&self) -> Option<u64>
    {
        self.byte_size.or_else(|| self.canonical().byte_size)
    }

    /// Look up a direct member by name
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor>
    {
        match &self.canonical().kind {
            TypeKind::Struct { fields } => fields.iter().find(|field| field.name == name),
            _ => None,
        }
    }

    /// Target type if this is a pointer (after stripping aliases)
    pub fn pointee(&self) -> Option<&Arc<TypeDescriptor>>
    {
        match &self.canonical().kind {
            TypeKind::Pointer { pointee } => pointee.as_ref(),
            _ => None,
        }
    }

    pub fn is_pointer(&self) -> bool
    {
        matches!(self.canonical().kind, TypeKind::Pointer { .. })
    }

    /// Scalar encoding, with enumerations read as signed integers
    pub fn scalar_encoding(&self) -> Option<BaseEncoding>
    {
        match &self.canonical().kind {
            TypeKind::Base(encoding) => Some(*encoding),
            TypeKind::Enum => Some(BaseEncoding::Signed),
            TypeKind::Pointer { .. } => Some(BaseEncoding::Unsigned),
            _ => None,
        }
    }
}

impl FieldDescriptor
{
    pub fn new(name: impl Into<String>, offset: u64, ty: Arc<TypeDescriptor>) -> Self
    {
        Self {
            name: name.into(),
            offset,
            ty,
        }
    }
}
