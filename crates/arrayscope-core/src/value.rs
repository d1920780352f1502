//! # Values
//!
//! [`ValueObject`] is the host's handle to one typed object in the traced
//! process: an address, a type layout, and the memory the address refers to.
//!
//! A value never caches the bytes behind it. Every read goes back to the
//! [`MemoryReader`], so a handle stays meaningful across steps and only its
//! *contents* change. A value may also be invalid from the start (no address
//! or no type), which is how failed member lookups are represented: the host
//! keeps going with an invalid value instead of aborting.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use arrayscope_core::memory::SnapshotMemory;
//! use arrayscope_core::types::{Address, BaseEncoding, TypeDescriptor};
//! use arrayscope_core::ValueObject;
//!
//! let mut memory = SnapshotMemory::new();
//! memory.map(Address::from(0x1000), 42u32.to_le_bytes().to_vec());
//!
//! let int = TypeDescriptor::base("unsigned int", 4, BaseEncoding::Unsigned);
//! let value = ValueObject::new("answer", Address::from(0x1000), int, Arc::new(memory));
//! assert_eq!(value.value_as_unsigned(0), 42);
//! ```

use std::fmt;
use std::sync::Arc;

use crate::error::{ScopeError, ScopeResult};
use crate::memory::MemoryReader;
use crate::types::{Address, BaseEncoding, ByteOrder, TypeDescriptor, TypeKind};

/// A typed view of an object in target memory
#[derive(Clone)]
pub struct ValueObject
{
    name: String,
    address: Option<Address>,
    ty: Option<Arc<TypeDescriptor>>,
    memory: Arc<dyn MemoryReader>,
}

impl ValueObject
{
    /// A value of type `ty` stored at `address`
    pub fn new(
        name: impl Into<String>,
        address: Address,
        ty: Arc<TypeDescriptor>,
        memory: Arc<dyn MemoryReader>,
    ) -> Self
    {
        Self {
            name: name.into(),
            address: Some(address),
            ty: Some(ty),
            memory,
        }
    }

    /// A value that refers to nothing
    ///
    /// Every read on it fails with `InvalidValue`; every child lookup yields
    /// another invalid value.
    pub fn invalid(name: impl Into<String>, memory: Arc<dyn MemoryReader>) -> Self
    {
        Self {
            name: name.into(),
            address: None,
            ty: None,
            memory,
        }
    }

    /// Whether the value has both an address and a type
    ///
    /// A valid value can still sit on unreadable memory; validity only says
    /// the value can be located.
    pub fn is_valid(&self) -> bool
    {
        self.address.is_some() && self.ty.is_some()
    }

    pub fn name(&self) -> &str
    {
        &self.name
    }

    pub fn address(&self) -> Option<Address>
    {
        self.address
    }

    pub fn value_type(&self) -> Option<&Arc<TypeDescriptor>>
    {
        self.ty.as_ref()
    }

    /// Name of the value's type with typedefs stripped, as formatters match on it
    pub fn type_name(&self) -> Option<&str>
    {
        self.ty.as_deref().map(|ty| ty.canonical().name.as_str())
    }

    pub fn memory(&self) -> &Arc<dyn MemoryReader>
    {
        &self.memory
    }

    /// Look up a direct member by name
    ///
    /// Returns an invalid value if this value is invalid or its type has no
    /// such member. Nothing is read from memory.
    pub fn child_member_with_name(&self, member: &str) -> ValueObject
    {
        match self.try_child_member(member) {
            Ok(child) => child,
            Err(_) => ValueObject::invalid(member, self.memory.clone()),
        }
    }

    /// Fallible form of [`child_member_with_name`](Self::child_member_with_name)
    ///
    /// ## Errors
    ///
    /// - `InvalidValue` if this value is invalid
    /// - `MissingMember` if the type has no such member
    /// - `InvalidArgument` if the member offset overflows the address space
    pub fn try_child_member(&self, member: &str) -> ScopeResult<ValueObject>
    {
        let (address, ty) = self.location()?;
        let field = ty.field(member).ok_or_else(|| ScopeError::MissingMember {
            type_name: ty.name.clone(),
            member: member.to_string(),
        })?;
        let field_address = address
            .checked_add(field.offset)
            .ok_or_else(|| ScopeError::InvalidArgument(format!("member {member} of {address} overflows")))?;
        Ok(ValueObject::new(member, field_address, field.ty.clone(), self.memory.clone()))
    }

    /// A sibling value of type `ty` at an arbitrary address in the same memory
    ///
    /// Used by synthetic providers to materialize elements that are not
    /// members of any declared type.
    pub fn create_value_from_address(&self, name: impl Into<String>, address: Address, ty: Arc<TypeDescriptor>) -> ValueObject
    {
        ValueObject::new(name, address, ty, self.memory.clone())
    }

    /// Read the raw bytes of the value
    ///
    /// ## Errors
    ///
    /// - `InvalidValue` if the value is invalid or its type has no size
    /// - `UnreadableMemory` if the backing memory cannot be read
    pub fn data(&self) -> ScopeResult<Vec<u8>>
    {
        let (address, ty) = self.location()?;
        let size = ty
            .resolved_byte_size()
            .ok_or_else(|| ScopeError::InvalidValue(format!("{} has no known size", ty.name)))?;
        let len = usize::try_from(size)
            .map_err(|_| ScopeError::InvalidValue(format!("{} is too large to read ({size} bytes)", ty.name)))?;
        self.memory.read_memory(address, len)
    }

    /// Read the value as an unsigned integer
    ///
    /// Works for integers, characters, booleans, enums and pointers of 1, 2, 4
    /// or 8 bytes.
    ///
    /// ## Errors
    ///
    /// Any error from [`data`](Self::data), or `UnsupportedScalar` for other types.
    pub fn try_value_as_unsigned(&self) -> ScopeResult<u64>
    {
        let (_, ty) = self.location()?;
        if matches!(ty.scalar_encoding(), None | Some(BaseEncoding::Float)) {
            return Err(self.unsupported(ty));
        }
        let bytes = self.data()?;
        decode_unsigned(&bytes, self.memory.byte_order()).ok_or_else(|| self.unsupported(ty))
    }

    /// Read the value as an unsigned integer, or `default` on any failure
    pub fn value_as_unsigned(&self, default: u64) -> u64
    {
        self.try_value_as_unsigned().unwrap_or(default)
    }

    /// Read the value as a sign-extended integer
    ///
    /// ## Errors
    ///
    /// Same as [`try_value_as_unsigned`](Self::try_value_as_unsigned).
    pub fn try_value_as_signed(&self) -> ScopeResult<i64>
    {
        let raw = self.try_value_as_unsigned()?;
        // Width is one of 1, 2, 4 or 8 once the unsigned read succeeded.
        let bits = self.location()?.1.resolved_byte_size().unwrap_or(8) * 8;
        if bits >= 64 {
            return Ok(raw as i64);
        }
        let shift = 64 - bits;
        Ok(((raw << shift) as i64) >> shift)
    }

    /// Read the value as a sign-extended integer, or `default` on any failure
    pub fn value_as_signed(&self, default: i64) -> i64
    {
        self.try_value_as_signed().unwrap_or(default)
    }

    /// Read a 4- or 8-byte floating point value
    ///
    /// ## Errors
    ///
    /// Any error from [`data`](Self::data), or `UnsupportedScalar` for
    /// non-float types and unusual widths.
    pub fn try_value_as_float(&self) -> ScopeResult<f64>
    {
        let (_, ty) = self.location()?;
        if ty.scalar_encoding() != Some(BaseEncoding::Float) {
            return Err(self.unsupported(ty));
        }
        let bytes = self.data()?;
        let raw = decode_unsigned(&bytes, self.memory.byte_order()).ok_or_else(|| self.unsupported(ty))?;
        match bytes.len() {
            4 => Ok(f64::from(f32::from_bits(raw as u32))),
            8 => Ok(f64::from_bits(raw)),
            _ => Err(self.unsupported(ty)),
        }
    }

    /// The address a pointer value holds
    ///
    /// `Ok(None)` for a readable null pointer.
    ///
    /// ## Errors
    ///
    /// `UnsupportedScalar` if the value is not a pointer, or any read error.
    pub fn pointer_value(&self) -> ScopeResult<Option<Address>>
    {
        let (_, ty) = self.location()?;
        if !ty.is_pointer() {
            return Err(self.unsupported(ty));
        }
        let raw = self.try_value_as_unsigned()?;
        Ok((raw != 0).then(|| Address::new(raw)))
    }

    /// Render the value the way a debugger prints a leaf
    ///
    /// Integers in decimal, pointers in hex, characters quoted, aggregates as
    /// `{...}`. Values that cannot be read render as `<unavailable>`, never
    /// as an error.
    pub fn format_value(&self) -> String
    {
        self.try_format_value().unwrap_or_else(|_| "<unavailable>".to_string())
    }

    fn try_format_value(&self) -> ScopeResult<String>
    {
        let (_, ty) = self.location()?;
        let canonical = ty.canonical();
        let text = match &canonical.kind {
            TypeKind::Pointer { .. } => match self.pointer_value()? {
                Some(address) => format!("0x{:x}", address.value()),
                None => "nullptr".to_string(),
            },
            TypeKind::Base(BaseEncoding::Float) => self.try_value_as_float()?.to_string(),
            TypeKind::Base(BaseEncoding::Boolean) => (self.try_value_as_unsigned()? != 0).to_string(),
            TypeKind::Base(BaseEncoding::Signed) | TypeKind::Enum => self.try_value_as_signed()?.to_string(),
            TypeKind::Base(BaseEncoding::SignedChar | BaseEncoding::UnsignedChar) => {
                let code = self.try_value_as_unsigned()?;
                match u8::try_from(code).ok().filter(u8::is_ascii_graphic) {
                    Some(byte) => format!("{code} '{}'", char::from(byte)),
                    None => code.to_string(),
                }
            }
            TypeKind::Base(_) => self.try_value_as_unsigned()?.to_string(),
            TypeKind::Struct { .. } | TypeKind::Array { .. } => {
                // Touch the bytes so unreadable aggregates are reported as such.
                self.data()?;
                "{...}".to_string()
            }
            TypeKind::Alias { .. } | TypeKind::Unknown => return Err(self.unsupported(ty)),
        };
        Ok(text)
    }

    fn location(&self) -> ScopeResult<(Address, &TypeDescriptor)>
    {
        match (self.address, self.ty.as_deref()) {
            (Some(address), Some(ty)) => Ok((address, ty)),
            _ => Err(ScopeError::InvalidValue(format!("{} cannot be located", self.name))),
        }
    }

    fn unsupported(&self, ty: &TypeDescriptor) -> ScopeError
    {
        ScopeError::UnsupportedScalar {
            type_name: ty.name.clone(),
            byte_size: ty.resolved_byte_size(),
        }
    }
}

impl fmt::Debug for ValueObject
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.debug_struct("ValueObject")
            .field("name", &self.name)
            .field("address", &self.address)
            .field("type", &self.type_name())
            .finish_non_exhaustive()
    }
}

fn decode_unsigned(bytes: &[u8], byte_order: ByteOrder) -> Option<u64>
{
    if !matches!(bytes.len(), 1 | 2 | 4 | 8) {
        return None;
    }
    let mut buf = [0u8; 8];
    let value = match byte_order {
        ByteOrder::Little => {
            buf[..bytes.len()].copy_from_slice(bytes);
            u64::from_le_bytes(buf)
        }
        ByteOrder::Big => {
            buf[8 - bytes.len()..].copy_from_slice(bytes);
            u64::from_be_bytes(buf)
        }
    };
    Some(value)
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::memory::SnapshotMemory;
    use crate::types::FieldDescriptor;

    fn memory_with(address: u64, bytes: Vec<u8>) -> Arc<dyn MemoryReader>
    {
        let mut memory = SnapshotMemory::new();
        memory.map(Address::from(address), bytes);
        Arc::new(memory)
    }

    #[test]
    fn test_decode_unsigned_widths()
    {
        assert_eq!(decode_unsigned(&[0x34, 0x12], ByteOrder::Little), Some(0x1234));
        assert_eq!(decode_unsigned(&[0x12, 0x34], ByteOrder::Big), Some(0x1234));
        assert_eq!(decode_unsigned(&[1, 2, 3], ByteOrder::Little), None);
        assert_eq!(decode_unsigned(&[], ByteOrder::Little), None);
    }

    #[test]
    fn test_signed_read_sign_extends()
    {
        let memory = memory_with(0x10, (-5i16).to_le_bytes().to_vec());
        let short = TypeDescriptor::base("short", 2, BaseEncoding::Signed);
        let value = ValueObject::new("s", Address::from(0x10), short, memory);
        assert_eq!(value.value_as_signed(0), -5);
        assert_eq!(value.format_value(), "-5");
    }

    #[test]
    fn test_big_endian_read()
    {
        let mut memory = SnapshotMemory::new().with_byte_order(ByteOrder::Big);
        memory.map(Address::from(0x10), 0xdead_beefu32.to_be_bytes().to_vec());
        let uint = TypeDescriptor::base("unsigned int", 4, BaseEncoding::Unsigned);
        let value = ValueObject::new("u", Address::from(0x10), uint, Arc::new(memory));
        assert_eq!(value.value_as_unsigned(0), 0xdead_beef);
    }

    #[test]
    fn test_member_lookup()
    {
        let memory = memory_with(0x100, [7u32.to_le_bytes(), 9u32.to_le_bytes()].concat());
        let uint = TypeDescriptor::base("unsigned int", 4, BaseEncoding::Unsigned);
        let pair = TypeDescriptor::structure("pair", 8, vec![
            FieldDescriptor::new("a", 0, uint.clone()),
            FieldDescriptor::new("b", 4, uint),
        ]);
        let value = ValueObject::new("p", Address::from(0x100), pair, memory);

        let b = value.child_member_with_name("b");
        assert!(b.is_valid());
        assert_eq!(b.address(), Some(Address::from(0x104)));
        assert_eq!(b.value_as_unsigned(0), 9);

        let missing = value.child_member_with_name("c");
        assert!(!missing.is_valid());
        assert_eq!(missing.value_as_unsigned(77), 77);
        assert!(matches!(
            value.try_child_member("c"),
            Err(ScopeError::MissingMember { .. })
        ));
    }

    #[test]
    fn test_invalid_value_reads_default()
    {
        let value = ValueObject::invalid("nothing", memory_with(0, vec![]));
        assert!(!value.is_valid());
        assert_eq!(value.value_as_unsigned(3), 3);
        assert!(!value.child_member_with_name("x").is_valid());
        assert_eq!(value.format_value(), "<unavailable>");
    }

    #[test]
    fn test_unreadable_memory_reads_default()
    {
        let uint = TypeDescriptor::base("unsigned long", 8, BaseEncoding::Unsigned);
        let value = ValueObject::new("gone", Address::from(0xdead_0000), uint, memory_with(0x10, vec![0; 8]));
        assert!(value.is_valid());
        assert_eq!(value.value_as_unsigned(0), 0);
        assert!(matches!(value.data(), Err(ScopeError::UnreadableMemory { .. })));
    }

    #[test]
    fn test_pointer_and_float_formatting()
    {
        let mut bytes = 0x4000u64.to_le_bytes().to_vec();
        bytes.extend_from_slice(&0u64.to_le_bytes());
        bytes.extend_from_slice(&1.5f32.to_le_bytes());
        let memory = memory_with(0x200, bytes);
        let float = TypeDescriptor::base("float", 4, BaseEncoding::Float);
        let ptr = TypeDescriptor::pointer_to(Some(float.clone()), 8);

        let set = ValueObject::new("p", Address::from(0x200), ptr.clone(), memory.clone());
        assert_eq!(set.pointer_value().unwrap(), Some(Address::from(0x4000)));
        assert_eq!(set.format_value(), "0x4000");

        let null = ValueObject::new("q", Address::from(0x208), ptr, memory.clone());
        assert_eq!(null.pointer_value().unwrap(), None);
        assert_eq!(null.format_value(), "nullptr");

        let f = ValueObject::new("f", Address::from(0x210), float, memory);
        assert_eq!(f.format_value(), "1.5");
        assert!(f.try_value_as_unsigned().is_err());
    }

    #[test]
    fn test_char_formatting()
    {
        let memory = memory_with(0x10, vec![b'A', 0x07]);
        let ch = TypeDescriptor::base("char", 1, BaseEncoding::SignedChar);
        assert_eq!(
            ValueObject::new("c", Address::from(0x10), ch.clone(), memory.clone()).format_value(),
            "65 'A'"
        );
        assert_eq!(ValueObject::new("c", Address::from(0x11), ch, memory).format_value(), "7");
    }
}
