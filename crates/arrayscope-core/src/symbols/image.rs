//! Binary image parsing and DWARF section loading.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use gimli::{Dwarf, EndianArcSlice, RunTimeEndian, SectionId};
use object::{Object, ObjectSection};
use once_cell::sync::OnceCell;
use tracing::debug;

use super::extractor::{TypeExtractor, TypeIndex};
use super::OwnedDwarf;
use crate::error::{ScopeError, ScopeResult};
use crate::types::{ByteOrder, TypeDescriptor};

const DWARF_SECTIONS: &[(&str, &[&str])] = &[
    (".debug_abbrev", &[".debug_abbrev", "__debug_abbrev"]),
    (".debug_addr", &[".debug_addr", "__debug_addr"]),
    (".debug_info", &[".debug_info", "__debug_info"]),
    (".debug_line", &[".debug_line", "__debug_line"]),
    (".debug_line_str", &[".debug_line_str", "__debug_line_str"]),
    (".debug_ranges", &[".debug_ranges", "__debug_ranges"]),
    (".debug_rnglists", &[".debug_rnglists", "__debug_rnglists"]),
    (".debug_str", &[".debug_str", "__debug_str"]),
    (".debug_str_offsets", &[".debug_str_offsets", "__debug_str_offsets"]),
    (".debug_types", &[".debug_types", "__debug_types"]),
    (".debug_cu_index", &[".debug_cu_index"]),
    (".debug_tu_index", &[".debug_tu_index"]),
];

fn load_section_bytes(file: &object::File<'_>, names: &[&str]) -> ScopeResult<Arc<[u8]>>
{
    for name in names {
        if let Some(section) = file.section_by_name(name) {
            let data = section
                .uncompressed_data()
                .map_err(|err| ScopeError::InvalidArgument(format!("failed to read {name}: {err}")))?;
            return Ok(match data {
                Cow::Borrowed(bytes) => Arc::<[u8]>::from(bytes.to_vec()),
                Cow::Owned(vec) => vec.into(),
            });
        }
    }

    Ok(Arc::<[u8]>::from(Vec::new()))
}

/// A binary on disk with its DWARF type information
///
/// Parsing the DWARF and indexing its type names are deferred until the
/// first type lookup and then shared by every later one. Resolved types are
/// cached by the name they were requested under.
pub struct BinaryImage
{
    path: PathBuf,
    endian: RunTimeEndian,
    debug_sections: HashMap<&'static str, Arc<[u8]>>,
    dwarf_cache: OnceCell<OwnedDwarf>,
    type_index: OnceCell<TypeIndex>,
    type_cache: RwLock<HashMap<String, Arc<TypeDescriptor>>>,
}

impl BinaryImage
{
    /// Read and parse the binary at `path`
    ///
    /// ## Errors
    ///
    /// - `Io` if the file cannot be read
    /// - `InvalidArgument` if it is not an object file `object` understands
    pub fn open(path: impl AsRef<Path>) -> ScopeResult<Self>
    {
        let path = path.as_ref().to_path_buf();
        let bytes = fs::read(&path)?;
        let file = object::File::parse(&*bytes)
            .map_err(|err| ScopeError::InvalidArgument(format!("failed to parse {}: {err}", path.display())))?;

        let endian = if file.is_little_endian() {
            RunTimeEndian::Little
        } else {
            RunTimeEndian::Big
        };

        let mut sections = HashMap::new();
        for (canonical, aliases) in DWARF_SECTIONS {
            let data = load_section_bytes(&file, aliases)?;
            sections.insert(*canonical, data);
        }

        if sections.get(".debug_info").is_none_or(|data| data.is_empty()) {
            debug!(path = %path.display(), "binary has no .debug_info; type lookups will fail");
        }

        Ok(Self {
            path,
            endian,
            debug_sections: sections,
            dwarf_cache: OnceCell::new(),
            type_index: OnceCell::new(),
            type_cache: RwLock::new(HashMap::new()),
        })
    }

    pub fn byte_order(&self) -> ByteOrder
    {
        match self.endian {
            RunTimeEndian::Little => ByteOrder::Little,
            RunTimeEndian::Big => ByteOrder::Big,
        }
    }

    /// Resolve a type by fully qualified name
    ///
    /// ## Errors
    ///
    /// - `TypeNotFound` if no complete definition with that name exists
    /// - `Dwarf` if the debug information is malformed
    pub fn resolve_type(&self, name: &str) -> ScopeResult<Arc<TypeDescriptor>>
    {
        self.describe_type(name)?
            .ok_or_else(|| ScopeError::TypeNotFound(name.to_string()))
    }

    /// Like [`resolve_type`](Self::resolve_type) but `Ok(None)` when absent
    ///
    /// ## Errors
    ///
    /// `Dwarf` if the debug information is malformed.
    pub fn describe_type(&self, name: &str) -> ScopeResult<Option<Arc<TypeDescriptor>>>
    {
        if let Some(existing) = self
            .type_cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
        {
            return Ok(Some(existing.clone()));
        }

        let dwarf = self.dwarf()?;
        let extractor = TypeExtractor::new(dwarf, self.type_index()?);
        let Some(descriptor) = extractor.describe(name)? else {
            return Ok(None);
        };
        debug!(requested = name, resolved = %descriptor.name, size = ?descriptor.byte_size, "type resolved");

        let mut cache = self.type_cache.write().unwrap_or_else(PoisonError::into_inner);
        cache.insert(name.to_string(), descriptor.clone());
        if descriptor.name != name {
            cache.insert(descriptor.name.clone(), descriptor.clone());
        }
        Ok(Some(descriptor))
    }

    fn dwarf(&self) -> ScopeResult<&OwnedDwarf>
    {
        self.dwarf_cache.get_or_try_init(|| {
            Dwarf::load(|section| Ok::<_, gimli::Error>(self.section_reader(section)))
                .map_err(|err| ScopeError::InvalidArgument(format!("failed to load DWARF: {err}")))
        })
    }

    fn type_index(&self) -> ScopeResult<&TypeIndex>
    {
        self.type_index.get_or_try_init(|| {
            let index = TypeIndex::build(self.dwarf()?)?;
            debug!(path = %self.path.display(), definitions = index.definition_count(), "type index built");
            Ok(index)
        })
    }

    fn section_reader(&self, id: SectionId) -> EndianArcSlice<RunTimeEndian>
    {
        let key = match id {
            SectionId::DebugAbbrev => ".debug_abbrev",
            SectionId::DebugAddr => ".debug_addr",
            SectionId::DebugInfo => ".debug_info",
            SectionId::DebugLine => ".debug_line",
            SectionId::DebugLineStr => ".debug_line_str",
            SectionId::DebugRanges => ".debug_ranges",
            SectionId::DebugRngLists => ".debug_rnglists",
            SectionId::DebugStr => ".debug_str",
            SectionId::DebugStrOffsets => ".debug_str_offsets",
            SectionId::DebugTypes => ".debug_types",
            SectionId::DebugCuIndex => ".debug_cu_index",
            SectionId::DebugTuIndex => ".debug_tu_index",
            _ => "",
        };

        let data = self
            .debug_sections
            .get(key)
            .cloned()
            .unwrap_or_else(|| Arc::<[u8]>::from(Vec::new()));
        EndianArcSlice::new(data, self.endian)
    }
}

impl std::fmt::Debug for BinaryImage
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result
    {
        f.debug_struct("BinaryImage")
            .field("path", &self.path)
            .field("endian", &self.endian)
            .finish_non_exhaustive()
    }
}
