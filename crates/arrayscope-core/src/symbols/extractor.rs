//! DWARF type layout extraction.
//!
//! Builds [`TypeDescriptor`]s from debugging information entries. One pass
//! over every unit indexes named types by their fully qualified name
//! (`cmn::IllegalArray<int>`, not just `IllegalArray<int>`); resolution then
//! follows `DW_AT_type` references from the requested definition, pulling in
//! member, pointee and element types as it goes.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use gimli::{constants, AttributeValue, DebugTypeSignature, DebuggingInformationEntry, Reader, Unit, UnitOffset, UnitSectionOffset, UnitType};

use super::{map_dwarf_error, OwnedDwarf, OwnedReader};
use crate::error::ScopeResult;
use crate::types::{BaseEncoding, FieldDescriptor, TypeDescriptor, TypeKind};

const MAX_TYPE_REF_DEPTH: usize = 32;

type EntryKey = (usize, UnitOffset<usize>);

/// Qualified names of every type entry in a binary
///
/// Built once per [`BinaryImage`](super::BinaryImage); extraction runs
/// against it without walking the units again.
pub(crate) struct TypeIndex
{
    units: Vec<Unit<OwnedReader>>,
    /// Qualified name of every named type entry
    qualified: HashMap<EntryKey, String>,
    /// First complete (non-declaration) definition of each qualified name
    definitions: HashMap<String, EntryKey>,
}

impl TypeIndex
{
    pub(crate) fn build(dwarf: &OwnedDwarf) -> ScopeResult<Self>
    {
        let mut units = Vec::new();
        let mut headers = dwarf.units();
        while let Some(header) = headers
            .next()
            .map_err(|err| map_dwarf_error("reading .debug_info unit header", err))?
        {
            units.push(
                dwarf
                    .unit(header)
                    .map_err(|err| map_dwarf_error("parsing compilation unit", err))?,
            );
        }

        let mut type_headers = dwarf.type_units();
        while let Some(header) = type_headers
            .next()
            .map_err(|err| map_dwarf_error("reading .debug_types unit header", err))?
        {
            units.push(dwarf.unit(header).map_err(|err| map_dwarf_error("parsing type unit", err))?);
        }

        let mut qualified = HashMap::new();
        let mut definitions = HashMap::new();
        for (index, unit) in units.iter().enumerate() {
            index_unit(dwarf, index, unit, &mut qualified, &mut definitions)?;
        }

        Ok(Self {
            units,
            qualified,
            definitions,
        })
    }

    /// Definition named `target`
    ///
    /// Exact qualified matches win; otherwise a unique definition whose
    /// qualified name ends in `::target` is accepted.
    fn lookup(&self, target: &str) -> Option<EntryKey>
    {
        let wanted = normalize_name(target);
        self.definitions.get(&wanted).copied().or_else(|| {
            let suffix = format!("::{wanted}");
            let mut candidates = self
                .definitions
                .iter()
                .filter(|(name, _)| name.ends_with(&suffix))
                .map(|(_, key)| *key);
            match (candidates.next(), candidates.next()) {
                (Some(only), None) => Some(only),
                _ => None,
            }
        })
    }

    pub(crate) fn definition_count(&self) -> usize
    {
        self.definitions.len()
    }
}

pub(crate) struct TypeExtractor<'a>
{
    dwarf: &'a OwnedDwarf,
    index: &'a TypeIndex,
    resolved: RefCell<HashMap<EntryKey, Arc<TypeDescriptor>>>,
    in_progress: RefCell<HashSet<EntryKey>>,
}

impl<'a> TypeExtractor<'a>
{
    pub(crate) fn new(dwarf: &'a OwnedDwarf, index: &'a TypeIndex) -> Self
    {
        Self {
            dwarf,
            index,
            resolved: RefCell::new(HashMap::new()),
            in_progress: RefCell::new(HashSet::new()),
        }
    }

    /// Resolve the definition named `target`
    pub(crate) fn describe(&self, target: &str) -> ScopeResult<Option<Arc<TypeDescriptor>>>
    {
        match self.index.lookup(target) {
            Some((unit_index, offset)) => self.resolve_at(unit_index, offset, 0).map(Some),
            None => Ok(None),
        }
    }

    fn resolve_at(&self, unit_index: usize, offset: UnitOffset<usize>, depth: usize) -> ScopeResult<Arc<TypeDescriptor>>
    {
        let key = (unit_index, offset);
        if let Some(existing) = self.resolved.borrow().get(&key) {
            return Ok(existing.clone());
        }

        let unit = &self.index.units[unit_index];
        let entry = unit
            .entry(offset)
            .map_err(|err| map_dwarf_error("resolving type reference", err))?;
        let name = match self.index.qualified.get(&key) {
            Some(name) => Some(name.clone()),
            None => entry_name(self.dwarf, unit, &entry)?,
        };

        // Declarations carry no layout; jump to the definition if one exists.
        if is_declaration(&entry)? {
            if let Some(&(def_unit, def_offset)) = name.as_ref().and_then(|n| self.index.definitions.get(n)) {
                if (def_unit, def_offset) != key {
                    return self.resolve_at(def_unit, def_offset, depth + 1);
                }
            }
        }

        // Self-referential types (linked lists, trees) stop at a named stub.
        if depth >= MAX_TYPE_REF_DEPTH || !self.in_progress.borrow_mut().insert(key) {
            return Ok(TypeDescriptor::opaque(
                name.unwrap_or_else(|| "<unnamed>".to_string()),
                byte_size(&entry)?,
            ));
        }

        let result = self.build(unit_index, &entry, name, depth);
        self.in_progress.borrow_mut().remove(&key);
        let descriptor = result?;
        self.resolved.borrow_mut().insert(key, descriptor.clone());
        Ok(descriptor)
    }

    fn build(
        &self,
        unit_index: usize,
        entry: &DebuggingInformationEntry<'_, '_, OwnedReader>,
        name: Option<String>,
        depth: usize,
    ) -> ScopeResult<Arc<TypeDescriptor>>
    {
        let unit = &self.index.units[unit_index];
        let size = byte_size(entry)?;

        let descriptor = match entry.tag() {
            constants::DW_TAG_base_type => {
                let encoding = match entry
                    .attr(constants::DW_AT_encoding)
                    .map_err(|err| map_dwarf_error("reading DW_AT_encoding", err))?
                    .map(|attr| attr.value())
                {
                    Some(AttributeValue::Encoding(encoding)) => map_encoding(encoding),
                    _ => BaseEncoding::Other,
                };
                Arc::new(TypeDescriptor {
                    name: name.unwrap_or_else(|| "<base>".to_string()),
                    byte_size: size,
                    kind: TypeKind::Base(encoding),
                })
            }
            constants::DW_TAG_pointer_type
            | constants::DW_TAG_reference_type
            | constants::DW_TAG_rvalue_reference_type => {
                let pointee = self.resolve_type_attr(unit_index, entry, depth)?;
                let pointer_size = size.unwrap_or_else(|| u64::from(unit.encoding().address_size));
                let mut descriptor = TypeDescriptor::pointer_to(pointee, pointer_size);
                if let Some(name) = name {
                    Arc::make_mut(&mut descriptor).name = name;
                }
                descriptor
            }
            constants::DW_TAG_typedef
            | constants::DW_TAG_const_type
            | constants::DW_TAG_volatile_type
            | constants::DW_TAG_restrict_type
            | constants::DW_TAG_atomic_type => {
                let target = self.resolve_type_attr(unit_index, entry, depth)?;
                let target_name = target.as_ref().map_or("void", |t| t.name.as_str());
                let alias_name = match (entry.tag(), name) {
                    (_, Some(name)) => name,
                    (constants::DW_TAG_const_type, None) => format!("const {target_name}"),
                    (constants::DW_TAG_volatile_type, None) => format!("volatile {target_name}"),
                    (_, None) => target_name.to_string(),
                };
                TypeDescriptor::alias(alias_name, target)
            }
            constants::DW_TAG_structure_type | constants::DW_TAG_class_type | constants::DW_TAG_union_type => {
                let fields = self.collect_members(unit_index, entry.offset(), depth)?;
                Arc::new(TypeDescriptor {
                    name: name.unwrap_or_else(|| "<anonymous>".to_string()),
                    byte_size: size,
                    kind: TypeKind::Struct { fields },
                })
            }
            constants::DW_TAG_enumeration_type => {
                let size = match size {
                    Some(size) => Some(size),
                    None => self
                        .resolve_type_attr(unit_index, entry, depth)?
                        .and_then(|underlying| underlying.resolved_byte_size()),
                };
                Arc::new(TypeDescriptor {
                    name: name.unwrap_or_else(|| "<enum>".to_string()),
                    byte_size: size,
                    kind: TypeKind::Enum,
                })
            }
            constants::DW_TAG_array_type => {
                let element = self
                    .resolve_type_attr(unit_index, entry, depth)?
                    .unwrap_or_else(|| TypeDescriptor::opaque("<element>", None));
                let count = self.array_count(unit_index, entry.offset())?;
                let total = match (size, count, element.resolved_byte_size()) {
                    (Some(size), _, _) => Some(size),
                    (None, Some(count), Some(stride)) => count.checked_mul(stride),
                    _ => None,
                };
                let array_name = match count {
                    Some(count) => format!("{}[{count}]", element.name),
                    None => format!("{}[]", element.name),
                };
                Arc::new(TypeDescriptor {
                    name: name.unwrap_or(array_name),
                    byte_size: total,
                    kind: TypeKind::Array { element, count },
                })
            }
            _ => TypeDescriptor::opaque(name.unwrap_or_else(|| "<unsupported>".to_string()), size),
        };
        Ok(descriptor)
    }

    /// Data members and base-class subobjects of a structure, class or union
    fn collect_members(&self, unit_index: usize, offset: UnitOffset<usize>, depth: usize) -> ScopeResult<Vec<FieldDescriptor>>
    {
        let unit = &self.index.units[unit_index];
        let mut fields = Vec::new();
        let mut tree = unit
            .entries_tree(Some(offset))
            .map_err(|err| map_dwarf_error("building struct tree", err))?;
        let root = tree.root().map_err(|err| map_dwarf_error("navigating struct root", err))?;
        let mut children = root.children();
        while let Some(child) = children
            .next()
            .map_err(|err| map_dwarf_error("iterating struct children", err))?
        {
            let child_entry = child.entry().clone();
            let is_inheritance = match child_entry.tag() {
                constants::DW_TAG_member => false,
                constants::DW_TAG_inheritance => true,
                _ => continue,
            };

            let location = member_offset(&child_entry)?;
            // Static data members are declarations without a location.
            if location.is_none() && is_declaration(&child_entry)? {
                continue;
            }

            let ty = self
                .resolve_type_attr(unit_index, &child_entry, depth)?
                .unwrap_or_else(|| TypeDescriptor::opaque("<unknown>", None));
            let name = if is_inheritance {
                ty.name.clone()
            } else {
                entry_name(self.dwarf, unit, &child_entry)?.unwrap_or_default()
            };
            fields.push(FieldDescriptor::new(name, location.unwrap_or(0), ty));
        }
        Ok(fields)
    }

    /// Product of every dimension's element count, if all are known
    fn array_count(&self, unit_index: usize, offset: UnitOffset<usize>) -> ScopeResult<Option<u64>>
    {
        let unit = &self.index.units[unit_index];
        let mut tree = unit
            .entries_tree(Some(offset))
            .map_err(|err| map_dwarf_error("building array tree", err))?;
        let root = tree.root().map_err(|err| map_dwarf_error("navigating array root", err))?;
        let mut children = root.children();
        let mut total: Option<u64> = None;
        while let Some(child) = children
            .next()
            .map_err(|err| map_dwarf_error("iterating array dimensions", err))?
        {
            let entry = child.entry().clone();
            if entry.tag() != constants::DW_TAG_subrange_type {
                continue;
            }
            let count = if let Some(count) = udata_attr(&entry, constants::DW_AT_count, "reading DW_AT_count")? {
                Some(count)
            } else {
                udata_attr(&entry, constants::DW_AT_upper_bound, "reading DW_AT_upper_bound")?
                    .and_then(|upper| upper.checked_add(1))
            };
            let Some(count) = count else {
                return Ok(None);
            };
            total = Some(total.unwrap_or(1).saturating_mul(count));
        }
        Ok(total)
    }

    /// Follow `DW_AT_type`; `None` means `void` (or an unresolvable reference)
    fn resolve_type_attr(
        &self,
        unit_index: usize,
        entry: &DebuggingInformationEntry<'_, '_, OwnedReader>,
        depth: usize,
    ) -> ScopeResult<Option<Arc<TypeDescriptor>>>
    {
        let Some(attr) = entry
            .attr(constants::DW_AT_type)
            .map_err(|err| map_dwarf_error("reading DW_AT_type", err))?
        else {
            return Ok(None);
        };

        match attr.value() {
            AttributeValue::UnitRef(offset) => self.resolve_at(unit_index, offset, depth + 1).map(Some),
            AttributeValue::DebugInfoRef(offset) => {
                let target = UnitSectionOffset::from(offset);
                match self.find_unit_for_offset(target) {
                    Some((target_unit, unit_offset)) => self.resolve_at(target_unit, unit_offset, depth + 1).map(Some),
                    None => Ok(None),
                }
            }
            AttributeValue::DebugTypesRef(signature) => self.resolve_signature(signature, depth + 1),
            _ => Ok(None),
        }
    }

    fn resolve_signature(&self, signature: DebugTypeSignature, depth: usize) -> ScopeResult<Option<Arc<TypeDescriptor>>>
    {
        for (index, unit) in self.index.units.iter().enumerate() {
            match unit.header.type_() {
                UnitType::Type {
                    type_signature,
                    type_offset,
                }
                | UnitType::SplitType {
                    type_signature,
                    type_offset,
                } if type_signature == signature => {
                    return self.resolve_at(index, type_offset, depth).map(Some);
                }
                _ => {}
            }
        }
        Ok(None)
    }

    fn find_unit_for_offset(&self, target: UnitSectionOffset<usize>) -> Option<EntryKey>
    {
        self.index
            .units
            .iter()
            .enumerate()
            .find_map(|(index, unit)| target.to_unit_offset(unit).map(|offset| (index, offset)))
    }
}

/// Record qualified names for every named type in `unit`
///
/// Namespaces, classes, structures and unions open a scope; everything named
/// inside them is prefixed with the enclosing scopes.
fn index_unit(
    dwarf: &OwnedDwarf,
    unit_index: usize,
    unit: &Unit<OwnedReader>,
    qualified: &mut HashMap<EntryKey, String>,
    definitions: &mut HashMap<String, EntryKey>,
) -> ScopeResult<()>
{
    let mut cursor = unit.entries();
    let mut depth: isize = 0;
    let mut scopes: Vec<(isize, String)> = Vec::new();
    while let Some((delta, entry)) = cursor.next_dfs().map_err(|err| map_dwarf_error("traversing DIE tree", err))? {
        depth += delta;
        while scopes.last().is_some_and(|(scope_depth, _)| *scope_depth >= depth) {
            scopes.pop();
        }

        let tag = entry.tag();
        let opens_scope = matches!(
            tag,
            constants::DW_TAG_namespace
                | constants::DW_TAG_structure_type
                | constants::DW_TAG_class_type
                | constants::DW_TAG_union_type
        );
        let is_type = matches!(
            tag,
            constants::DW_TAG_structure_type
                | constants::DW_TAG_class_type
                | constants::DW_TAG_union_type
                | constants::DW_TAG_enumeration_type
                | constants::DW_TAG_typedef
                | constants::DW_TAG_base_type
        );
        if !opens_scope && !is_type {
            continue;
        }

        let name = match entry_name(dwarf, unit, entry)? {
            Some(name) => name,
            None if tag == constants::DW_TAG_namespace => "(anonymous namespace)".to_string(),
            None => continue,
        };
        let full = scopes
            .iter()
            .map(|(_, scope)| scope.as_str())
            .chain(std::iter::once(name.as_str()))
            .collect::<Vec<_>>()
            .join("::");
        let full = normalize_name(&full);

        if is_type {
            let key = (unit_index, entry.offset());
            qualified.insert(key, full.clone());
            if !is_declaration(entry)? {
                definitions.entry(full).or_insert(key);
            }
        }
        if opens_scope {
            scopes.push((depth, name));
        }
    }
    Ok(())
}

fn entry_name(
    dwarf: &OwnedDwarf,
    unit: &Unit<OwnedReader>,
    entry: &DebuggingInformationEntry<'_, '_, OwnedReader>,
) -> ScopeResult<Option<String>>
{
    let Some(attr) = entry
        .attr(constants::DW_AT_name)
        .map_err(|err| map_dwarf_error("reading DW_AT_name", err))?
    else {
        return Ok(None);
    };
    let reader = dwarf
        .attr_string(unit, attr.value())
        .map_err(|err| map_dwarf_error("resolving DWARF string", err))?;
    let owned = match reader.to_string() {
        Ok(cow) => cow.into_owned(),
        Err(_) => reader
            .to_string_lossy()
            .map_err(|err| map_dwarf_error("decoding DWARF string", err))?
            .into_owned(),
    };
    Ok(Some(owned))
}

fn is_declaration(entry: &DebuggingInformationEntry<'_, '_, OwnedReader>) -> ScopeResult<bool>
{
    let attr = entry
        .attr(constants::DW_AT_declaration)
        .map_err(|err| map_dwarf_error("reading DW_AT_declaration", err))?;
    Ok(matches!(attr.map(|a| a.value()), Some(AttributeValue::Flag(true))))
}

fn byte_size(entry: &DebuggingInformationEntry<'_, '_, OwnedReader>) -> ScopeResult<Option<u64>>
{
    udata_attr(entry, constants::DW_AT_byte_size, "reading DW_AT_byte_size")
}

fn member_offset(entry: &DebuggingInformationEntry<'_, '_, OwnedReader>) -> ScopeResult<Option<u64>>
{
    if let Some(bytes) = udata_attr(entry, constants::DW_AT_data_member_location, "reading DW_AT_data_member_location")? {
        return Ok(Some(bytes));
    }
    let bits = udata_attr(entry, constants::DW_AT_data_bit_offset, "reading DW_AT_data_bit_offset")?;
    Ok(bits.map(|bits| bits / 8))
}

fn udata_attr(
    entry: &DebuggingInformationEntry<'_, '_, OwnedReader>,
    name: constants::DwAt,
    context: &str,
) -> ScopeResult<Option<u64>>
{
    Ok(entry
        .attr(name)
        .map_err(|err| map_dwarf_error(context, err))?
        .and_then(|attr| attr.udata_value()))
}

fn map_encoding(encoding: constants::DwAte) -> BaseEncoding
{
    match encoding {
        constants::DW_ATE_signed => BaseEncoding::Signed,
        constants::DW_ATE_unsigned | constants::DW_ATE_UTF => BaseEncoding::Unsigned,
        constants::DW_ATE_float => BaseEncoding::Float,
        constants::DW_ATE_boolean => BaseEncoding::Boolean,
        constants::DW_ATE_signed_char => BaseEncoding::SignedChar,
        constants::DW_ATE_unsigned_char => BaseEncoding::UnsignedChar,
        _ => BaseEncoding::Other,
    }
}

/// Canonical spelling used for name comparisons
///
/// Drops a leading `::` and the spaces compilers disagree on inside
/// template argument lists (`IllegalArray<unsigned int>` keeps its inner
/// space; `Foo< int >` becomes `Foo<int>`).
fn normalize_name(name: &str) -> String
{
    let name = name.trim().strip_prefix("::").unwrap_or(name.trim());
    let mut out = String::with_capacity(name.len());
    let mut chars = name.chars().peekable();
    while let Some(c) = chars.next() {
        if c == ' ' {
            let prev = out.chars().last();
            let next = chars.peek().copied();
            let around_bracket = matches!(prev, Some('<' | ',' | ' ')) || matches!(next, Some('>' | '<' | ',' | ' '));
            if around_bracket || prev.is_none() {
                continue;
            }
        }
        out.push(c);
    }
    out
}
