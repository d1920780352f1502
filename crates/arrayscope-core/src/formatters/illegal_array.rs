//! Visualizer for `cmn::IllegalArray<T>`.
//!
//! The container is three members: a data pointer `_ptr`, a reserved slot
//! count `_capacity` and a logical element count `_size`. Members are found
//! by name, never by offset, so any instantiation (and any ABI) works as long
//! as the debug information describes them.
//!
//! Capacity is only ever reported. Element bounds come from `_size` alone,
//! even when memory says `_capacity < _size`.

use std::sync::Arc;

use tracing::{debug, trace};

use super::SyntheticChildrenProvider;
use crate::error::{ScopeError, ScopeResult};
use crate::types::{Address, TypeDescriptor};
use crate::value::ValueObject;

/// Type-name pattern covering every instantiation of the container
pub const ILLEGAL_ARRAY_PATTERN: &str = r"^cmn::IllegalArray<.+>$";

/// Category both IllegalArray formatters are registered under
pub const ILLEGAL_ARRAY_CATEGORY: &str = "trex_illegal_array";

const PTR_MEMBER: &str = "_ptr";
const SIZE_MEMBER: &str = "_size";
const CAPACITY_MEMBER: &str = "_capacity";

/// Summary line: `size=<n>, capacity=<n>`
///
/// Either field reads as `0` if it cannot be located or read. Tooling greps
/// for this exact layout, so the field order and separators are fixed.
pub fn illegal_array_summary(value: &ValueObject) -> String
{
    let size = read_count(value, SIZE_MEMBER);
    let capacity = read_count(value, CAPACITY_MEMBER);
    format!("size={size}, capacity={capacity}")
}

fn read_count(value: &ValueObject, member: &str) -> u64
{
    match value.try_child_member(member).and_then(|field| field.try_value_as_unsigned()) {
        Ok(count) => count,
        Err(err) => {
            debug!(value = value.name(), member, error = %err, "count unreadable, reporting 0");
            0
        }
    }
}

/// State derived from one `update`
///
/// Rebuilt from scratch on every update. `base` is `None` when the data
/// pointer is missing, unreadable, null, or points at a type we cannot size.
#[derive(Debug, Clone, Default)]
pub struct LayoutSnapshot
{
    pub base: Option<Address>,
    pub element_type: Option<Arc<TypeDescriptor>>,
    /// Distance between consecutive elements, padding included
    pub element_size: u64,
    pub size: u64,
    pub capacity: u64,
}

impl LayoutSnapshot
{
    /// Read the snapshot from the current contents of `value`
    ///
    /// Never fails: every unreadable part falls back to its empty state.
    pub fn capture(value: &ValueObject) -> Self
    {
        let size = read_count(value, SIZE_MEMBER);
        let capacity = read_count(value, CAPACITY_MEMBER);

        let (base, element_type, element_size) = match Self::element_layout(value) {
            Ok((base, element_type, element_size)) => (base, Some(element_type), element_size),
            Err(err) => {
                debug!(value = value.name(), error = %err, "data pointer unusable");
                (None, None, 0)
            }
        };

        Self {
            base,
            element_type,
            element_size,
            size,
            capacity,
        }
    }

    fn element_layout(value: &ValueObject) -> ScopeResult<(Option<Address>, Arc<TypeDescriptor>, u64)>
    {
        let ptr = value.try_child_member(PTR_MEMBER)?;
        let ptr_type = ptr
            .value_type()
            .ok_or_else(|| ScopeError::InvalidValue(format!("{PTR_MEMBER} has no type")))?;
        let element_type = ptr_type
            .pointee()
            .cloned()
            .ok_or_else(|| ScopeError::InvalidValue(format!("{} does not point at a sized type", ptr_type.name)))?;
        let element_size = element_type
            .resolved_byte_size()
            .ok_or_else(|| ScopeError::InvalidValue(format!("{} has no known size", element_type.name)))?;
        let base = ptr.pointer_value()?;
        Ok((base, element_type, element_size))
    }

    /// Whether children can be served at all
    pub fn has_children(&self) -> bool
    {
        self.base.is_some() && self.size != 0
    }

    /// Address of element `index`, if it is in bounds and addressable
    ///
    /// The whole element must fit below the top of the address space; an
    /// element whose bytes would wrap around is absent.
    pub fn element_address(&self, index: i64) -> Option<Address>
    {
        let index = u64::try_from(index).ok()?;
        if index >= self.size {
            return None;
        }
        let start = self.base?.element(index, self.element_size)?;
        start.checked_add(self.element_size.saturating_sub(1))?;
        Some(start)
    }
}

/// Synthetic children provider exposing one child per logical element
///
/// Children are computed one at a time from the current snapshot, so
/// expanding the first rows of a huge array costs only those rows.
///
/// ## Example
///
/// ```rust
/// use std::sync::Arc;
///
/// use arrayscope_core::formatters::{IllegalArraySyntheticProvider, SyntheticChildrenProvider};
/// use arrayscope_core::memory::SnapshotMemory;
/// use arrayscope_core::ValueObject;
///
/// // An invalid handle never panics: it simply has no children.
/// let value = ValueObject::invalid("arr", Arc::new(SnapshotMemory::new()));
/// let provider = IllegalArraySyntheticProvider::new(&value);
/// assert!(!provider.has_children());
/// assert!(provider.child_at_index(0).is_none());
/// ```
#[derive(Debug)]
pub struct IllegalArraySyntheticProvider
{
    value: ValueObject,
    snapshot: LayoutSnapshot,
}

impl IllegalArraySyntheticProvider
{
    /// Bind a provider to `value` and take the first snapshot
    pub fn new(value: &ValueObject) -> Self
    {
        let mut provider = Self {
            value: value.clone(),
            snapshot: LayoutSnapshot::default(),
        };
        provider.update(value);
        provider
    }

    pub fn snapshot(&self) -> &LayoutSnapshot
    {
        &self.snapshot
    }
}

impl SyntheticChildrenProvider for IllegalArraySyntheticProvider
{
    fn update(&mut self, value: &ValueObject)
    {
        self.value = value.clone();
        self.snapshot = LayoutSnapshot::capture(&self.value);
        trace!(
            value = self.value.name(),
            size = self.snapshot.size,
            capacity = self.snapshot.capacity,
            stride = self.snapshot.element_size,
            base = ?self.snapshot.base,
            "snapshot rebuilt"
        );
    }

    fn has_children(&self) -> bool
    {
        self.snapshot.has_children()
    }

    fn num_children(&self) -> u64
    {
        self.snapshot.size
    }

    fn child_at_index(&self, index: i64) -> Option<ValueObject>
    {
        let address = self.snapshot.element_address(index)?;
        let element_type = self.snapshot.element_type.clone()?;
        trace!(value = self.value.name(), index, %address, "materializing child");
        Some(self.value.create_value_from_address(format!("[{index}]"), address, element_type))
    }

    fn child_index(&self, name: &str) -> Option<i64>
    {
        let digits = name.strip_prefix('[')?.strip_suffix(']')?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        // Labels are printed without padding, so `[007]` names no child.
        if digits.len() > 1 && digits.starts_with('0') {
            return None;
        }
        let index = digits.parse::<u64>().ok()?;
        if index >= self.snapshot.size {
            return None;
        }
        i64::try_from(index).ok()
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    fn snapshot(base: Option<u64>, size: u64, element_size: u64) -> LayoutSnapshot
    {
        LayoutSnapshot {
            base: base.map(Address::from),
            element_type: None,
            element_size,
            size,
            capacity: 0,
        }
    }

    #[test]
    fn test_element_address_bounds()
    {
        let snap = snapshot(Some(0x1000), 3, 4);
        assert_eq!(snap.element_address(0), Some(Address::from(0x1000)));
        assert_eq!(snap.element_address(2), Some(Address::from(0x1008)));
        assert_eq!(snap.element_address(3), None);
        assert_eq!(snap.element_address(-1), None);
        assert_eq!(snap.element_address(i64::MIN), None);
    }

    #[test]
    fn test_element_address_overflow_is_absent()
    {
        let snap = snapshot(Some(u64::MAX - 4), 4, 4);
        assert_eq!(snap.element_address(1), None);
        assert!(snap.element_address(0).is_some());
    }

    #[test]
    fn test_element_straddling_top_of_memory_is_absent()
    {
        // Element 1 starts at u64::MAX - 1 but its last byte would wrap.
        let snap = snapshot(Some(u64::MAX - 5), 2, 4);
        assert_eq!(snap.element_address(0), Some(Address::from(u64::MAX - 5)));
        assert_eq!(snap.element_address(1), None);

        // The last addressable byte can still hold a one-byte element.
        let bytes = snapshot(Some(u64::MAX - 1), 2, 1);
        assert_eq!(bytes.element_address(1), Some(Address::from(u64::MAX)));
    }

    #[test]
    fn test_has_children_requires_pointer_and_size()
    {
        assert!(snapshot(Some(0x1000), 1, 4).has_children());
        assert!(!snapshot(Some(0x1000), 0, 4).has_children());
        assert!(!snapshot(None, 5, 4).has_children());
        assert!(!snapshot(None, 0, 0).has_children());
    }

    #[test]
    fn test_no_base_rejects_every_index()
    {
        let snap = snapshot(None, 5, 4);
        assert!((0..5).all(|i| snap.element_address(i).is_none()));
    }
}
