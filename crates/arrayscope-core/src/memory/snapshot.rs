//! In-memory snapshot of target memory.

use tracing::trace;

use super::MemoryReader;
use crate::error::{ScopeError, ScopeResult};
use crate::types::{Address, ByteOrder};

/// A captured, contiguous range of target memory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryRegion
{
    /// Address of the first byte
    pub start: Address,
    /// Captured contents
    pub bytes: Vec<u8>,
}

impl MemoryRegion
{
    pub fn new(start: Address, bytes: Vec<u8>) -> Self
    {
        Self { start, bytes }
    }

    /// One past the last captured byte, saturating at the top of the address space
    pub fn end(&self) -> Address
    {
        Address::new(self.start.value().saturating_add(self.bytes.len() as u64))
    }

    /// The captured bytes in `[address, address + len)`, if fully covered
    fn slice(&self, address: Address, len: usize) -> Option<&[u8]>
    {
        let offset = address.value().checked_sub(self.start.value())?;
        let offset = usize::try_from(offset).ok()?;
        let end = offset.checked_add(len)?;
        self.bytes.get(offset..end)
    }
}

/// Memory made of captured regions
///
/// Any read that is not entirely inside one region fails with
/// [`ScopeError::UnreadableMemory`], the same way a read of unmapped pages
/// fails on a live process. Regions are kept in insertion order; writes go
/// through [`SnapshotMemory::write`] so tests can mutate a "stopped" process
/// between host calls.
///
/// ## Example
///
/// ```rust
/// use arrayscope_core::memory::{MemoryReader, SnapshotMemory};
/// use arrayscope_core::types::Address;
///
/// let mut memory = SnapshotMemory::new();
/// memory.map(Address::from(0x1000), vec![1, 2, 3, 4]);
/// assert_eq!(memory.read_memory(Address::from(0x1001), 2).unwrap(), vec![2, 3]);
/// assert!(memory.read_memory(Address::from(0x1003), 2).is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct SnapshotMemory
{
    regions: Vec<MemoryRegion>,
    byte_order: ByteOrder,
}

impl SnapshotMemory
{
    /// Empty little-endian snapshot
    #[must_use]
    pub fn new() -> Self
    {
        Self {
            regions: Vec::new(),
            byte_order: ByteOrder::Little,
        }
    }

    #[must_use]
    pub fn with_byte_order(mut self, byte_order: ByteOrder) -> Self
    {
        self.byte_order = byte_order;
        self
    }

    /// Add a region of captured bytes
    pub fn map(&mut self, start: Address, bytes: Vec<u8>)
    {
        self.regions.push(MemoryRegion::new(start, bytes));
    }

    /// Drop every region overlapping `address`, simulating a `free`
    pub fn unmap(&mut self, address: Address)
    {
        self.regions
            .retain(|region| !(region.start <= address && address < region.end()));
    }

    /// Overwrite bytes inside an existing region
    ///
    /// ## Errors
    ///
    /// `UnreadableMemory` if the range is not covered by a single region.
    pub fn write(&mut self, address: Address, data: &[u8]) -> ScopeResult<()>
    {
        for region in &mut self.regions {
            let Some(offset) = address.value().checked_sub(region.start.value()) else {
                continue;
            };
            let Ok(offset) = usize::try_from(offset) else {
                continue;
            };
            if let Some(target) = offset
                .checked_add(data.len())
                .and_then(|end| region.bytes.get_mut(offset..end))
            {
                target.copy_from_slice(data);
                return Ok(());
            }
        }
        Err(ScopeError::UnreadableMemory {
            address,
            len: data.len(),
        })
    }

    pub fn regions(&self) -> &[MemoryRegion]
    {
        &self.regions
    }
}

impl MemoryReader for SnapshotMemory
{
    fn read_memory(&self, address: Address, len: usize) -> ScopeResult<Vec<u8>>
    {
        trace!(%address, len, "snapshot read");
        self.regions
            .iter()
            .find_map(|region| region.slice(address, len))
            .map(<[u8]>::to_vec)
            .ok_or(ScopeError::UnreadableMemory { address, len })
    }

    fn byte_order(&self) -> ByteOrder
    {
        self.byte_order
    }
}
