//! # Target Memory
//!
//! Read-only access to the memory of a traced process.
//!
//! Visualizers never write into the process they observe, so the only
//! capability exposed here is reading a span of bytes at an address. Each
//! backend implements [`MemoryReader`]:
//!
//! - [`SnapshotMemory`]: a set of captured regions held in memory. Used by the
//!   tests and the demo, and by hosts that already copied the bytes out.
//! - [`ProcMemory`] (Linux): reads a live, stopped process through
//!   `/proc/<pid>/mem`.

pub mod snapshot;

#[cfg(target_os = "linux")]
pub mod procfs;

#[cfg(target_os = "linux")]
pub use procfs::ProcMemory;
pub use snapshot::{MemoryRegion, SnapshotMemory};

use crate::error::ScopeResult;
use crate::types::{Address, ByteOrder};

/// Read access to a traced process's address space
///
/// Implementations must either return exactly `len` bytes or an error; a
/// short read is reported as [`ScopeError::UnreadableMemory`](crate::error::ScopeError::UnreadableMemory).
///
/// ## Thread Safety
///
/// Readers are shared between a value and all children derived from it, so
/// they must be `Send + Sync`. The host still drives them from one thread at a
/// time while the process is halted.
pub trait MemoryReader: Send + Sync
{
    /// Read `len` bytes starting at `address`
    fn read_memory(&self, address: Address, len: usize) -> ScopeResult<Vec<u8>>;

    /// Byte order used to decode scalars
    fn byte_order(&self) -> ByteOrder
    {
        ByteOrder::Little
    }
}
