//! Live process memory on Linux.
//!
//! Reads go through `/proc/<pid>/mem` with positioned reads, which needs no
//! `unsafe` and works for any process the caller is allowed to `ptrace`
//! (same user with `ptrace_scope` 0, or a tracer that is already attached).
//!
//! See: [proc(5)](https://man7.org/linux/man-pages/man5/proc.5.html)

use std::fs::File;
use std::io::ErrorKind;
use std::os::unix::fs::FileExt;
use std::path::PathBuf;

use tracing::{debug, trace};

use super::MemoryReader;
use crate::error::{ScopeError, ScopeResult};
use crate::types::{Address, ByteOrder};

/// Memory of a live process, opened read-only
#[derive(Debug)]
pub struct ProcMemory
{
    pid: u32,
    mem: File,
}

impl ProcMemory
{
    /// Open `/proc/<pid>/mem`
    ///
    /// ## Errors
    ///
    /// - `InvalidArgument` if the process does not exist
    /// - `Io` for anything else (most commonly permission denied)
    pub fn open(pid: u32) -> ScopeResult<Self>
    {
        let path = Self::mem_path(pid);
        let mem = File::open(&path).map_err(|err| match err.kind() {
            ErrorKind::NotFound => ScopeError::InvalidArgument(format!("no such process: {pid}")),
            _ => ScopeError::Io(err),
        })?;
        debug!(pid, path = %path.display(), "opened process memory");
        Ok(Self { pid, mem })
    }

    fn mem_path(pid: u32) -> PathBuf
    {
        PathBuf::from(format!("/proc/{pid}/mem"))
    }
}

impl MemoryReader for ProcMemory
{
    fn read_memory(&self, address: Address, len: usize) -> ScopeResult<Vec<u8>>
    {
        trace!(pid = self.pid, %address, len, "process read");
        let mut data = vec![0u8; len];
        let mut filled = 0;
        while filled < len {
            let offset = address.value().saturating_add(filled as u64);
            match self.mem.read_at(&mut data[filled..], offset) {
                Ok(0) | Err(_) => return Err(ScopeError::UnreadableMemory { address, len }),
                Ok(n) => filled += n,
            }
        }
        Ok(data)
    }

    fn byte_order(&self) -> ByteOrder
    {
        if cfg!(target_endian = "big") {
            ByteOrder::Big
        } else {
            ByteOrder::Little
        }
    }
}
