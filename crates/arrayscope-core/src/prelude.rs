//! Common module for library exports

pub use crate::error::{ScopeError, ScopeResult};
pub use crate::formatters::{
    illegal_array_summary, FormatterConfig, FormatterRegistry, IllegalArraySyntheticProvider, SummaryProvider,
    SyntheticChildrenProvider,
};
#[cfg(target_os = "linux")]
pub use crate::memory::ProcMemory;
pub use crate::memory::{MemoryReader, SnapshotMemory};
pub use crate::symbols::BinaryImage;
pub use crate::types::{Address, BaseEncoding, ByteOrder, FieldDescriptor, TypeDescriptor, TypeKind};
pub use crate::value::ValueObject;
