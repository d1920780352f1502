//! Walk an `IllegalArray<int>` through the registered visualizers
//!
//! Lays out a fake "stopped process" in a memory snapshot, then drives the
//! summary and synthetic children providers the way a debugger host would:
//!
//! 1. Initialize the session (registers the formatters)
//! 2. Print the summary and every child
//! 3. Mutate the array in memory, showing the provider stays stale
//!    until `update` is called
//!
//! ## Usage:
//!
//! ```bash
//! RUST_LOG=trace cargo run --example synthetic_walk
//! ```

use std::sync::{Arc, PoisonError, RwLock};

use arrayscope_core::error::ScopeResult;
use arrayscope_core::formatters::{global_registry, initialize_session, FormatterConfig, SyntheticChildrenProvider};
use arrayscope_core::memory::{MemoryReader, SnapshotMemory};
use arrayscope_core::types::{Address, BaseEncoding, FieldDescriptor, TypeDescriptor};
use arrayscope_core::ValueObject;
use arrayscope_utils::init_logging;

const ARRAY_AT: u64 = 0x7ffe_0000;
const HEAP_AT: u64 = 0x5555_0000;

/// Snapshot the example can modify while values point into it
struct SharedMemory(RwLock<SnapshotMemory>);

impl MemoryReader for SharedMemory
{
    fn read_memory(&self, address: Address, len: usize) -> ScopeResult<Vec<u8>>
    {
        self.0
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .read_memory(address, len)
    }
}

fn main() -> ScopeResult<()>
{
    let _guard = init_logging().expect("Failed to initialize logging");
    initialize_session(&FormatterConfig::default())?;

    let int = TypeDescriptor::base("int", 4, BaseEncoding::Signed);
    let size_t = TypeDescriptor::alias(
        "size_t",
        Some(TypeDescriptor::base("unsigned long", 8, BaseEncoding::Unsigned)),
    );
    let array_type = TypeDescriptor::structure("cmn::IllegalArray<int>", 24, vec![
        FieldDescriptor::new("_ptr", 0, TypeDescriptor::pointer_to(Some(int), 8)),
        FieldDescriptor::new("_capacity", 8, size_t.clone()),
        FieldDescriptor::new("_size", 16, size_t),
    ]);

    let mut snapshot = SnapshotMemory::new();
    snapshot.map(
        Address::from(ARRAY_AT),
        [HEAP_AT.to_le_bytes(), 8u64.to_le_bytes(), 3u64.to_le_bytes()].concat(),
    );
    snapshot.map(
        Address::from(HEAP_AT),
        [10i32, 20, 30, 40, 0, 0, 0, 0].iter().flat_map(|v| v.to_le_bytes()).collect(),
    );
    let memory = Arc::new(SharedMemory(RwLock::new(snapshot)));
    let value = ValueObject::new("numbers", Address::from(ARRAY_AT), array_type, memory.clone());

    let registry = global_registry().read().unwrap_or_else(PoisonError::into_inner);
    let Some(mut provider) = registry.synthetic_for(&value) else {
        println!("no visualizer registered for {:?}", value.type_name());
        return Ok(());
    };

    let print = |provider: &dyn SyntheticChildrenProvider| {
        println!("{} = {}", value.name(), registry.summarize(&value).unwrap_or_default());
        for index in 0..provider.num_children() {
            let Ok(index) = i64::try_from(index) else { break };
            if let Some(child) = provider.child_at_index(index) {
                let at = child.address().map_or_else(|| "?".to_string(), |a| a.to_string());
                println!("  {} @ {at} = {}", child.name(), child.format_value());
            }
        }
    };

    print(provider.as_ref());

    println!("\n-- push_back(40) in the target --");
    memory
        .0
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .write(Address::from(ARRAY_AT + 16), &4u64.to_le_bytes())?;

    println!("before update: {} children", provider.num_children());
    provider.update(&value);
    println!("after update:  {} children", provider.num_children());
    print(provider.as_ref());

    Ok(())
}
