//! # arrayscope-core
//!
//! Debugger visualizers for contiguous dynamic arrays.
//!
//! A dynamic array in a traced process is just three words of memory: a
//! data pointer, a logical size and a capacity. This crate turns such a value
//! back into something navigable:
//!
//! - a **summary** (`size=3, capacity=8`) for one-line display
//! - **synthetic children** (`[0]`, `[1]`, ...) computed on demand from the
//!   data pointer and the element type's size
//!
//! The visualizers sit behind a [`FormatterRegistry`](formatters::FormatterRegistry)
//! that routes values to them by type name, the way a debugger host does.
//!
//! ## Building blocks
//!
//! - [`types`]: addresses and type layouts
//! - [`memory`]: read-only access to target memory (snapshots, `/proc/<pid>/mem`)
//! - [`value`]: typed handles into target memory
//! - [`symbols`]: type layouts from DWARF
//! - [`formatters`]: the visualizers and their registry
//!
//! ## Error policy
//!
//! Everything below the formatters returns [`ScopeResult`]. The formatters
//! themselves never fail: unreadable values become zero counts and empty
//! child lists.

pub mod error;
pub mod formatters;
pub mod memory;
pub mod prelude;
pub mod symbols;
pub mod types;
pub mod value;

pub use error::{ScopeError, ScopeResult};
pub use types::{Address, TypeDescriptor};
pub use value::ValueObject;
