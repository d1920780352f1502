//! # Formatters
//!
//! Debugger visualizers: code the host calls to turn a raw [`ValueObject`]
//! into something a person can read.
//!
//! There are two kinds, matching what debuggers such as LLDB expose:
//!
//! - A **summary provider** renders a one-line description of a value.
//! - A **synthetic children provider** replaces a value's declared members
//!   with a computed list of children (e.g. the elements of a heap buffer).
//!
//! Both are looked up through a [`FormatterRegistry`] that matches type
//! names against patterns and groups formatters into categories the user can
//! switch on and off.
//!
//! ## Error policy
//!
//! A formatter that fails takes the whole debugging session down with it, so
//! nothing in this module returns an error to the host. Failed reads are
//! logged and replaced with sentinel values (zero counts, no children).

pub mod config;
pub mod illegal_array;
pub mod registry;

pub use config::FormatterConfig;
pub use illegal_array::{illegal_array_summary, IllegalArraySyntheticProvider, LayoutSnapshot};
pub use registry::{global_registry, initialize_session, FormatterInfo, FormatterKind, FormatterRegistry};

use crate::value::ValueObject;

/// Produces the one-line summary of a value
///
/// Implemented for any `Fn(&ValueObject) -> String`, so plain functions such
/// as [`illegal_array_summary`] register directly.
pub trait SummaryProvider: Send + Sync
{
    fn summarize(&self, value: &ValueObject) -> String;
}

impl<F> SummaryProvider for F
where
    F: Fn(&ValueObject) -> String + Send + Sync,
{
    fn summarize(&self, value: &ValueObject) -> String
    {
        self(value)
    }
}

/// Exposes a value as a list of computed children
///
/// ## Lifecycle
///
/// 1. The host creates a provider for a value (through the registry factory)
/// 2. The host calls [`update`](Self::update) whenever the value may have changed
/// 3. Between updates, the query methods answer from cached state
///
/// Providers do no invalidation on their own; answers only change after
/// `update`.
pub trait SyntheticChildrenProvider
{
    /// Rebuild cached state from the current contents of `value`
    fn update(&mut self, value: &ValueObject);

    /// Whether expanding the value would show anything
    fn has_children(&self) -> bool;

    /// Number of children the host should iterate over
    fn num_children(&self) -> u64;

    /// The child at `index`, or `None` if there is no such child
    ///
    /// Indices are signed because hosts may forward user input unchecked;
    /// negative indices are simply absent.
    fn child_at_index(&self, index: i64) -> Option<ValueObject>;

    /// Index of the child labeled `name`, if any
    fn child_index(&self, _name: &str) -> Option<i64>
    {
        None
    }
}
