//! # Debug Information
//!
//! Type layouts read from a binary's DWARF sections.
//!
//! The visualizers never guess at layouts: container members, element types
//! and element sizes all come from the debug information of the traced
//! program. This module loads that information with `object` (ELF and
//! Mach-O) and walks it with `gimli`, producing [`TypeDescriptor`]s.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use arrayscope_core::symbols::BinaryImage;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>>
//! {
//!     let image = BinaryImage::open("/path/to/binary")?;
//!     let ty = image.resolve_type("cmn::IllegalArray<int>")?;
//!     println!("{} is {:?} bytes", ty.name, ty.byte_size);
//!     Ok(())
//! }
//! ```
//!
//! [`TypeDescriptor`]: crate::types::TypeDescriptor

mod extractor;
pub mod image;

use gimli::{Dwarf, EndianArcSlice, RunTimeEndian};
pub use image::BinaryImage;

use crate::error::ScopeError;

type OwnedReader = EndianArcSlice<RunTimeEndian>;
type OwnedDwarf = Dwarf<OwnedReader>;

pub(crate) fn map_dwarf_error(context: &str, err: gimli::Error) -> ScopeError
{
    ScopeError::Dwarf {
        context: context.to_string(),
        message: err.to_string(),
    }
}
