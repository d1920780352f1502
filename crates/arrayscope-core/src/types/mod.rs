//! # Types
//!
//! Platform-agnostic types used throughout arrayscope.
//!
//! These types describe the traced process from the outside: where things
//! live (`Address`) and what shape they have (`TypeDescriptor`). None of them
//! own or point into the traced process.

pub mod address;
pub mod layout;

// Re-export all public types
pub use address::Address;
pub use layout::{BaseEncoding, FieldDescriptor, TypeDescriptor, TypeKind};

/// Byte order of the traced process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ByteOrder
{
    #[default]
    Little,
    Big,
}
