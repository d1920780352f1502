//! # Error Types
//!
//! General error handling for the value model, memory backends and debug
//! information loaders.
//!
//! We use `thiserror` to automatically generate `Error` trait implementations
//! and nice error messages.
//!
//! Formatters never hand these errors to the host: the summary and synthetic
//! children providers log them and fall back to sentinel values instead.

use thiserror::Error;

use crate::types::Address;

/// Main error type for arrayscope operations
///
/// ## Error Categories
///
/// 1. **Handle errors**: InvalidValue, MissingMember
/// 2. **Memory errors**: UnreadableMemory
/// 3. **Type errors**: UnsupportedScalar, TypeNotFound, Dwarf
/// 4. **Registry errors**: Pattern, UnknownCategory
/// 5. **I/O errors**: Io
#[derive(Error, Debug)]
pub enum ScopeError
{
    /// The value has no address or no type and cannot be read at all
    ///
    /// This is the "invalid handle" class: the host gave us a value whose
    /// fields cannot be located, e.g. an optimized-out variable or a child
    /// lookup that already failed.
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    /// The value's type has no member with the given name
    #[error("Type {type_name} has no member named {member}")]
    MissingMember
    {
        /// Name of the type that was searched
        type_name: String,
        /// Member that was requested
        member: String,
    },

    /// The backing memory is not accessible
    ///
    /// Fields exist in the type layout but the bytes behind them cannot be
    /// read (freed, unmapped, swapped out, or outside the captured snapshot).
    #[error("Unreadable memory: {len} bytes at {address}")]
    UnreadableMemory
    {
        /// Start of the failed read
        address: Address,
        /// Number of bytes requested
        len: usize,
    },

    /// The value is not a scalar of a width we know how to decode
    #[error("Cannot read {type_name} ({byte_size:?} bytes) as a scalar")]
    UnsupportedScalar
    {
        /// Name of the offending type
        type_name: String,
        /// Byte size recorded for the type, if any
        byte_size: Option<u64>,
    },

    /// Invalid argument passed to an arrayscope function
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// No type with the given name exists in the loaded debug information
    #[error("Type not found: {0}")]
    TypeNotFound(String),

    /// DWARF data could not be parsed
    #[error("DWARF error while {context}: {message}")]
    Dwarf
    {
        /// What we were doing when parsing failed
        context: String,
        /// Message reported by the DWARF reader
        message: String,
    },

    /// A type-name pattern failed to compile
    #[error("Invalid type-name pattern {pattern:?}: {source}")]
    Pattern
    {
        /// The pattern as written
        pattern: String,
        /// Underlying regex error
        #[source]
        source: regex::Error,
    },

    /// No formatter category with the given name has been registered
    #[error("Unknown formatter category: {0}")]
    UnknownCategory(String),

    /// I/O error (for file operations, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for `Result<T, ScopeError>`
///
/// ```rust
/// use arrayscope_core::error::ScopeResult;
/// fn foo() -> ScopeResult<()>
/// {
///     Ok(())
/// }
/// ```
pub type ScopeResult<T> = std::result::Result<T, ScopeError>;
