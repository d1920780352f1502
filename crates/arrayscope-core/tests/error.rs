//! Tests for error handling

use arrayscope_core::error::{ScopeError, ScopeResult};
use arrayscope_core::types::Address;

#[test]
fn test_unreadable_memory_display()
{
    let error = ScopeError::UnreadableMemory {
        address: Address::from(0x1000),
        len: 8,
    };
    let message = format!("{}", error);
    assert!(message.contains("Unreadable memory"));
    assert!(message.contains("8 bytes"));
    assert!(message.contains("0x0000000000001000"));
}

#[test]
fn test_missing_member_display()
{
    let error = ScopeError::MissingMember {
        type_name: "cmn::IllegalArray<int>".to_string(),
        member: "_size".to_string(),
    };
    let message = format!("{}", error);
    assert!(message.contains("cmn::IllegalArray<int>"));
    assert!(message.contains("_size"));
}

#[test]
fn test_invalid_argument_display()
{
    let error = ScopeError::InvalidArgument("test arg".to_string());
    let message = format!("{}", error);
    assert!(message.contains("Invalid argument"));
    assert!(message.contains("test arg"));
}

#[test]
fn test_pattern_error_keeps_source()
{
    use std::error::Error;

    let source = regex::Regex::new("(").unwrap_err();
    let error = ScopeError::Pattern {
        pattern: "(".to_string(),
        source,
    };
    assert!(format!("{}", error).contains("\"(\""));
    assert!(error.source().is_some());
}

#[test]
fn test_io_error_conversion()
{
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
    let error: ScopeError = io.into();
    assert!(matches!(error, ScopeError::Io(_)));
    assert!(format!("{}", error).contains("gone"));
}

#[test]
fn test_result_type()
{
    let _result: ScopeResult<()> = Ok(());
    let _error_result: ScopeResult<()> = Err(ScopeError::TypeNotFound("cmn::Missing".to_string()));
}
