//! Fixtures that lay out `cmn::IllegalArray<T>` instances byte for byte.
//!
//! The layout matches a 64-bit little-endian build:
//! `_ptr` at 0, `_capacity` at 8, `_size` at 16, 24 bytes total.

#![allow(dead_code)]

use std::sync::Arc;

use arrayscope_core::memory::SnapshotMemory;
use arrayscope_core::types::{Address, BaseEncoding, FieldDescriptor, TypeDescriptor};
use arrayscope_core::ValueObject;

pub const ARRAY_AT: u64 = 0x7ffe_0000;
pub const HEAP_AT: u64 = 0x5555_0000;

pub fn int_type() -> Arc<TypeDescriptor>
{
    TypeDescriptor::base("int", 4, BaseEncoding::Signed)
}

pub fn size_t() -> Arc<TypeDescriptor>
{
    TypeDescriptor::alias(
        "size_t",
        Some(TypeDescriptor::base("unsigned long", 8, BaseEncoding::Unsigned)),
    )
}

/// `cmn::IllegalArray<element>`
pub fn illegal_array_type(element: Arc<TypeDescriptor>) -> Arc<TypeDescriptor>
{
    let name = format!("cmn::IllegalArray<{}>", element.name);
    TypeDescriptor::structure(name, 24, vec![
        FieldDescriptor::new("_ptr", 0, TypeDescriptor::pointer_to(Some(element), 8)),
        FieldDescriptor::new("_capacity", 8, size_t()),
        FieldDescriptor::new("_size", 16, size_t()),
    ])
}

/// The three header words of an IllegalArray
pub fn header(ptr: u64, size: u64, capacity: u64) -> Vec<u8>
{
    [ptr.to_le_bytes(), capacity.to_le_bytes(), size.to_le_bytes()].concat()
}

pub fn i32_bytes(values: &[i32]) -> Vec<u8>
{
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// Memory holding an `IllegalArray<int>` header at [`ARRAY_AT`] and, if
/// `elements` is given, its buffer at [`HEAP_AT`]
pub fn int_array_memory(ptr: u64, size: u64, capacity: u64, elements: Option<&[i32]>) -> SnapshotMemory
{
    let mut memory = SnapshotMemory::new();
    memory.map(Address::from(ARRAY_AT), header(ptr, size, capacity));
    if let Some(elements) = elements {
        memory.map(Address::from(HEAP_AT), i32_bytes(elements));
    }
    memory
}

pub fn int_array_value(memory: SnapshotMemory) -> ValueObject
{
    ValueObject::new(
        "arr",
        Address::from(ARRAY_AT),
        illegal_array_type(int_type()),
        Arc::new(memory),
    )
}
