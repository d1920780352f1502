//! Tests for formatter lookup and session initialization

mod support;

use std::sync::Arc;

use arrayscope_core::formatters::{
    global_registry, initialize_session, FormatterConfig, FormatterRegistry, IllegalArraySyntheticProvider,
    SyntheticChildrenProvider,
};
use arrayscope_core::memory::SnapshotMemory;
use arrayscope_core::types::{Address, BaseEncoding, FieldDescriptor, TypeDescriptor};
use arrayscope_core::ValueObject;
use support::*;

fn installed() -> FormatterRegistry
{
    let mut registry = FormatterRegistry::new();
    registry.install_illegal_array(&FormatterConfig::default()).unwrap();
    registry
}

fn value_of_type(ty: Arc<TypeDescriptor>) -> ValueObject
{
    ValueObject::new("v", Address::from(ARRAY_AT), ty, Arc::new(SnapshotMemory::new()))
}

#[test]
fn test_pattern_matches_instantiations()
{
    let registry = installed();
    let double = TypeDescriptor::base("double", 8, BaseEncoding::Float);
    let point = TypeDescriptor::structure("geo::Point", 8, Vec::new());

    for element in [int_type(), double, point] {
        let value = value_of_type(illegal_array_type(element));
        assert!(registry.summary_for(&value).is_some(), "{:?}", value.type_name());
        assert!(registry.synthetic_for(&value).is_some());
    }
}

#[test]
fn test_pattern_rejects_other_types()
{
    let registry = installed();
    for name in [
        "cmn::IllegalArray<>",
        "cmn::IllegalArray",
        "std::vector<int>",
        "other::cmn::IllegalArray<int>",
        "cmn::IllegalArray<int>::iterator",
    ] {
        let value = value_of_type(TypeDescriptor::structure(name, 24, Vec::new()));
        assert!(registry.summary_for(&value).is_none(), "{name} should not match");
        assert!(registry.synthetic_for(&value).is_none());
    }
}

#[test]
fn test_summary_through_registry()
{
    let registry = installed();
    let value = int_array_value(int_array_memory(HEAP_AT, 3, 8, Some(&[10, 20, 30])));
    assert_eq!(registry.summarize(&value).as_deref(), Some("size=3, capacity=8"));
}

#[test]
fn test_synthetic_from_registry_is_updated()
{
    let registry = installed();
    let value = int_array_value(int_array_memory(HEAP_AT, 3, 8, Some(&[10, 20, 30])));
    let provider = registry.synthetic_for(&value).unwrap();
    assert_eq!(provider.num_children(), 3);
    assert_eq!(provider.child_at_index(2).unwrap().value_as_signed(0), 30);
}

#[test]
fn test_disabled_category_is_invisible()
{
    let mut registry = installed();
    let value = int_array_value(int_array_memory(HEAP_AT, 1, 1, Some(&[1])));

    registry.disable_category("trex_illegal_array").unwrap();
    assert!(registry.summary_for(&value).is_none());
    assert!(registry.synthetic_for(&value).is_none());

    registry.enable_category("trex_illegal_array").unwrap();
    assert!(registry.summary_for(&value).is_some());
}

#[test]
fn test_typedef_of_container_is_recognized()
{
    let registry = installed();
    let memory = int_array_memory(HEAP_AT, 2, 2, Some(&[5, 6]));
    let alias = TypeDescriptor::alias("IntList", Some(illegal_array_type(int_type())));
    let value = ValueObject::new("list", Address::from(ARRAY_AT), alias, Arc::new(memory));

    assert_eq!(registry.summarize(&value).as_deref(), Some("size=2, capacity=2"));
    assert_eq!(registry.synthetic_for(&value).unwrap().num_children(), 2);
}

#[test]
fn test_most_recent_registration_wins()
{
    let mut registry = installed();
    registry
        .add_summary("custom", r"^cmn::IllegalArray<int>$", |_: &ValueObject| "custom".to_string())
        .unwrap();
    let value = int_array_value(int_array_memory(HEAP_AT, 1, 1, Some(&[1])));

    // Not enabled yet: the built-in summary still applies.
    assert_eq!(registry.summarize(&value).as_deref(), Some("size=1, capacity=1"));

    registry.enable_category("custom").unwrap();
    assert_eq!(registry.summarize(&value).as_deref(), Some("custom"));

    // Other instantiations still fall through to the built-in.
    let double = value_of_type(illegal_array_type(TypeDescriptor::base("double", 8, BaseEncoding::Float)));
    assert_eq!(registry.summarize(&double).as_deref(), Some("size=0, capacity=0"));
}

#[test]
fn test_nested_arrays_expand_recursively()
{
    // IllegalArray<IllegalArray<int>> with two inner arrays of sizes 2 and 1
    const OUTER_AT: u64 = 0x1000;
    const INNER_AT: u64 = 0x2000;
    const DATA_A: u64 = 0x3000;
    const DATA_B: u64 = 0x4000;

    let inner_type = illegal_array_type(int_type());
    let outer_type = illegal_array_type(inner_type);

    let mut memory = SnapshotMemory::new();
    memory.map(Address::from(OUTER_AT), header(INNER_AT, 2, 2));
    memory.map(Address::from(INNER_AT), [header(DATA_A, 2, 4), header(DATA_B, 1, 1)].concat());
    memory.map(Address::from(DATA_A), i32_bytes(&[1, 2]));
    memory.map(Address::from(DATA_B), i32_bytes(&[3]));
    let outer = ValueObject::new("grid", Address::from(OUTER_AT), outer_type, Arc::new(memory));

    let registry = installed();
    assert_eq!(registry.summarize(&outer).as_deref(), Some("size=2, capacity=2"));

    let rows = registry.synthetic_for(&outer).unwrap();
    let second = rows.child_at_index(1).unwrap();
    assert_eq!(second.type_name(), Some("cmn::IllegalArray<int>"));
    assert_eq!(registry.summarize(&second).as_deref(), Some("size=1, capacity=1"));

    let cells = registry.synthetic_for(&second).unwrap();
    assert_eq!(cells.child_at_index(0).unwrap().value_as_signed(0), 3);

    let first_row = IllegalArraySyntheticProvider::new(&rows.child_at_index(0).unwrap());
    assert_eq!(first_row.child_at_index(1).unwrap().value_as_signed(0), 2);
}

#[test]
fn test_custom_config_pattern()
{
    let mut registry = FormatterRegistry::new();
    let config = FormatterConfig::default()
        .with_pattern(r"^my::Buffer<.+>$")
        .with_category("mine");
    registry.install_illegal_array(&config).unwrap();

    let buffer = TypeDescriptor::structure("my::Buffer<int>", 24, vec![FieldDescriptor::new(
        "_size",
        16,
        size_t(),
    )]);
    assert!(registry.summary_for(&value_of_type(buffer)).is_some());
    assert!(registry
        .summary_for(&value_of_type(illegal_array_type(int_type())))
        .is_none());
    assert_eq!(registry.is_category_enabled("trex_illegal_array"), None);
}

#[test]
fn test_initialize_session_resets_global_registry()
{
    let value = int_array_value(int_array_memory(HEAP_AT, 1, 1, Some(&[1])));

    initialize_session(&FormatterConfig::default()).unwrap();
    global_registry()
        .write()
        .unwrap()
        .disable_category("trex_illegal_array")
        .unwrap();
    assert!(global_registry().read().unwrap().summary_for(&value).is_none());

    initialize_session(&FormatterConfig::default()).unwrap();
    let registry = global_registry().read().unwrap();
    assert_eq!(registry.describe().len(), 2);
    assert_eq!(registry.summarize(&value).as_deref(), Some("size=1, capacity=1"));
}
