//! Tests for addresses and type layouts

use arrayscope_core::types::{Address, BaseEncoding, FieldDescriptor, TypeDescriptor};

#[test]
fn test_address_from_u64()
{
    let address = Address::from(0x1234);
    assert_eq!(address.value(), 0x1234);
    let raw: u64 = address.into();
    assert_eq!(raw, 0x1234);
}

#[test]
fn test_address_display_is_padded_hex()
{
    assert_eq!(Address::from(0xdead).to_string(), "0x000000000000dead");
    assert_eq!(Address::ZERO.to_string(), "0x0000000000000000");
}

#[test]
fn test_address_parse()
{
    assert_eq!("0x7ffe0000".parse::<Address>().unwrap(), Address::from(0x7ffe_0000));
    assert_eq!("0X10".parse::<Address>().unwrap(), Address::from(16));
    assert_eq!("4096".parse::<Address>().unwrap(), Address::from(4096));
    assert!("0xzz".parse::<Address>().is_err());
    assert!("".parse::<Address>().is_err());
}

#[test]
fn test_address_null()
{
    assert!(Address::ZERO.is_null());
    assert!(!Address::from(1).is_null());
}

#[test]
fn test_element_addressing()
{
    let base = Address::from(0x1000);
    assert_eq!(base.element(0, 12), Some(base));
    assert_eq!(base.element(3, 12), Some(Address::from(0x1000 + 36)));
    assert_eq!(base.element(u64::MAX, 2), None);
    assert_eq!(Address::from(u64::MAX).element(1, 1), None);
    assert_eq!(Address::from(u64::MAX).checked_add(1), None);
}

#[test]
fn test_typedef_chain_resolves_to_struct()
{
    let point = TypeDescriptor::structure("Point", 8, vec![
        FieldDescriptor::new("x", 0, TypeDescriptor::base("int", 4, BaseEncoding::Signed)),
        FieldDescriptor::new("y", 4, TypeDescriptor::base("int", 4, BaseEncoding::Signed)),
    ]);
    let alias = TypeDescriptor::alias("PointAlias", Some(TypeDescriptor::alias("point_t", Some(point))));

    assert_eq!(alias.canonical().name, "Point");
    assert_eq!(alias.resolved_byte_size(), Some(8));
    assert_eq!(alias.field("y").map(|f| f.offset), Some(4));
    assert!(alias.field("z").is_none());
}

#[test]
fn test_pointer_layout()
{
    let int = TypeDescriptor::base("int", 4, BaseEncoding::Signed);
    let ptr = TypeDescriptor::pointer_to(Some(int), 8);
    assert!(ptr.is_pointer());
    assert_eq!(ptr.name, "int *");
    assert_eq!(ptr.pointee().map(|p| p.name.as_str()), Some("int"));

    let void_ptr = TypeDescriptor::pointer_to(None, 8);
    assert_eq!(void_ptr.name, "void *");
    assert!(void_ptr.pointee().is_none());
}
