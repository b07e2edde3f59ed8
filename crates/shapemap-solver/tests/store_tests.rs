use super::*;
use crate::types::NameComparison;

#[test]
fn test_primitives_occupy_reserved_ids() {
    let store = TypeStore::new();
    assert_eq!(store.name(TypeId::INT), "int");
    assert_eq!(store.name(TypeId::STRING), "string");
    assert_eq!(store.primitive(TypeId::DATE_TIME), Some(PrimitiveKind::DateTime));
    assert_eq!(store.by_name("decimal"), Some(TypeId::DECIMAL));
}

#[test]
fn test_instantiation_is_interned() {
    let mut store = TypeStore::new();
    let a = store.generic(WellKnownType::List, &[TypeId::INT]);
    let b = store.generic(WellKnownType::List, &[TypeId::INT]);
    let c = store.generic(WellKnownType::List, &[TypeId::LONG]);
    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_eq!(store.name(a), "List<int>");
    assert!(store.is_instance_of(a, WellKnownType::List));
}

#[test]
fn test_list_implements_sequence_interfaces_with_resolved_arguments() {
    let mut store = TypeStore::new();
    let list = store.generic(WellKnownType::List, &[TypeId::STRING]);
    let enumerable = store.implements_well_known(list, WellKnownType::Enumerable);
    assert_eq!(
        enumerable,
        Some(store.generic(WellKnownType::Enumerable, &[TypeId::STRING]))
    );
    assert_eq!(store.enumerated_type(list), Some(TypeId::STRING));
    assert!(store.find_method(list, "EnsureCapacity", 1).is_some());
    assert!(store.has_parameterless_constructor(list));
}

#[test]
fn test_dictionary_enumerates_key_value_pairs() {
    let mut store = TypeStore::new();
    let dict = store.generic(WellKnownType::Dictionary, &[TypeId::STRING, TypeId::INT]);
    let pair = store.generic(WellKnownType::KeyValuePair, &[TypeId::STRING, TypeId::INT]);
    assert_eq!(store.enumerated_type(dict), Some(pair));
    let key = store.find_member(pair, "Key", NameComparison::Exact).map(|m| m.ty);
    assert_eq!(key, Some(TypeId::STRING));
}

#[test]
fn test_arrays_implement_list_interfaces_and_expose_length() {
    let mut store = TypeStore::new();
    let array = store.array(TypeId::INT);
    assert_eq!(store.name(array), "int[]");
    assert_eq!(store.array(TypeId::INT), array);
    assert!(store.implements_well_known(array, WellKnownType::IList).is_some());
    assert!(store.find_member(array, "Length", NameComparison::Exact).is_some());
    assert!(!store.has_parameterless_constructor(array));
}

#[test]
fn test_nullable_wrapping_is_idempotent() {
    let mut store = TypeStore::new();
    let car = store.class("Car");
    let nullable = store.nullable(car);
    assert_eq!(store.nullable(nullable), nullable);
    assert_eq!(store.non_nullable(nullable), car);
    assert_eq!(store.name(nullable), "Car?");
}

#[test]
fn test_explicit_constructor_replaces_implicit_default() {
    let mut store = TypeStore::new();
    let car = store.class("Car");
    assert!(store.has_parameterless_constructor(car));
    store.constructor(car, &[("name", TypeId::STRING)]);
    assert!(!store.has_parameterless_constructor(car));
    assert_eq!(store.constructors(car).len(), 1);
}

#[test]
fn test_inherited_members_are_accessible() {
    let mut store = TypeStore::new();
    let base = store.class("Vehicle");
    store.property(base, "Id", TypeId::INT);
    let car = store.class("Car");
    store.extend(car, base).property(car, "Name", TypeId::STRING);

    let names: Vec<&str> = store
        .accessible_members(car)
        .iter()
        .map(|m| &*m.name)
        .collect();
    assert_eq!(names, ["Name", "Id"]);
    assert!(store.is_assignable(car, base));
    assert!(!store.is_assignable(base, car));
}

#[test]
fn test_interface_members_include_extended_interfaces() {
    let mut store = TypeStore::new();
    let list = store.generic(WellKnownType::IList, &[TypeId::INT]);
    assert!(store.find_member(list, "Count", NameComparison::Exact).is_some());
}

#[test]
fn test_string_is_a_char_sequence() {
    let store = TypeStore::new();
    assert_eq!(store.enumerated_type(TypeId::STRING), Some(TypeId::CHAR));
}
