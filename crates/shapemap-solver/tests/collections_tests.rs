use super::*;
use crate::store::TypeStore;
use crate::types::MethodInfo;

#[test]
fn test_string_is_not_a_collection() {
    let store = TypeStore::new();
    assert!(classify(&store, TypeId::STRING).is_none());
    assert!(classify(&store, TypeId::INT).is_none());
}

#[test]
fn test_array_satisfies_list_shapes() {
    let mut store = TypeStore::new();
    let array = store.array(TypeId::INT);
    let info = classify(&store, array).expect("array");
    assert_eq!(info.kind, CollectionKind::Array);
    assert_eq!(info.element, TypeId::INT);
    assert!(info.implements(CollectionKinds::ILIST));
    assert!(info.implements(CollectionKinds::READ_ONLY_COLLECTION));
    assert!(!info.implements(CollectionKinds::LIST));
    assert!(info.is_count_known());
    assert!(!info.can_insert());
    assert!(!info.is_immutable());
}

#[test]
fn test_bare_enumerable_has_unknown_count() {
    let mut store = TypeStore::new();
    let seq = store.generic(WellKnownType::Enumerable, &[TypeId::STRING]);
    let info = classify(&store, seq).expect("enumerable");
    assert_eq!(info.kind, CollectionKind::Enumerable);
    assert_eq!(info.implemented, CollectionKinds::ENUMERABLE);
    assert!(!info.is_count_known());
}

#[test]
fn test_catalog_kinds_use_fixed_capabilities() {
    let mut store = TypeStore::new();
    let list = store.generic(WellKnownType::List, &[TypeId::INT]);
    let stack = store.generic(WellKnownType::Stack, &[TypeId::INT]);
    let immutable = store.generic(WellKnownType::ImmutableList, &[TypeId::INT]);

    let list = classify(&store, list).expect("list");
    assert_eq!(list.kind, CollectionKind::List);
    assert!(list.can_insert());
    assert!(list.implements(CollectionKinds::COLLECTION));

    // Push is not a single-item Add
    let stack = classify(&store, stack).expect("stack");
    assert_eq!(stack.kind, CollectionKind::Stack);
    assert!(!stack.can_insert());
    assert!(stack.is_count_known());
    assert_eq!(
        stack.implemented,
        CollectionKinds::STACK | CollectionKinds::READ_ONLY_COLLECTION | CollectionKinds::ENUMERABLE
    );

    let immutable = classify(&store, immutable).expect("immutable list");
    assert!(immutable.is_immutable());
    assert!(!immutable.can_insert());
    assert!(immutable.implements(CollectionKinds::IIMMUTABLE_LIST));
}

#[test]
fn test_dictionary_exposes_key_and_value() {
    let mut store = TypeStore::new();
    let dictionary = store.generic(WellKnownType::Dictionary, &[TypeId::STRING, TypeId::INT]);
    let info = classify(&store, dictionary).expect("dictionary");
    assert_eq!(info.kind, CollectionKind::Dictionary);
    assert_eq!(info.dictionary_entry(), Some((TypeId::STRING, TypeId::INT)));
    assert!(info.implements(CollectionKinds::IDICTIONARY));
}

#[test]
fn test_list_of_pairs_has_entries_but_is_not_a_dictionary() {
    let mut store = TypeStore::new();
    let pair = store.generic(WellKnownType::KeyValuePair, &[TypeId::STRING, TypeId::INT]);
    let list = store.generic(WellKnownType::List, &[pair]);
    let info = classify(&store, list).expect("list");
    assert_eq!(info.entry(), Some((TypeId::STRING, TypeId::INT)));
    assert_eq!(info.dictionary_entry(), None);
}

#[test]
fn test_custom_collection_is_classified_structurally() {
    let mut store = TypeStore::new();
    let collection = store.generic(WellKnownType::Collection, &[TypeId::INT]);
    let bag = store.class("Bag");
    store
        .implement(bag, collection)
        .read_only_property(bag, "Count", TypeId::INT);

    let info = classify(&store, bag).expect("custom");
    assert_eq!(info.kind, CollectionKind::Custom);
    assert_eq!(info.element, TypeId::INT);
    assert!(info.implements(CollectionKinds::COLLECTION));
    assert!(info.implements(CollectionKinds::ENUMERABLE));
    // Add comes from ICollection
    assert!(info.can_insert());
    assert!(info.is_count_known());
}

#[test]
fn test_custom_sequence_without_count_or_add() {
    let mut store = TypeStore::new();
    let seq = store.generic(WellKnownType::Enumerable, &[TypeId::INT]);
    let stream = store.class("Stream");
    store.implement(stream, seq);
    store.read_only_property(stream, "Count", TypeId::LONG);

    let info = classify(&store, stream).expect("custom");
    assert!(!info.is_count_known());
    assert!(!info.can_insert());

    let counted = store.class("Counted");
    store
        .implement(counted, seq)
        .read_only_property(counted, "Length", TypeId::INT)
        .method(counted, MethodInfo::instance("Add", &[TypeId::INT], None));
    let info = classify(&store, counted).expect("custom");
    assert!(info.is_count_known());
    assert!(info.can_insert());
}

#[test]
fn test_classification_sees_through_nullable() {
    let mut store = TypeStore::new();
    let list = store.generic(WellKnownType::List, &[TypeId::INT]);
    let nullable = store.nullable(list);
    assert_eq!(classify(&store, nullable).map(|i| i.ty), Some(list));
}
