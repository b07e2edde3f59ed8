use super::*;
use crate::printer::SyntaxPrinter;
use crate::store::TypeStore;

struct Fixture {
    store: TypeStore,
    car: TypeId,
}

/// Car { Name, Manufacturer { Id, Name, Ident, Address? { StreetName } } }
fn fixture() -> Fixture {
    let mut store = TypeStore::new();
    let address = store.class("Address");
    store.property(address, "StreetName", TypeId::STRING);
    let nullable_address = store.nullable(address);

    let manufacturer = store.class("Manufacturer");
    store
        .property(manufacturer, "Id", TypeId::INT)
        .property(manufacturer, "Name", TypeId::STRING)
        .property(manufacturer, "Ident", TypeId::INT)
        .property(manufacturer, "Address", nullable_address);

    let car = store.class("Car");
    store
        .property(car, "Name", TypeId::STRING)
        .property(car, "Manufacturer", manufacturer);
    Fixture { store, car }
}

fn names(path: &MemberPath) -> Vec<&str> {
    path.members().iter().map(|m| &*m.name).collect()
}

#[test]
fn test_explicit_path_resolves_every_segment() {
    let f = fixture();
    let path = MemberPath::find(&f.store, f.car, &["Manufacturer", "Name"], NameComparison::Exact)
        .expect("path exists");
    assert_eq!(path.full_name(), "Manufacturer.Name");
    assert_eq!(path.member().ty, TypeId::STRING);
    assert_eq!(path.object_path().len(), 1);
}

#[test]
fn test_explicit_path_fails_on_missing_segment() {
    let f = fixture();
    assert!(MemberPath::find(&f.store, f.car, &["Manufacturer", "Missing"], NameComparison::Exact).is_none());
    assert!(MemberPath::find::<&str>(&f.store, f.car, &[], NameComparison::Exact).is_none());
}

#[test]
fn test_explicit_path_honours_case_insensitive_comparison() {
    let f = fixture();
    assert!(MemberPath::find(&f.store, f.car, &["manufacturer", "name"], NameComparison::Exact).is_none());
    let path = MemberPath::find(&f.store, f.car, &["manufacturer", "name"], NameComparison::IgnoreCase);
    assert_eq!(path.map(|p| p.full_name()), Some("Manufacturer.Name".to_string()));
}

#[test]
fn test_flattened_name_resolves_nested_path() {
    let f = fixture();
    let path = MemberPath::find_flattened(&f.store, f.car, "ManufacturerName", &BTreeSet::new(), NameComparison::Exact)
        .expect("flattened path");
    assert_eq!(names(&path), ["Manufacturer", "Name"]);
}

#[test]
fn test_flattened_name_walks_through_nullable_members() {
    let f = fixture();
    let path = MemberPath::find_flattened(
        &f.store,
        f.car,
        "ManufacturerAddressStreetName",
        &BTreeSet::new(),
        NameComparison::Exact,
    )
    .expect("flattened path");
    assert_eq!(names(&path), ["Manufacturer", "Address", "StreetName"]);
    assert!(path.is_any_object_path_nullable(&f.store));
    assert_eq!(
        path.member_type(&f.store),
        EffectiveType {
            ty: TypeId::STRING,
            nullable: true
        }
    );
}

#[test]
fn test_unmatched_flattened_name_fails_without_panicking() {
    let f = fixture();
    for name in ["ManufacturerColor", "Nothing", "X", "manufacturerName"] {
        assert!(
            MemberPath::find_flattened(&f.store, f.car, name, &BTreeSet::new(), NameComparison::Exact).is_none(),
            "{name} should not resolve"
        );
    }
}

#[test]
fn test_flattest_match_wins() {
    let mut store = TypeStore::new();
    let inner = store.class("Inner");
    store.property(inner, "Name", TypeId::STRING);
    let root = store.class("Root");
    store
        .property(root, "Manufacturer", inner)
        .property(root, "ManufacturerName", TypeId::STRING);

    let path = MemberPath::find_flattened(&store, root, "ManufacturerName", &BTreeSet::new(), NameComparison::Exact)
        .expect("path");
    assert_eq!(names(&path), ["ManufacturerName"]);
}

#[test]
fn test_longest_prefix_is_tried_first() {
    // Root { A: X { BC }, AB: Y { C } }: "ABC" binds AB.C before A.BC
    let mut store = TypeStore::new();
    let x = store.class("X");
    store.property(x, "BC", TypeId::INT);
    let y = store.class("Y");
    store.property(y, "C", TypeId::INT);
    let root = store.class("Root");
    store.property(root, "A", x).property(root, "AB", y);

    let path = MemberPath::find_flattened(&store, root, "ABC", &BTreeSet::new(), NameComparison::Exact)
        .expect("path");
    assert_eq!(names(&path), ["AB", "C"]);
}

#[test]
fn test_ignore_set_applies_only_at_outermost_level() {
    let mut store = TypeStore::new();
    let inner = store.class("Inner");
    store.property(inner, "Name", TypeId::STRING);
    let root = store.class("Root");
    store
        .property(root, "Manufacturer", inner)
        .property(root, "ManufacturerName", TypeId::STRING);

    // ignoring the flat member falls back to the nested path
    let ignored: BTreeSet<String> = ["ManufacturerName".to_string()].into();
    let path = MemberPath::find_flattened(&store, root, "ManufacturerName", &ignored, NameComparison::Exact)
        .expect("nested path");
    assert_eq!(names(&path), ["Manufacturer", "Name"]);

    // a nested member with an ignored name is still usable
    let ignored: BTreeSet<String> = ["Name".to_string(), "ManufacturerName".to_string()].into();
    assert!(MemberPath::find_flattened(&store, root, "ManufacturerName", &ignored, NameComparison::Exact).is_some());

    // ignoring the outer segment blocks the nested path too
    let ignored: BTreeSet<String> = ["Manufacturer".to_string(), "ManufacturerName".to_string()].into();
    assert!(MemberPath::find_flattened(&store, root, "ManufacturerName", &ignored, NameComparison::Exact).is_none());
}

#[test]
fn test_concatenated_member_names_resolve_to_exact_path() {
    // Level0 { AlphaOne: Level1 { BetaTwo: Level2 { GammaThree: int } } }
    let mut store = TypeStore::new();
    let level2 = store.class("Level2");
    store.property(level2, "GammaThree", TypeId::INT);
    let level1 = store.class("Level1");
    store.property(level1, "BetaTwo", level2);
    let level0 = store.class("Level0");
    store.property(level0, "AlphaOne", level1);

    let path = MemberPath::find_flattened(&store, level0, "AlphaOneBetaTwoGammaThree", &BTreeSet::new(), NameComparison::Exact)
        .expect("path");
    assert_eq!(names(&path), ["AlphaOne", "BetaTwo", "GammaThree"]);
}

#[test]
fn test_access_and_conditions_follow_nullability() {
    let f = fixture();
    let path = MemberPath::find(
        &f.store,
        f.car,
        &["Manufacturer", "Address", "StreetName"],
        NameComparison::Exact,
    )
    .expect("path");

    let plain = path.build_access(&f.store, Expr::ident("source"), false);
    assert_eq!(SyntaxPrinter::expr(&f.store, &plain), "source.Manufacturer.Address.StreetName");

    let conditional = path.build_access(&f.store, Expr::ident("source"), true);
    assert_eq!(
        SyntaxPrinter::expr(&f.store, &conditional),
        "source.Manufacturer.Address?.StreetName"
    );

    let condition = path
        .object_path_condition(&f.store, Expr::ident("source"))
        .expect("nullable object path");
    assert_eq!(
        SyntaxPrinter::expr(&f.store, &condition),
        "source.Manufacturer.Address != null"
    );
    assert_eq!(path.nullable_object_sub_paths(&f.store).len(), 1);
}

#[test]
fn test_non_nullable_path_has_no_condition() {
    let f = fixture();
    let path = MemberPath::find(&f.store, f.car, &["Manufacturer", "Name"], NameComparison::Exact)
        .expect("path");
    assert!(path.non_null_condition(&f.store, Expr::ident("source")).is_none());
    assert!(path.nullable_object_sub_paths(&f.store).is_empty());
}
