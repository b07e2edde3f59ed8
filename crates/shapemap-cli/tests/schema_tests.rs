use super::*;
use shapemap_solver::config::EnumMappingStrategy;

const CARS: &str = r#"{
  "types": [
    { "name": "Car", "members": [
        { "name": "Name", "type": "string" },
        { "name": "Wheels", "type": "List<Wheel>" },
        { "name": "Owner", "type": "Person?" }
    ] },
    { "name": "Wheel", "kind": "struct", "members": [{ "name": "Size", "type": "int" }] },
    { "name": "Person", "constructors": [[{ "name": "name", "type": "string" }]] },
    { "name": "Color", "kind": "enum", "values": [{ "name": "Red" }, { "name": "Blue", "value": 7 }] },
    { "name": "Sealed", "constructors": [] }
  ],
  "mappers": [{
    "name": "CarMapper",
    "config": { "enumMappingStrategy": "byName", "throwOnMappingNullMismatch": false },
    "methods": [{
      "name": "Map", "source": "Car", "target": "Car",
      "directives": {
        "ignoreSource": ["Owner"],
        "renames": [{ "source": "Name", "target": "Name" }],
        "enumMappingStrategy": "byValue"
      }
    }],
    "userMappings": [{ "name": "Custom", "source": "Missing", "target": "string" }]
  }]
}"#;

#[test]
fn test_parse_populates_store_and_mappers() {
    let workspace = parse(CARS).expect("parse");
    let store = &workspace.store;

    let car = store.by_name("Car").expect("Car");
    let names: Vec<&str> = store.accessible_members(car).into_iter().map(|m| &*m.name).collect();
    assert_eq!(names, ["Name", "Wheels", "Owner"]);
    let wheels = store.find_member(car, "Wheels", Default::default()).expect("member");
    assert_eq!(store.name(wheels.ty), "List<Wheel>");

    let person = store.by_name("Person").expect("Person");
    assert!(!store.has_parameterless_constructor(person));
    let sealed = store.by_name("Sealed").expect("Sealed");
    assert!(store.constructors(sealed).is_empty());

    let color = store.by_name("Color").expect("Color");
    let shape = store.enum_shape(color).expect("enum");
    let values: Vec<i64> = shape.members.iter().map(|m| m.value).collect();
    assert_eq!(values, [0, 7]);

    let mapper = &workspace.mappers[0];
    assert_eq!(mapper.config.enum_mapping_strategy, EnumMappingStrategy::ByName);
    assert!(!mapper.config.throw_on_mapping_null_mismatch);
    let method = &mapper.methods[0];
    assert_eq!(method.directives.ignore_source, ["Owner"]);
    assert_eq!(
        method.directives.enum_mapping_strategy,
        Some(EnumMappingStrategy::ByValue)
    );
    assert_eq!(mapper.user_mappings[0].source, UNKNOWN_TYPE);
}

#[test]
fn test_resolve_type_builds_nested_references() {
    let mut store = TypeStore::new();
    store.class("Car");
    let id = resolve_type(&mut store, "Dictionary<string, List<Car[]>>").expect("type");
    assert_eq!(store.name(id), "Dictionary<string, List<Car[]>>");

    let nullable = resolve_type(&mut store, " int ? ").expect("type");
    assert_eq!(store.name(nullable), "int?");
    assert!(store.is_nullable(nullable));
}

#[test]
fn test_resolve_type_errors() {
    let mut store = TypeStore::new();
    assert!(resolve_type(&mut store, "Nope").is_err());
    assert!(resolve_type(&mut store, "List").is_err());
    assert!(resolve_type(&mut store, "List<int, int>").is_err());
    assert!(resolve_type(&mut store, "int<string>").is_err());
    assert!(resolve_type(&mut store, "List<int").is_err());
    assert!(resolve_type(&mut store, "int[").is_err());
    assert!(resolve_type(&mut store, "int)").is_err());
}

#[test]
fn test_duplicate_type_is_rejected() {
    let err = parse(r#"{ "types": [{ "name": "Car" }, { "name": "Car" }] }"#)
        .err()
        .expect("duplicate");
    assert!(err.to_string().contains("declared more than once"));
}

#[test]
fn test_unknown_member_type_names_the_member() {
    let err = parse(r#"{ "types": [{ "name": "Car", "members": [{ "name": "Engine", "type": "Engine" }] }] }"#)
        .err()
        .expect("unknown type");
    let chain = format!("{err:#}");
    assert!(chain.contains("in type `Car`"), "{chain}");
    assert!(chain.contains("in member `Engine`"), "{chain}");
    assert!(chain.contains("unknown type `Engine`"), "{chain}");
}

#[test]
fn test_load_reads_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("mappers.json");
    std::fs::write(&path, CARS).expect("write");
    let workspace = load(&path).expect("load");
    assert_eq!(workspace.mappers.len(), 1);

    let missing = dir.path().join("missing.json");
    let err = load(&missing).err().expect("missing file");
    assert!(err.to_string().contains("failed to read"));
}
