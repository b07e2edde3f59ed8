use super::*;
use crate::config::{DerivedTypePair, EnumMappingStrategy, MemberRename, RequestDirectives};
use crate::plan::{NullFallback, ObjectPlan};
use crate::store::TypeStore;
use crate::strategy::{CapacityPresize, CollectionStrategy, InsertOp};
use crate::types::WellKnownType;

fn object(resolver: &Resolver<'_>, id: PlanId) -> ObjectPlan {
    match resolver.plan_kind(id) {
        PlanKind::Object(object) => object.clone(),
        other => panic!("expected an object plan, got {other:?}"),
    }
}

fn scoped(
    resolver: &mut Resolver<'_>,
    directives: &RequestDirectives,
    source: TypeId,
    target: TypeId,
) -> MappingRequest {
    let scope = resolver.request_scope(directives, source, target);
    MappingRequest::new(source, target).with_scope(scope)
}

#[test]
fn test_identically_shaped_objects_bind_every_member() {
    let mut store = TypeStore::new();
    let car = store.class("Car");
    store
        .property(car, "Name", TypeId::STRING)
        .property(car, "Seats", TypeId::INT);
    let dto = store.class("CarDto");
    store
        .property(dto, "Name", TypeId::STRING)
        .property(dto, "Seats", TypeId::INT);

    let mut resolver = Resolver::new(&store, MapperConfig::default());
    let id = resolver.resolve(&MappingRequest::new(car, dto)).expect("plan");
    let plan = object(&resolver, id);
    let targets: Vec<&str> = plan.assignments.iter().map(|a| &*a.target).collect();
    assert_eq!(targets, ["Name", "Seats"]);
    assert!(plan.constructor_args.is_empty());
    assert!(resolver.diagnostics().is_empty());
}

#[test]
fn test_unmapped_members_are_reported_on_both_sides() {
    let mut store = TypeStore::new();
    let car = store.class("Car");
    store
        .property(car, "Name", TypeId::STRING)
        .property(car, "Vin", TypeId::STRING);
    let dto = store.class("CarDto");
    store
        .property(dto, "Name", TypeId::STRING)
        .property(dto, "Color", TypeId::STRING);

    let mut resolver = Resolver::new(&store, MapperConfig::default());
    resolver.resolve(&MappingRequest::new(car, dto)).expect("plan");
    let diagnostics = resolver.diagnostics();
    assert_eq!(diagnostics.count_of(DiagnosticKind::UnmappedTargetMember), 1);
    assert_eq!(diagnostics.count_of(DiagnosticKind::UnmappedSourceMember), 1);
    assert!(!diagnostics.has_errors());
}

#[test]
fn test_flattened_target_member_reads_nested_path() {
    let mut store = TypeStore::new();
    let manufacturer = store.class("Manufacturer");
    store.property(manufacturer, "Name", TypeId::STRING);
    let car = store.class("Car");
    store.property(car, "Manufacturer", manufacturer);
    let dto = store.class("CarDto");
    store.property(dto, "ManufacturerName", TypeId::STRING);

    let mut resolver = Resolver::new(&store, MapperConfig::default());
    let id = resolver.resolve(&MappingRequest::new(car, dto)).expect("plan");
    let plan = object(&resolver, id);
    assert_eq!(plan.assignments.len(), 1);
    assert_eq!(plan.assignments[0].value.source.full_name(), "Manufacturer.Name");
    assert_eq!(resolver.diagnostics().count_of(DiagnosticKind::UnmappedSourceMember), 0);
}

#[test]
fn test_longest_constructor_whose_parameters_resolve_wins() {
    let mut store = TypeStore::new();
    let car = store.class("Car");
    store
        .property(car, "Name", TypeId::STRING)
        .property(car, "Seats", TypeId::INT);
    let dto = store.class("CarDto");
    store
        .read_only_property(dto, "Name", TypeId::STRING)
        .property(dto, "Seats", TypeId::INT)
        .constructor(dto, &[("name", TypeId::STRING)])
        .constructor(dto, &[("name", TypeId::STRING), ("missing", TypeId::INT)]);

    let mut resolver = Resolver::new(&store, MapperConfig::default());
    let id = resolver.resolve(&MappingRequest::new(car, dto)).expect("plan");
    let plan = object(&resolver, id);
    assert_eq!(plan.constructor_args.len(), 1);
    assert_eq!(plan.constructor_args[0].source.full_name(), "Name");
    // Name is bound by the constructor and not reported as read-only
    let targets: Vec<&str> = plan.assignments.iter().map(|a| &*a.target).collect();
    assert_eq!(targets, ["Seats"]);
    assert_eq!(
        resolver.diagnostics().count_of(DiagnosticKind::CannotMapToReadOnlyMember),
        0
    );
}

#[test]
fn test_missing_constructor_is_an_error() {
    let mut store = TypeStore::new();
    let car = store.class("Car");
    let dto = store.class("CarDto");
    store.without_constructors(dto);

    let mut resolver = Resolver::new(&store, MapperConfig::default());
    assert_eq!(resolver.resolve(&MappingRequest::new(car, dto)), None);
    assert_eq!(resolver.diagnostics().count_of(DiagnosticKind::NoConstructorFound), 1);
}

#[test]
fn test_ignore_and_rename_validation() {
    let mut store = TypeStore::new();
    let car = store.class("Car");
    store.property(car, "Name", TypeId::STRING);
    let dto = store.class("CarDto");
    store.property(dto, "Name", TypeId::STRING);

    let directives = RequestDirectives {
        ignore_source: vec!["Nope".into()],
        ignore_target: vec!["Gone".into()],
        renames: vec![
            MemberRename::new("Missing", "Name"),
            MemberRename::new("Name", "Nested.Name"),
        ],
        ..RequestDirectives::default()
    };
    let mut resolver = Resolver::new(&store, MapperConfig::default());
    let request = scoped(&mut resolver, &directives, car, dto);
    resolver.resolve(&request).expect("plan");

    let diagnostics = resolver.diagnostics();
    assert_eq!(diagnostics.count_of(DiagnosticKind::IgnoredSourceMemberNotFound), 1);
    assert_eq!(diagnostics.count_of(DiagnosticKind::IgnoredTargetMemberNotFound), 1);
    assert_eq!(diagnostics.count_of(DiagnosticKind::ConfiguredSourceMemberNotFound), 1);
    assert_eq!(diagnostics.count_of(DiagnosticKind::ConfiguredTargetMemberNotFound), 1);
}

#[test]
fn test_derived_dispatch_reports_duplicates_and_unassignable_sources() {
    let mut store = TypeStore::new();
    let shape = store.class("Shape");
    let circle = store.class("Circle");
    store.extend(circle, shape);
    let unrelated = store.class("Unrelated");
    let shape_dto = store.class("ShapeDto");
    let circle_dto = store.class("CircleDto");
    store.extend(circle_dto, shape_dto);
    let square_dto = store.class("SquareDto");
    store.extend(square_dto, shape_dto);

    let directives = RequestDirectives {
        derived_types: vec![
            DerivedTypePair {
                source: circle,
                target: circle_dto,
            },
            DerivedTypePair {
                source: circle,
                target: square_dto,
            },
            DerivedTypePair {
                source: unrelated,
                target: circle_dto,
            },
        ],
        ..RequestDirectives::default()
    };
    let mut resolver = Resolver::new(&store, MapperConfig::default());
    let request = scoped(&mut resolver, &directives, shape, shape_dto);
    let id = resolver.resolve(&request).expect("plan");

    let PlanKind::Derived { arms } = resolver.plan_kind(id) else {
        panic!("expected a derived switch");
    };
    assert_eq!(arms.len(), 1);
    assert_eq!((arms[0].source, arms[0].target), (circle, circle_dto));
    let diagnostics = resolver.diagnostics();
    assert_eq!(diagnostics.count_of(DiagnosticKind::DerivedSourceTypeDuplicated), 1);
    assert_eq!(diagnostics.count_of(DiagnosticKind::DerivedSourceTypeNotAssignable), 1);
    assert_eq!(diagnostics.count_of(DiagnosticKind::DerivedTargetTypeNotAssignable), 0);
}

#[test]
fn test_derived_target_not_assignable_is_reported_and_skipped() {
    let mut store = TypeStore::new();
    let shape = store.class("Shape");
    let circle = store.class("Circle");
    store.extend(circle, shape);
    let square = store.class("Square");
    store.extend(square, shape);
    let shape_dto = store.class("ShapeDto");
    let square_dto = store.class("SquareDto");
    store.extend(square_dto, shape_dto);
    let loose_dto = store.class("LooseDto");

    let directives = RequestDirectives {
        derived_types: vec![
            DerivedTypePair {
                source: circle,
                target: loose_dto,
            },
            DerivedTypePair {
                source: square,
                target: square_dto,
            },
        ],
        ..RequestDirectives::default()
    };
    let mut resolver = Resolver::new(&store, MapperConfig::default());
    let request = scoped(&mut resolver, &directives, shape, shape_dto);
    let id = resolver.resolve(&request).expect("plan");

    let PlanKind::Derived { arms } = resolver.plan_kind(id) else {
        panic!("expected a derived switch");
    };
    let pairs: Vec<_> = arms.iter().map(|arm| (arm.source, arm.target)).collect();
    assert_eq!(pairs, [(square, square_dto)]);
    let diagnostics = resolver.diagnostics();
    assert_eq!(diagnostics.count_of(DiagnosticKind::DerivedTargetTypeNotAssignable), 1);
    assert_eq!(diagnostics.count_of(DiagnosticKind::DerivedSourceTypeNotAssignable), 0);
}

#[test]
fn test_derived_types_are_declined_inside_a_projection() {
    let mut store = TypeStore::new();
    let shape = store.class("Shape");
    store.property(shape, "Name", TypeId::STRING);
    let circle = store.class("Circle");
    store.extend(circle, shape);
    let shape_dto = store.class("ShapeDto");
    store.property(shape_dto, "Name", TypeId::STRING);
    let circle_dto = store.class("CircleDto");
    store.extend(circle_dto, shape_dto);

    let directives = RequestDirectives {
        derived_types: vec![DerivedTypePair {
            source: circle,
            target: circle_dto,
        }],
        ..RequestDirectives::default()
    };
    let mut resolver = Resolver::new(&store, MapperConfig::default());
    let request = scoped(&mut resolver, &directives, shape, shape_dto).in_expression();
    if let Some(id) = resolver.resolve(&request) {
        assert!(!matches!(resolver.plan_kind(id), PlanKind::Derived { .. }));
    }
    assert_eq!(
        resolver
            .diagnostics()
            .count_of(DiagnosticKind::DerivedTypesInProjection),
        1
    );
}

#[test]
fn test_self_referential_pair_reuses_the_top_plan() {
    let mut store = TypeStore::new();
    let a = store.class("A");
    let nullable_a = store.nullable(a);
    store.property(a, "Parent", nullable_a);
    let b = store.class("B");
    let nullable_b = store.nullable(b);
    store.property(b, "Parent", nullable_b);

    let mut resolver = Resolver::new(&store, MapperConfig::default());
    let top = resolver.resolve(&MappingRequest::new(a, b)).expect("plan");
    let plan = object(&resolver, top);
    let parent = plan.assignments[0].value.plan;
    assert_eq!(
        resolver.plan_kind(parent),
        &PlanKind::Nullable {
            inner: top,
            source_nullable: true,
            target_nullable: true,
            fallback: NullFallback::Throw,
        }
    );
    assert!(resolver.registry().plan(top).promoted);
    assert!(resolver.diagnostics().is_empty());
}

#[test]
fn test_cycle_inside_a_projection_is_a_reference_loop() {
    let mut store = TypeStore::new();
    let a = store.class("A");
    let nullable_a = store.nullable(a);
    store
        .property(a, "Name", TypeId::STRING)
        .property(a, "Parent", nullable_a);
    let b = store.class("B");
    let nullable_b = store.nullable(b);
    store
        .property(b, "Name", TypeId::STRING)
        .property(b, "Parent", nullable_b);
    let source = store.generic(WellKnownType::Queryable, &[a]);
    let target = store.generic(WellKnownType::Queryable, &[b]);

    let mut resolver = Resolver::new(&store, MapperConfig::default());
    let id = resolver.resolve(&MappingRequest::new(source, target)).expect("plan");
    let PlanKind::Projection { element } = *resolver.plan_kind(id) else {
        panic!("expected a projection");
    };
    assert!(resolver.registry().plan(element).key.expression);
    assert!(!resolver.registry().plan(element).promoted);
    let diagnostics = resolver.diagnostics();
    assert_eq!(diagnostics.count_of(DiagnosticKind::ReferenceLoopInProjection), 1);
    assert_eq!(diagnostics.count_of(DiagnosticKind::CouldNotMapMember), 1);
}

#[test]
fn test_depth_limit_reports_instead_of_overflowing() {
    let mut store = TypeStore::new();
    let sources: Vec<TypeId> = (0..6).map(|i| store.class(&format!("L{i}"))).collect();
    let targets: Vec<TypeId> = (0..6).map(|i| store.class(&format!("M{i}"))).collect();
    for i in 0..5 {
        store.property(sources[i], "Next", sources[i + 1]);
        store.property(targets[i], "Next", targets[i + 1]);
    }

    let profile = RecursionProfile::Custom {
        max_depth: 3,
        max_iterations: 1_000,
    };
    let mut resolver = Resolver::with_profile(&store, MapperConfig::default(), profile);
    let top = resolver.resolve(&MappingRequest::new(sources[0], targets[0]));
    assert!(top.is_some());
    let diagnostics = resolver.diagnostics();
    assert_eq!(diagnostics.count_of(DiagnosticKind::MappingDepthExceeded), 1);
    assert_eq!(diagnostics.count_of(DiagnosticKind::CouldNotMapMember), 1);
}

#[test]
fn test_resolution_budget_is_reported_separately_from_depth() {
    let mut store = TypeStore::new();
    let sources: Vec<TypeId> = (0..6).map(|i| store.class(&format!("L{i}"))).collect();
    let targets: Vec<TypeId> = (0..6).map(|i| store.class(&format!("M{i}"))).collect();
    for i in 0..5 {
        store.property(sources[i], "Next", sources[i + 1]);
        store.property(targets[i], "Next", targets[i + 1]);
    }

    let profile = RecursionProfile::Custom {
        max_depth: 100,
        max_iterations: 3,
    };
    let mut resolver = Resolver::with_profile(&store, MapperConfig::default(), profile);
    resolver.resolve(&MappingRequest::new(sources[0], targets[0]));
    let diagnostics = resolver.diagnostics();
    assert_eq!(diagnostics.count_of(DiagnosticKind::MappingDepthExceeded), 0);
    let budget: Vec<_> = diagnostics
        .iter()
        .filter(|d| d.kind == DiagnosticKind::MappingBudgetExceeded)
        .collect();
    assert!(!budget.is_empty());
    assert_eq!(budget[0].args.last(), Some(&DiagnosticArg::Number(3)));
}

#[test]
fn test_user_mapping_wins_for_its_exact_pair() {
    let mut store = TypeStore::new();
    let car = store.class("Car");
    store.property(car, "Seats", TypeId::INT);
    let dto = store.class("CarDto");
    store.property(dto, "Seats", TypeId::STRING);

    let mut resolver = Resolver::new(&store, MapperConfig::default());
    resolver.add_user_mapping("FormatSeats", TypeId::INT, TypeId::STRING);
    let id = resolver.resolve(&MappingRequest::new(car, dto)).expect("plan");
    let plan = object(&resolver, id);
    assert_eq!(
        resolver.plan_kind(plan.assignments[0].value.plan),
        &PlanKind::User {
            method: "FormatSeats".into()
        }
    );
}

#[test]
fn test_scalar_chain_order() {
    let mut store = TypeStore::new();
    let color = store.enumeration("Color", &[("Red", 0), ("Green", 1)]);
    let mut resolver = Resolver::new(&store, MapperConfig::default());
    let mut kind_of = |source, target| {
        let id = resolver.resolve(&MappingRequest::new(source, target))?;
        Some(resolver.plan_kind(id).tag())
    };

    assert_eq!(kind_of(TypeId::INT, TypeId::LONG), Some("implicit-cast"));
    assert_eq!(kind_of(TypeId::LONG, TypeId::INT), Some("explicit-cast"));
    assert_eq!(kind_of(TypeId::STRING, TypeId::INT), Some("parse"));
    assert_eq!(kind_of(TypeId::INT, TypeId::STRING), Some("to-string"));
    assert_eq!(kind_of(TypeId::STRING, color), Some("string-to-enum"));
    assert_eq!(kind_of(color, TypeId::STRING), Some("enum-to-string"));
    assert_eq!(kind_of(color, TypeId::INT), Some("explicit-cast"));
    assert_eq!(kind_of(TypeId::DATE_TIME, TypeId::DATE_ONLY), Some("date-time-component"));
    assert_eq!(kind_of(TypeId::STRING, TypeId::STRING), Some("direct"));
}

#[test]
fn test_disabled_conversion_family_is_skipped() {
    let store = TypeStore::new();
    let config = MapperConfig {
        enabled_conversions: MappingConversions::all() - MappingConversions::PARSE,
        ..MapperConfig::default()
    };
    let mut resolver = Resolver::new(&store, config);
    assert_eq!(
        resolver.resolve(&MappingRequest::new(TypeId::STRING, TypeId::INT)),
        None
    );
}

#[test]
fn test_enum_by_name_reports_unmatched_members() {
    let mut store = TypeStore::new();
    let source = store.enumeration("Color", &[("Red", 0), ("Green", 1), ("Blue", 2)]);
    let target = store.enumeration("ColorDto", &[("green", 0), ("Red", 1)]);
    let config = MapperConfig {
        enum_mapping_strategy: EnumMappingStrategy::ByName,
        ..MapperConfig::default()
    };
    let mut resolver = Resolver::new(&store, config);
    let id = resolver
        .resolve(&MappingRequest::new(source, target))
        .expect("plan");
    let PlanKind::EnumByName { arms } = resolver.plan_kind(id) else {
        panic!("expected by-name enum mapping");
    };
    assert_eq!(arms.len(), 1);
    assert_eq!(&*arms[0].0, "Red");
    assert_eq!(
        resolver.diagnostics().count_of(DiagnosticKind::SourceEnumValueNotMapped),
        2
    );
}

#[test]
fn test_nullable_unwrap_and_fallbacks() {
    let mut store = TypeStore::new();
    let nullable_int = store.nullable(TypeId::INT);
    let nullable_long = store.nullable(TypeId::LONG);

    let config = MapperConfig {
        throw_on_mapping_null_mismatch: false,
        ..MapperConfig::default()
    };
    let mut resolver = Resolver::new(&store, config);
    let lift = resolver
        .resolve(&MappingRequest::new(TypeId::INT, nullable_int))
        .expect("plan");
    assert_eq!(resolver.plan_kind(lift), &PlanKind::Direct);

    let widen = resolver
        .resolve(&MappingRequest::new(nullable_int, nullable_long))
        .expect("plan");
    assert!(matches!(
        resolver.plan_kind(widen),
        PlanKind::Nullable {
            target_nullable: true,
            ..
        }
    ));

    let unwrap = resolver
        .resolve(&MappingRequest::new(nullable_int, TypeId::INT))
        .expect("plan");
    assert!(matches!(
        resolver.plan_kind(unwrap),
        PlanKind::Nullable {
            fallback: NullFallback::Default,
            target_nullable: false,
            ..
        }
    ));
}

#[test]
fn test_existing_stack_target_uses_push_with_capacity() {
    let mut store = TypeStore::new();
    let source = store.generic(WellKnownType::List, &[TypeId::INT]);
    let target = store.generic(WellKnownType::Stack, &[TypeId::LONG]);

    let mut resolver = Resolver::new(&store, MapperConfig::default());
    let id = resolver
        .resolve_existing(&MappingRequest::new(source, target))
        .expect("plan");
    let PlanKind::Collection { strategy, .. } = resolver.plan_kind(id) else {
        panic!("expected a collection plan");
    };
    assert_eq!(
        strategy,
        &CollectionStrategy::Insert {
            op: InsertOp::Push,
            capacity: Some(CapacityPresize::Simple {
                source_count: "Count",
                target_count: "Count",
            }),
        }
    );
    assert!(resolver.registry().plan(id).key.existing_target);
}

#[test]
fn test_get_only_collection_member_is_filled_in_place() {
    let mut store = TypeStore::new();
    let ints = store.generic(WellKnownType::List, &[TypeId::INT]);
    let longs = store.generic(WellKnownType::List, &[TypeId::LONG]);
    let order = store.class("Order");
    store.property(order, "Lines", ints);
    let dto = store.class("OrderDto");
    store.read_only_property(dto, "Lines", longs);

    let mut resolver = Resolver::new(&store, MapperConfig::default());
    let id = resolver.resolve(&MappingRequest::new(order, dto)).expect("plan");
    let plan = object(&resolver, id);
    assert!(plan.assignments.is_empty());
    assert_eq!(plan.existing.len(), 1);
    let lines = resolver.registry().plan(plan.existing[0].value.plan);
    assert!(lines.key.existing_target);
    assert!(resolver.diagnostics().is_empty());
}

#[test]
fn test_collection_without_parameterless_constructor_is_reported() {
    let mut store = TypeStore::new();
    let collection = store.generic(WellKnownType::Collection, &[TypeId::INT]);
    let bag = store.class("Bag");
    store
        .implement(bag, collection)
        .read_only_property(bag, "Count", TypeId::INT)
        .constructor(bag, &[("capacity", TypeId::INT)]);
    let source = store.generic(WellKnownType::Enumerable, &[TypeId::INT]);

    let mut resolver = Resolver::new(&store, MapperConfig::default());
    assert_eq!(resolver.resolve(&MappingRequest::new(source, bag)), None);
    assert_eq!(
        resolver
            .diagnostics()
            .count_of(DiagnosticKind::NoParameterlessConstructorFound),
        1
    );
}
