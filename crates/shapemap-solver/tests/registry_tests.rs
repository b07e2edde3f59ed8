use super::*;
use crate::config::EnumMappingStrategy;
use crate::types::TypeId;

fn key(source: TypeId, target: TypeId) -> PlanKey {
    PlanKey {
        source,
        target,
        expression: false,
        existing_target: false,
        scope: ScopeId::DEFAULT,
    }
}

#[test]
fn test_shell_is_in_progress_until_finalized() {
    let mut registry = PlanRegistry::new(MappingConfiguration::default());
    let k = key(TypeId::INT, TypeId::LONG);
    assert_eq!(registry.lookup(&k), Lookup::Missing);

    let id = registry.register_shell(k);
    assert_eq!(registry.lookup(&k), Lookup::InProgress(id));
    assert_eq!(registry.kind(id), &PlanKind::Pending);

    registry.finalize(id, PlanKind::Cast { explicit: false });
    assert_eq!(registry.lookup(&k), Lookup::Ready(id));
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_failed_plan_is_remembered() {
    let mut registry = PlanRegistry::new(MappingConfiguration::default());
    let k = key(TypeId::OBJECT, TypeId::INT);
    let id = registry.register_shell(k);
    registry.fail(id);
    assert_eq!(registry.lookup(&k), Lookup::Failed);
}

#[test]
fn test_keys_differ_by_mode_and_scope() {
    let mut registry = PlanRegistry::new(MappingConfiguration::default());
    let plain = key(TypeId::INT, TypeId::LONG);
    let expression = PlanKey {
        expression: true,
        ..plain
    };
    let scoped = PlanKey {
        scope: ScopeId(1),
        ..plain
    };
    let a = registry.register_shell(plain);
    let b = registry.register_shell(expression);
    let c = registry.register_shell(scoped);
    assert_ne!(a, b);
    assert_ne!(b, c);
    assert_eq!(registry.lookup(&expression), Lookup::InProgress(b));
}

#[test]
fn test_scopes_are_interned() {
    let default = MappingConfiguration::default();
    let mut registry = PlanRegistry::new(default.clone());
    assert_eq!(registry.intern_scope(default), ScopeId::DEFAULT);

    let by_name = MappingConfiguration {
        enum_strategy: EnumMappingStrategy::ByName,
        ..MappingConfiguration::default()
    };
    let first = registry.intern_scope(by_name.clone());
    let second = registry.intern_scope(by_name);
    assert_eq!(first, ScopeId(1));
    assert_eq!(first, second);
    assert_eq!(registry.scope(first).enum_strategy, EnumMappingStrategy::ByName);
}

#[test]
fn test_promote_flags_the_plan() {
    let mut registry = PlanRegistry::new(MappingConfiguration::default());
    let id = registry.register_shell(key(TypeId::STRING, TypeId::STRING));
    registry.promote(id);
    registry.finalize(id, PlanKind::Direct);
    assert!(registry.plan(id).promoted);
}
