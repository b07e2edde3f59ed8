//! Leaf conversions between scalar shapes. Each builder is tried in the
//! order listed in the chain and gated by its conversion family.

use super::{MappingRequest, Resolver};
use crate::config::{EnumMappingStrategy, MappingConversions};
use crate::diagnostics::DiagnosticKind;
use crate::plan::{DateTimeComponent, PlanKind};
use crate::syntax::Name;
use crate::types::{TypeId, TypeKind};

pub(super) fn implicit_cast(
    resolver: &mut Resolver<'_>,
    request: &MappingRequest,
) -> Option<PlanKind> {
    if !resolver.allows(MappingConversions::IMPLICIT_CAST) {
        return None;
    }
    let db = resolver.db;
    let (source, target) = (request.source, request.target);
    let widening = db.has_implicit_conversion(source, target);
    // Upcasts share the reference, which deep cloning forbids.
    let upcast = !resolver.config.use_deep_cloning
        && db.primitive(source).is_none()
        && !db.is_enum(source)
        && db.is_assignable(source, target);
    (widening || upcast).then_some(PlanKind::Cast { explicit: false })
}

/// `T.Parse(string)`
pub(super) fn parse(resolver: &mut Resolver<'_>, request: &MappingRequest) -> Option<PlanKind> {
    if !resolver.allows(MappingConversions::PARSE) {
        return None;
    }
    let db = resolver.db;
    if !db.is_string(request.source) || db.is_enum(request.target) {
        return None;
    }
    let method = db.find_method(request.target, "Parse", 1)?;
    let applies = method.is_static
        && method.params[0] == TypeId::STRING
        && method.returns == Some(request.target);
    applies.then_some(PlanKind::Parse)
}

/// `new T(source)`
pub(super) fn constructor(
    resolver: &mut Resolver<'_>,
    request: &MappingRequest,
) -> Option<PlanKind> {
    if !resolver.allows(MappingConversions::CONSTRUCTOR) {
        return None;
    }
    let db = resolver.db;
    if !matches!(db.kind(request.target), TypeKind::Class | TypeKind::Struct) {
        return None;
    }
    db.constructors(request.target)
        .iter()
        .any(|ctor| {
            matches!(ctor.params.as_slice(), [param] if db.is_assignable(request.source, param.ty))
        })
        .then_some(PlanKind::Constructor)
}

pub(super) fn string_to_enum(
    resolver: &mut Resolver<'_>,
    request: &MappingRequest,
) -> Option<PlanKind> {
    if !resolver.allows(MappingConversions::STRING_TO_ENUM) {
        return None;
    }
    let db = resolver.db;
    if !db.is_string(request.source) || !db.is_enum(request.target) {
        return None;
    }
    let config = resolver.scope(request.scope);
    Some(PlanKind::StringToEnum {
        by_name: config.enum_strategy == EnumMappingStrategy::ByName,
        ignore_case: config.enum_ignore_case,
    })
}

pub(super) fn enum_to_string(
    resolver: &mut Resolver<'_>,
    request: &MappingRequest,
) -> Option<PlanKind> {
    if !resolver.allows(MappingConversions::ENUM_TO_STRING) {
        return None;
    }
    let db = resolver.db;
    (db.is_enum(request.source) && db.is_string(request.target)).then_some(PlanKind::EnumToString)
}

/// Enum to enum, by underlying value or by member name.
pub(super) fn enum_to_enum(
    resolver: &mut Resolver<'_>,
    request: &MappingRequest,
) -> Option<PlanKind> {
    if !resolver.allows(MappingConversions::ENUM_TO_ENUM) {
        return None;
    }
    let db = resolver.db;
    let source_shape = db.enum_shape(request.source)?;
    let target_shape = db.enum_shape(request.target)?;
    let config = resolver.scope(request.scope);
    if config.enum_strategy == EnumMappingStrategy::ByValue {
        return Some(PlanKind::EnumByValue);
    }

    let mut arms: Vec<(Name, Name)> = Vec::with_capacity(source_shape.members.len());
    for member in &source_shape.members {
        match target_shape.member_named(&member.name, config.enum_ignore_case) {
            Some(target) => arms.push((member.name.clone(), target.name.clone())),
            None => resolver.report(
                DiagnosticKind::SourceEnumValueNotMapped,
                vec![
                    member.name.to_string().into(),
                    request.source.into(),
                    request.target.into(),
                ],
            ),
        }
    }
    Some(PlanKind::EnumByName { arms })
}

fn date_time_component(
    resolver: &Resolver<'_>,
    request: &MappingRequest,
    target: TypeId,
    component: DateTimeComponent,
) -> Option<PlanKind> {
    if !resolver.allows(MappingConversions::DATE_TIME) {
        return None;
    }
    if request.source != TypeId::DATE_TIME || request.target != target {
        return None;
    }
    let method = resolver.db.find_method(target, "FromDateTime", 1)?;
    method
        .is_static
        .then_some(PlanKind::DateTimeComponent(component))
}

pub(super) fn date_only(resolver: &mut Resolver<'_>, request: &MappingRequest) -> Option<PlanKind> {
    date_time_component(resolver, request, TypeId::DATE_ONLY, DateTimeComponent::Date)
}

pub(super) fn time_only(resolver: &mut Resolver<'_>, request: &MappingRequest) -> Option<PlanKind> {
    date_time_component(resolver, request, TypeId::TIME_ONLY, DateTimeComponent::Time)
}

/// Narrowing numeric conversions and enum/integral casts.
pub(super) fn explicit_cast(
    resolver: &mut Resolver<'_>,
    request: &MappingRequest,
) -> Option<PlanKind> {
    if !resolver.allows(MappingConversions::EXPLICIT_CAST) {
        return None;
    }
    let db = resolver.db;
    let (source, target) = (request.source, request.target);
    let integral = |ty: TypeId| db.primitive(ty).is_some_and(|kind| kind.is_integral());
    let applies = db.has_explicit_conversion(source, target)
        || (db.is_enum(source) && integral(target))
        || (integral(source) && db.is_enum(target));
    applies.then_some(PlanKind::Cast { explicit: true })
}

pub(super) fn to_string(resolver: &mut Resolver<'_>, request: &MappingRequest) -> Option<PlanKind> {
    if !resolver.allows(MappingConversions::TO_STRING) {
        return None;
    }
    let db = resolver.db;
    (db.is_string(request.target) && !db.is_string(request.source)).then_some(PlanKind::ToString)
}
