//! Query projections: `IQueryable<S>` to `IQueryable<T>` through an
//! expression-only element mapping.

use super::{MappingRequest, Resolver};
use crate::config::MappingConversions;
use crate::plan::PlanKind;
use crate::types::WellKnownType;

pub(super) fn build(resolver: &mut Resolver<'_>, request: &MappingRequest) -> Option<PlanKind> {
    if !resolver.allows(MappingConversions::QUERYABLE) {
        return None;
    }
    let db = resolver.db;
    if !db.is_instance_of(request.target, WellKnownType::Queryable) {
        return None;
    }
    let source = db.implements_well_known(request.source, WellKnownType::Queryable)?;
    let source_element = db.type_args(source).first().copied()?;
    let target_element = db.type_args(request.target).first().copied()?;

    let element_request = request
        .with_pair(source_element, target_element)
        .in_expression();
    let element = resolver.resolve(&element_request)?;
    Some(PlanKind::Projection { element })
}
