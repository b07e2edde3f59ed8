//! Derived-type dispatch: a runtime type switch over the subtype pairs
//! declared for the request pair.

use super::{MappingRequest, Resolver};
use crate::diagnostics::DiagnosticKind;
use crate::plan::{DerivedArm, PlanKind, ScopeId};
use rustc_hash::FxHashSet;
use tracing::trace;

pub(super) fn build(resolver: &mut Resolver<'_>, request: &MappingRequest) -> Option<PlanKind> {
    let config = resolver.scope(request.scope);
    let pairs = config.derived_types_for(request.source, request.target);
    if pairs.is_empty() {
        return None;
    }

    if request.expression {
        resolver.report(
            DiagnosticKind::DerivedTypesInProjection,
            vec![request.source.into(), request.target.into()],
        );
        return None;
    }

    let db = resolver.db;
    let mut seen = FxHashSet::default();
    let mut arms = Vec::with_capacity(pairs.len());
    for pair in pairs {
        if !seen.insert(pair.source) {
            resolver.report(
                DiagnosticKind::DerivedSourceTypeDuplicated,
                vec![pair.source.into()],
            );
            continue;
        }
        if !db.is_assignable(pair.source, request.source) {
            resolver.report(
                DiagnosticKind::DerivedSourceTypeNotAssignable,
                vec![pair.source.into(), request.source.into()],
            );
            continue;
        }
        if !db.is_assignable(pair.target, request.target) {
            resolver.report(
                DiagnosticKind::DerivedTargetTypeNotAssignable,
                vec![pair.target.into(), request.target.into()],
            );
            continue;
        }

        // Arms see the mapper defaults, not the declaring request's
        // directives.
        let arm_request = request
            .with_pair(pair.source, pair.target)
            .with_scope(ScopeId::DEFAULT);
        match resolver.resolve(&arm_request) {
            Some(plan) => arms.push(DerivedArm {
                source: pair.source,
                target: pair.target,
                plan,
            }),
            None => resolver.report(
                DiagnosticKind::CouldNotCreateMapping,
                vec![pair.source.into(), pair.target.into()],
            ),
        }
    }
    trace!(arms = arms.len(), "derived type switch");
    Some(PlanKind::Derived { arms })
}
