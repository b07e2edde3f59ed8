//! Nullable unwrap: resolves the pair with both sides unwrapped and guards
//! the null case.

use super::{MappingRequest, Resolver};
use crate::plan::{NullFallback, PlanKind};

pub(super) fn build(resolver: &mut Resolver<'_>, request: &MappingRequest) -> Option<PlanKind> {
    let db = resolver.db;
    let source_nullable = db.is_nullable(request.source);
    let target_nullable = db.is_nullable(request.target);
    if !source_nullable && !target_nullable {
        return None;
    }

    let inner_request =
        request.with_pair(db.non_nullable(request.source), db.non_nullable(request.target));
    let inner = resolver.resolve(&inner_request)?;

    // T -> T? and T? -> T? need no guard when the values are shared as is.
    if (target_nullable || !source_nullable) && resolver.plan_kind(inner).is_identity() {
        return Some(PlanKind::Direct);
    }

    // Expression trees cannot throw.
    let fallback = if resolver.config.throw_on_mapping_null_mismatch && !request.expression {
        NullFallback::Throw
    } else {
        NullFallback::Default
    };
    Some(PlanKind::Nullable {
        inner,
        source_nullable,
        target_nullable,
        fallback,
    })
}

/// A null source leaves the existing target untouched.
pub(super) fn build_existing(
    resolver: &mut Resolver<'_>,
    request: &MappingRequest,
) -> Option<PlanKind> {
    let db = resolver.db;
    let source_nullable = db.is_nullable(request.source);
    let target_nullable = db.is_nullable(request.target);
    if !source_nullable && !target_nullable {
        return None;
    }

    let inner_request =
        request.with_pair(db.non_nullable(request.source), db.non_nullable(request.target));
    let inner = resolver.resolve_existing(&inner_request)?;
    Some(PlanKind::Nullable {
        inner,
        source_nullable,
        target_nullable,
        fallback: NullFallback::Default,
    })
}
