//! Identity: the value is shared as is.

use super::{MappingRequest, Resolver};
use crate::plan::PlanKind;

pub(super) fn build(resolver: &mut Resolver<'_>, request: &MappingRequest) -> Option<PlanKind> {
    if request.source != request.target {
        return None;
    }
    if resolver.config.use_deep_cloning && !resolver.db.is_immutable(request.source) {
        return None;
    }
    Some(PlanKind::Direct)
}
