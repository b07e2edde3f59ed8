//! Sequence mappings: arrays, catalog collections and custom enumerables.

use super::{MappingRequest, Resolver};
use crate::collections::{CollectionInfo, classify};
use crate::config::MappingConversions;
use crate::diagnostics::DiagnosticKind;
use crate::plan::PlanKind;
use crate::strategy::{
    SelectionFlags, Unsupported, select_collection_strategy, select_existing_target_strategy,
};
use crate::types::WellKnownType;

/// Classified source and target, or `None` when the pair is not a plain
/// sequence mapping.
fn classify_pair(
    resolver: &Resolver<'_>,
    request: &MappingRequest,
) -> Option<(CollectionInfo, CollectionInfo)> {
    if !resolver.allows(MappingConversions::ENUMERABLE) {
        return None;
    }
    let db = resolver.db;
    if db.is_instance_of(request.target, WellKnownType::Queryable) {
        return None;
    }
    let source = classify(db, request.source)?;
    let target = classify(db, request.target)?;
    // Dictionaries that the dictionary builder rejected stay rejected.
    if target.dictionary_entry().is_some() {
        return None;
    }
    Some((source, target))
}

pub(super) fn build(resolver: &mut Resolver<'_>, request: &MappingRequest) -> Option<PlanKind> {
    let (source, target) = classify_pair(resolver, request)?;
    let element = resolver.resolve(&request.with_pair(source.element, target.element))?;

    let flags = SelectionFlags {
        element_identity: resolver.plan_kind(element).is_identity(),
        expression: request.expression,
        deep_cloning: resolver.config.use_deep_cloning,
    };
    match select_collection_strategy(resolver.db, &source, &target, flags) {
        Ok(strategy) => Some(PlanKind::Collection { element, strategy }),
        Err(Unsupported::NoParameterlessConstructor) => {
            resolver.report(
                DiagnosticKind::NoParameterlessConstructorFound,
                vec![target.ty.into()],
            );
            None
        }
        Err(Unsupported::ExpressionContext | Unsupported::NoInsertOperation) => None,
    }
}

pub(super) fn build_existing(
    resolver: &mut Resolver<'_>,
    request: &MappingRequest,
) -> Option<PlanKind> {
    let (source, target) = classify_pair(resolver, request)?;
    let strategy = select_existing_target_strategy(resolver.db, &source, &target)?;
    let element = resolver.resolve(&request.with_pair(source.element, target.element))?;
    Some(PlanKind::Collection { element, strategy })
}
