//! Key/value mappings into dictionary targets.

use super::{MappingRequest, Resolver};
use crate::collections::{CollectionInfo, classify};
use crate::config::MappingConversions;
use crate::diagnostics::DiagnosticKind;
use crate::plan::{PlanId, PlanKind};
use crate::strategy::{Unsupported, select_dictionary_strategy, select_existing_dictionary_strategy};

struct Entries {
    source: CollectionInfo,
    target: CollectionInfo,
    key: PlanId,
    value: PlanId,
}

/// Classifies both sides and resolves the key and value plans.
fn resolve_entries(resolver: &mut Resolver<'_>, request: &MappingRequest) -> Option<Entries> {
    if !resolver.allows(MappingConversions::DICTIONARY) {
        return None;
    }
    let db = resolver.db;
    let source = classify(db, request.source)?;
    let target = classify(db, request.target)?;
    let (target_key, target_value) = target.dictionary_entry()?;
    let (source_key, source_value) = source.entry()?;

    let key = resolver.resolve(&request.with_pair(source_key, target_key))?;
    let value = resolver.resolve(&request.with_pair(source_value, target_value))?;
    Some(Entries {
        source,
        target,
        key,
        value,
    })
}

pub(super) fn build(resolver: &mut Resolver<'_>, request: &MappingRequest) -> Option<PlanKind> {
    let entries = resolve_entries(resolver, request)?;
    let identity = resolver.plan_kind(entries.key).is_identity()
        && resolver.plan_kind(entries.value).is_identity();

    match select_dictionary_strategy(
        resolver.db,
        &entries.source,
        &entries.target,
        identity,
        request.expression,
    ) {
        Ok(strategy) => Some(PlanKind::Dictionary {
            key: entries.key,
            value: entries.value,
            strategy,
        }),
        Err(Unsupported::NoParameterlessConstructor) => {
            resolver.report(
                DiagnosticKind::NoParameterlessConstructorFound,
                vec![entries.target.ty.into()],
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
    let entries = resolve_entries(resolver, request)?;
    let strategy =
        select_existing_dictionary_strategy(resolver.db, &entries.source, &entries.target)?;
    Some(PlanKind::Dictionary {
        key: entries.key,
        value: entries.value,
        strategy,
    })
}
