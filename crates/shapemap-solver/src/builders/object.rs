//! Object mapping: constructor selection plus member-wise assignment.
//!
//! Target members are matched in declaration order: an explicit rename
//! first, then a source member of the same name, then a flattened path
//! (`ManufacturerName` from `Manufacturer.Name`). Every nested pair is
//! resolved under a configuration descended to that member.

use super::{MappingRequest, Resolver};
use crate::collections::classify;
use crate::config::MappingConfiguration;
use crate::db::TypeDatabase;
use crate::diagnostics::DiagnosticKind;
use crate::member_path::MemberPath;
use crate::plan::{MemberAssignment, MemberValue, ObjectPlan, PlanKind};
use crate::types::{ConstructorInfo, MemberInfo, NameComparison, TypeId, TypeKind};
use rustc_hash::FxHashSet;
use std::cmp::Reverse;
use std::sync::Arc;
use tracing::trace;

/// A target member and the source path feeding it, if any.
struct MemberMatch {
    target: MemberInfo,
    source: Option<MemberPath>,
}

/// Classes, structs and interfaces that are not sequences.
fn is_object(db: &dyn TypeDatabase, ty: TypeId) -> bool {
    matches!(
        db.kind(ty),
        TypeKind::Class | TypeKind::Struct | TypeKind::Interface
    ) && classify(db, ty).is_none()
}

pub(super) fn build(resolver: &mut Resolver<'_>, request: &MappingRequest) -> Option<PlanKind> {
    let db = resolver.db;
    if !is_object(db, request.source) || !is_object(db, request.target) {
        return None;
    }
    if matches!(db.kind(request.target), TypeKind::Interface) {
        return None;
    }

    let report = resolver.first_object_visit(request);
    let config = resolver.scope(request.scope);
    let matches = match_members(resolver, request, &config, report);

    let Some((constructor_args, bound)) = select_constructor(resolver, request, &config, &matches)
    else {
        resolver.report(
            DiagnosticKind::NoConstructorFound,
            vec![request.target.into()],
        );
        return None;
    };

    let mut consumed: FxHashSet<Arc<str>> = constructor_args
        .iter()
        .map(|value| value.source.members()[0].name.clone())
        .collect();
    let mut plan = ObjectPlan {
        constructor_args,
        ..ObjectPlan::default()
    };
    assign_members(
        resolver,
        request,
        &matches,
        &bound,
        &mut plan,
        &mut consumed,
        report,
    );
    if report {
        report_unmapped_sources(resolver, request, &config, &consumed);
    }
    trace!(
        args = plan.constructor_args.len(),
        assignments = plan.assignments.len(),
        existing = plan.existing.len(),
        "object plan"
    );
    Some(PlanKind::Object(plan))
}

/// Member-wise mapping into an already constructed target.
pub(super) fn build_existing(
    resolver: &mut Resolver<'_>,
    request: &MappingRequest,
) -> Option<PlanKind> {
    let db = resolver.db;
    if !is_object(db, request.source) || !is_object(db, request.target) {
        return None;
    }

    let report = resolver.first_object_visit(request);
    let config = resolver.scope(request.scope);
    let matches = match_members(resolver, request, &config, report);

    let mut consumed = FxHashSet::default();
    let mut plan = ObjectPlan::default();
    assign_members(
        resolver,
        request,
        &matches,
        &FxHashSet::default(),
        &mut plan,
        &mut consumed,
        report,
    );
    if report {
        report_unmapped_sources(resolver, request, &config, &consumed);
    }
    Some(PlanKind::Object(plan))
}

/// Resolves renames, validates ignores and pairs every target member with
/// its source path.
fn match_members(
    resolver: &mut Resolver<'_>,
    request: &MappingRequest,
    config: &MappingConfiguration,
    report: bool,
) -> Vec<MemberMatch> {
    let db = resolver.db;
    let comparison = resolver.config.member_name_comparison;
    let (source, target) = (request.source, request.target);

    if report {
        for name in config.root_ignored_source() {
            if db.find_member(source, name, NameComparison::Exact).is_none() {
                resolver.report(
                    DiagnosticKind::IgnoredSourceMemberNotFound,
                    vec![name.into(), source.into()],
                );
            }
        }
        for name in config.ignored_target.iter().filter(|name| !name.contains('.')) {
            if db.find_member(target, name, NameComparison::Exact).is_none() {
                resolver.report(
                    DiagnosticKind::IgnoredTargetMemberNotFound,
                    vec![name.as_str().into(), target.into()],
                );
            }
        }
    }

    let mut renamed: Vec<(Arc<str>, MemberPath)> = Vec::new();
    for rename in &config.renames {
        let Some(path) = MemberPath::find(db, source, rename.source.as_slice(), comparison) else {
            if report {
                resolver.report(
                    DiagnosticKind::ConfiguredSourceMemberNotFound,
                    vec![rename.source_name().into(), source.into()],
                );
            }
            continue;
        };
        // Only members of the target itself can be renamed into.
        let target_member = match rename.target.as_slice() {
            [name] => db.find_member(target, name, comparison),
            _ => None,
        };
        let Some(target_member) = target_member else {
            if report {
                resolver.report(
                    DiagnosticKind::ConfiguredTargetMemberNotFound,
                    vec![rename.target_name().into(), target.into()],
                );
            }
            continue;
        };
        if !renamed.iter().any(|(name, _)| *name == target_member.name) {
            renamed.push((target_member.name.clone(), path));
        }
    }

    db.accessible_members(target)
        .into_iter()
        .filter(|member| !config.is_target_ignored(&member.name))
        .map(|member| {
            let source_path = renamed
                .iter()
                .find(|(name, _)| *name == member.name)
                .map(|(_, path)| path.clone())
                .or_else(|| find_source(db, source, &member.name, config, comparison));
            MemberMatch {
                target: member.clone(),
                source: source_path,
            }
        })
        .collect()
}

/// Same-name member first, then a flattened path.
fn find_source(
    db: &dyn TypeDatabase,
    source: TypeId,
    name: &str,
    config: &MappingConfiguration,
    comparison: NameComparison,
) -> Option<MemberPath> {
    let direct = db
        .find_member(source, name, comparison)
        .filter(|member| member.readable && !config.is_source_ignored(&member.name));
    match direct {
        Some(member) => Some(MemberPath::single(source, member.clone())),
        None => MemberPath::find_flattened(db, source, name, &config.ignored_source, comparison),
    }
}

/// Resolves the plan converting `path` into `target_ty` under the scope
/// descended to that member pair.
fn resolve_value(
    resolver: &mut Resolver<'_>,
    request: &MappingRequest,
    path: &MemberPath,
    target_name: &str,
    target_ty: TypeId,
) -> Option<MemberValue> {
    let scope = resolver.descend(request.scope, &path.full_name(), target_name);
    let member_request = request
        .with_pair(path.member().ty, target_ty)
        .with_scope(scope);
    let plan = resolver.resolve(&member_request)?;
    Some(MemberValue {
        source: path.clone(),
        plan,
        target_ty,
    })
}

/// Tries constructors longest parameter list first; the first whose every
/// parameter resolves wins. Returns the arguments and the lowercased names
/// of the parameters, which bind the same-named target members.
fn select_constructor(
    resolver: &mut Resolver<'_>,
    request: &MappingRequest,
    config: &MappingConfiguration,
    matches: &[MemberMatch],
) -> Option<(Vec<MemberValue>, FxHashSet<String>)> {
    let db = resolver.db;
    let mut constructors: Vec<&ConstructorInfo> = db.constructors(request.target).iter().collect();
    if constructors.is_empty() {
        // Structs always have the implicit parameterless constructor.
        return matches!(db.kind(request.target), TypeKind::Struct)
            .then(|| (Vec::new(), FxHashSet::default()));
    }
    constructors.sort_by_key(|ctor| Reverse(ctor.params.len()));

    'constructors: for ctor in constructors {
        let mut args = Vec::with_capacity(ctor.params.len());
        for param in &ctor.params {
            let matched = matches
                .iter()
                .find(|m| m.target.name.eq_ignore_ascii_case(&param.name))
                .and_then(|m| Some((m.source.clone()?, m.target.name.clone())));
            let (path, target_name) = match matched {
                Some(found) => found,
                None => match find_source(
                    db,
                    request.source,
                    &param.name,
                    config,
                    NameComparison::IgnoreCase,
                ) {
                    Some(path) => (path, param.name.clone()),
                    None => continue 'constructors,
                },
            };
            match resolve_value(resolver, request, &path, &target_name, param.ty) {
                Some(value) => args.push(value),
                None => continue 'constructors,
            }
        }
        let bound = ctor
            .params
            .iter()
            .map(|param| param.name.to_ascii_lowercase())
            .collect();
        return Some((args, bound));
    }
    None
}

/// Assigns writable members, maps get-only members in place and reports the
/// rest.
fn assign_members(
    resolver: &mut Resolver<'_>,
    request: &MappingRequest,
    matches: &[MemberMatch],
    bound: &FxHashSet<String>,
    plan: &mut ObjectPlan,
    consumed: &mut FxHashSet<Arc<str>>,
    report: bool,
) {
    let (source, target) = (request.source, request.target);
    for member in matches {
        let name = &member.target.name;
        if bound.contains(&name.to_ascii_lowercase()) {
            continue;
        }
        let Some(path) = &member.source else {
            if member.target.writable && report {
                resolver.report_member(
                    DiagnosticKind::UnmappedTargetMember,
                    vec![name.to_string().into(), target.into(), source.into()],
                    name,
                );
            }
            continue;
        };
        consumed.insert(path.members()[0].name.clone());

        if member.target.writable {
            match resolve_value(resolver, request, path, name, member.target.ty) {
                Some(value) => plan.assignments.push(MemberAssignment {
                    target: name.clone(),
                    value,
                }),
                None if report => resolver.report_member(
                    DiagnosticKind::CouldNotMapMember,
                    vec![
                        path.full_name().into(),
                        source.into(),
                        name.to_string().into(),
                        target.into(),
                    ],
                    name,
                ),
                None => {}
            }
            continue;
        }

        let existing = if request.expression {
            None
        } else {
            resolve_existing_member(resolver, request, path, &member.target)
        };
        match existing {
            Some(value) => plan.existing.push(MemberAssignment {
                target: name.clone(),
                value,
            }),
            None if report => resolver.report_member(
                DiagnosticKind::CannotMapToReadOnlyMember,
                vec![path.full_name().into(), name.to_string().into(), target.into()],
                name,
            ),
            None => {}
        }
    }
}

/// Get-only members holding a mutable collection or object are filled in
/// place.
fn resolve_existing_member(
    resolver: &mut Resolver<'_>,
    request: &MappingRequest,
    path: &MemberPath,
    target: &MemberInfo,
) -> Option<MemberValue> {
    if !target.readable {
        return None;
    }
    let scope = resolver.descend(request.scope, &path.full_name(), &target.name);
    let member_request = request
        .with_pair(path.member().ty, target.ty)
        .with_scope(scope);
    let plan = resolver.resolve_existing(&member_request)?;
    Some(MemberValue {
        source: path.clone(),
        plan,
        target_ty: target.ty,
    })
}

fn report_unmapped_sources(
    resolver: &mut Resolver<'_>,
    request: &MappingRequest,
    config: &MappingConfiguration,
    consumed: &FxHashSet<Arc<str>>,
) {
    let db = resolver.db;
    for member in db.accessible_members(request.source) {
        if !member.readable
            || consumed.contains(&member.name)
            || config.is_source_ignored(&member.name)
        {
            continue;
        }
        resolver.report_member(
            DiagnosticKind::UnmappedSourceMember,
            vec![
                member.name.to_string().into(),
                request.source.into(),
                request.target.into(),
            ],
            &member.name,
        );
    }
}
