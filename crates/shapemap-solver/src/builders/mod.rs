//! The mapping plan builder chain.
//!
//! [`Resolver::resolve`] is the single entry point every builder recurses
//! through. It consults the registry first (reuse finished plans, break
//! cycles), then runs the builders in a fixed priority order and keeps the
//! first one that produces a plan. A builder returning `None` means "does not
//! apply" (or it already reported why it could not complete); the chain moves
//! on to the next one.

mod derived;
mod dictionary;
mod direct;
mod enumerable;
mod nullable;
mod object;
mod queryable;
mod scalar;

use crate::config::{MapperConfig, MappingConfiguration, MappingConversions, RequestDirectives};
use crate::db::TypeDatabase;
use crate::diagnostics::{Diagnostic, DiagnosticArg, DiagnosticKind, DiagnosticSink};
use crate::plan::{PlanId, PlanKey, PlanKind, ScopeId};
use crate::recursion::{DepthCounter, RecursionProfile, RecursionResult};
use crate::registry::{Lookup, PlanRegistry};
use crate::syntax::Name;
use crate::types::TypeId;
use rustc_hash::{FxHashMap, FxHashSet};
use std::sync::Arc;
use tracing::{Level, debug, span, trace};

/// One type pair to resolve.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct MappingRequest {
    pub source: TypeId,
    pub target: TypeId,
    pub scope: ScopeId,
    /// Expression-only context: no statements, loops or generated methods.
    pub expression: bool,
}

impl MappingRequest {
    pub fn new(source: TypeId, target: TypeId) -> Self {
        Self {
            source,
            target,
            scope: ScopeId::DEFAULT,
            expression: false,
        }
    }

    /// Same mode and scope, different pair.
    pub fn with_pair(self, source: TypeId, target: TypeId) -> Self {
        Self {
            source,
            target,
            ..self
        }
    }

    pub fn with_scope(self, scope: ScopeId) -> Self {
        Self { scope, ..self }
    }

    pub fn in_expression(self) -> Self {
        Self {
            expression: true,
            ..self
        }
    }

    fn key(&self, existing_target: bool) -> PlanKey {
        PlanKey {
            source: self.source,
            target: self.target,
            expression: self.expression,
            existing_target,
            scope: self.scope,
        }
    }
}

type Builder = fn(&mut Resolver<'_>, &MappingRequest) -> Option<PlanKind>;

/// New-target builders in priority order.
const BUILDERS: &[(&str, Builder)] = &[
    ("nullable", nullable::build),
    ("derived", derived::build),
    ("direct", direct::build),
    ("queryable", queryable::build),
    ("dictionary", dictionary::build),
    ("enumerable", enumerable::build),
    ("implicit-cast", scalar::implicit_cast),
    ("parse", scalar::parse),
    ("constructor", scalar::constructor),
    ("string-to-enum", scalar::string_to_enum),
    ("enum-to-string", scalar::enum_to_string),
    ("enum-to-enum", scalar::enum_to_enum),
    ("date-only", scalar::date_only),
    ("time-only", scalar::time_only),
    ("explicit-cast", scalar::explicit_cast),
    ("to-string", scalar::to_string),
    ("object", object::build),
];

/// Existing-target builders in priority order.
const EXISTING_BUILDERS: &[(&str, Builder)] = &[
    ("nullable", nullable::build_existing),
    ("dictionary", dictionary::build_existing),
    ("enumerable", enumerable::build_existing),
    ("object", object::build_existing),
];

/// Per-mapper resolution state.
pub struct Resolver<'db> {
    pub(crate) db: &'db dyn TypeDatabase,
    pub(crate) config: MapperConfig,
    pub(crate) registry: PlanRegistry,
    pub(crate) diagnostics: DiagnosticSink,
    depth: DepthCounter,
    /// Hand-written methods keyed by their exact pair.
    user_mappings: FxHashMap<(TypeId, TypeId), Name>,
    /// Object pairs whose member findings were already reported.
    reported_objects: FxHashSet<(ScopeId, TypeId, TypeId)>,
}

impl<'db> Resolver<'db> {
    pub fn new(db: &'db dyn TypeDatabase, config: MapperConfig) -> Self {
        Self::with_profile(db, config, RecursionProfile::PlanResolution)
    }

    pub fn with_profile(
        db: &'db dyn TypeDatabase,
        config: MapperConfig,
        profile: RecursionProfile,
    ) -> Self {
        let registry = PlanRegistry::new(config.default_configuration());
        Self {
            db,
            config,
            registry,
            diagnostics: DiagnosticSink::new(),
            depth: DepthCounter::with_profile(profile),
            user_mappings: FxHashMap::default(),
            reported_objects: FxHashSet::default(),
        }
    }

    /// Registers a user-implemented method; it wins for its exact pair.
    pub fn add_user_mapping(&mut self, name: &str, source: TypeId, target: TypeId) {
        self.user_mappings
            .entry((source, target))
            .or_insert_with(|| name.into());
    }

    pub fn resolve(&mut self, request: &MappingRequest) -> Option<PlanId> {
        self.resolve_with(request, false, true)
    }

    /// Resolves a plan that maps into an already constructed target.
    pub fn resolve_existing(&mut self, request: &MappingRequest) -> Option<PlanId> {
        self.resolve_with(request, true, true)
    }

    /// Resolves the body of a declared mapping method. A user mapping for
    /// the same pair is not substituted for the method itself.
    pub fn resolve_declared(
        &mut self,
        request: &MappingRequest,
        existing_target: bool,
    ) -> Option<PlanId> {
        self.resolve_with(request, existing_target, false)
    }

    fn resolve_with(
        &mut self,
        request: &MappingRequest,
        existing_target: bool,
        allow_user: bool,
    ) -> Option<PlanId> {
        if allow_user && !existing_target {
            if let Some(id) = self.user_plan(request) {
                return Some(id);
            }
        }

        let key = request.key(existing_target);
        match self.registry.lookup(&key) {
            Lookup::Ready(id) => return Some(id),
            Lookup::Failed => return None,
            Lookup::InProgress(id) => {
                if request.expression {
                    trace!(plan = id.0, "re-entered pair inside a projection");
                    self.report(
                        DiagnosticKind::ReferenceLoopInProjection,
                        vec![request.source.into(), request.target.into()],
                    );
                    return None;
                }
                trace!(plan = id.0, "re-entered pair, promoting to a method");
                self.registry.promote(id);
                return Some(id);
            }
            Lookup::Missing => {}
        }

        let id = self.registry.register_shell(key);
        let exceeded = match self.depth.enter() {
            RecursionResult::Entered => None,
            RecursionResult::DepthExceeded => Some((
                DiagnosticKind::MappingDepthExceeded,
                self.depth.max_depth(),
            )),
            RecursionResult::IterationExceeded => Some((
                DiagnosticKind::MappingBudgetExceeded,
                self.depth.max_iterations(),
            )),
        };
        if let Some((kind, limit)) = exceeded {
            self.report(
                kind,
                vec![request.source.into(), request.target.into(), limit.into()],
            );
            self.registry.fail(id);
            return None;
        }

        let _span = span!(
            Level::DEBUG,
            "resolve",
            plan = id.0,
            source = %self.db.name(request.source),
            target = %self.db.name(request.target),
            expression = request.expression,
            existing_target,
        )
        .entered();

        let builders = if existing_target {
            EXISTING_BUILDERS
        } else {
            BUILDERS
        };
        let built = builders.iter().find_map(|(name, builder)| {
            let kind = builder(self, request)?;
            debug!(builder = *name, kind = kind.tag(), "builder applied");
            Some(kind)
        });
        self.depth.leave();

        match built {
            Some(kind) => {
                self.registry.finalize(id, kind);
                Some(id)
            }
            None => {
                debug!("no builder applied");
                self.registry.fail(id);
                None
            }
        }
    }

    fn user_plan(&mut self, request: &MappingRequest) -> Option<PlanId> {
        let method = self
            .user_mappings
            .get(&(request.source, request.target))?
            .clone();
        let key = MappingRequest::new(request.source, request.target).key(false);
        match self.registry.lookup(&key) {
            Lookup::Ready(id) => Some(id),
            _ => {
                let id = self.registry.register_shell(key);
                self.registry.finalize(id, PlanKind::User { method });
                Some(id)
            }
        }
    }

    pub fn scope(&self, scope: ScopeId) -> Arc<MappingConfiguration> {
        self.registry.scope(scope)
    }

    /// Scope of a declared request. The declared pair is recorded without
    /// nullable annotations, which is the pair the builders below the
    /// nullable unwrap see.
    pub fn request_scope(
        &mut self,
        directives: &RequestDirectives,
        source: TypeId,
        target: TypeId,
    ) -> ScopeId {
        let config = self.config.for_request(
            directives,
            self.db.non_nullable(source),
            self.db.non_nullable(target),
        );
        self.registry.intern_scope(config)
    }

    /// Scope for a nested member pair.
    pub(crate) fn descend(&mut self, scope: ScopeId, source_path: &str, target_path: &str) -> ScopeId {
        let child = self.registry.scope(scope).descend(source_path, target_path);
        self.registry.intern_scope(child)
    }

    pub(crate) fn report(&mut self, kind: DiagnosticKind, args: Vec<DiagnosticArg>) {
        self.diagnostics.report(kind, args);
    }

    pub(crate) fn report_member(
        &mut self,
        kind: DiagnosticKind,
        args: Vec<DiagnosticArg>,
        member: &str,
    ) {
        self.diagnostics
            .push(Diagnostic::new(kind, args).with_member(member));
    }

    /// True the first time an object pair is built under `request`'s scope.
    /// The new-target and existing-target (and expression) plans of one pair
    /// share their member findings.
    pub(crate) fn first_object_visit(&mut self, request: &MappingRequest) -> bool {
        self.reported_objects
            .insert((request.scope, request.source, request.target))
    }

    #[inline]
    pub(crate) fn allows(&self, conversions: MappingConversions) -> bool {
        self.config.allows(conversions)
    }

    pub fn plan_kind(&self, id: PlanId) -> &PlanKind {
        self.registry.kind(id)
    }

    pub fn registry(&self) -> &PlanRegistry {
        &self.registry
    }

    pub fn diagnostics(&self) -> &DiagnosticSink {
        &self.diagnostics
    }

    pub fn diagnostics_mut(&mut self) -> &mut DiagnosticSink {
        &mut self.diagnostics
    }

    pub fn into_parts(self) -> (PlanRegistry, DiagnosticSink) {
        (self.registry, self.diagnostics)
    }
}

#[cfg(test)]
#[path = "../../tests/builders_tests.rs"]
mod builders_tests;
