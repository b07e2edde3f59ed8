//! Mapper-level driver: resolves every declared method of a mapper, decides
//! which plans become generated methods, and renders the result.

use crate::builders::{MappingRequest, Resolver};
use crate::config::{MapperConfig, RequestDirectives};
use crate::db::TypeDatabase;
use crate::diagnostics::{Diagnostic, DiagnosticKind, RenderedDiagnostic};
use crate::plan::{MappingPlan, PlanId, RenderContext, method_base_name};
use crate::printer::SyntaxPrinter;
use crate::syntax::{Body, Expr, Name, NameScope, Stmt};
use crate::types::TypeId;
use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{Level, debug, span};

/// A method the user implemented by hand.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserMapping {
    pub name: String,
    pub source: TypeId,
    pub target: TypeId,
}

/// A declared method whose body is generated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MappingMethod {
    pub name: String,
    pub source: TypeId,
    pub target: TypeId,
    pub directives: RequestDirectives,
    /// `void Map(Source source, Target target)`
    pub existing_target: bool,
}

impl MappingMethod {
    pub fn new(name: &str, source: TypeId, target: TypeId) -> Self {
        Self {
            name: name.to_string(),
            source,
            target,
            directives: RequestDirectives::default(),
            existing_target: false,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MapperDeclaration {
    pub name: String,
    pub config: MapperConfig,
    pub methods: Vec<MappingMethod>,
    pub user_mappings: Vec<UserMapping>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntryPoint {
    pub name: Name,
    pub source: TypeId,
    pub target: TypeId,
    pub existing_target: bool,
    /// `None` when no plan could be built.
    pub plan: Option<PlanId>,
}

/// A method the engine adds for a plan that cannot be inlined.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratedMethod {
    pub name: Name,
    pub plan: PlanId,
}

#[derive(Debug)]
pub struct MapperResolution {
    pub name: String,
    pub plans: Vec<MappingPlan>,
    pub entry_points: Vec<EntryPoint>,
    pub generated: Vec<GeneratedMethod>,
    pub diagnostics: Vec<Diagnostic>,
    method_names: FxHashMap<PlanId, Name>,
}

impl MapperResolution {
    pub fn plan(&self, id: PlanId) -> &MappingPlan {
        &self.plans[id.index()]
    }

    pub fn entry(&self, name: &str) -> Option<&EntryPoint> {
        self.entry_points.iter().find(|entry| &*entry.name == name)
    }

    /// Name of the method a plan is emitted as, if any.
    pub fn method_name(&self, id: PlanId) -> Option<&str> {
        self.method_names.get(&id).map(|name| &**name)
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    pub fn count_of(&self, kind: DiagnosticKind) -> usize {
        self.diagnostics.iter().filter(|d| d.kind == kind).count()
    }

    pub fn rendered_diagnostics(&self, db: &dyn TypeDatabase) -> Vec<RenderedDiagnostic> {
        self.diagnostics.iter().map(|d| d.render(db)).collect()
    }

    /// Pretty-prints every entry point followed by the generated methods.
    pub fn render(&self, db: &dyn TypeDatabase) -> String {
        let mut printer = SyntaxPrinter::new(db);
        let mut ctx = RenderContext::new(db, &self.plans, &self.method_names);

        for entry in &self.entry_points {
            let body = match entry.plan {
                Some(id) => render_plan(&mut ctx, id, entry.existing_target),
                None => Body::Block(vec![Stmt::Expr(Expr::throw(
                    "NotImplementedException",
                    vec![Expr::str(&format!(
                        "Could not create mapping from {} to {}",
                        db.name(entry.source),
                        db.name(entry.target)
                    ))],
                ))]),
            };
            write_method(&mut printer, &entry.name, entry.source, entry.target, entry.existing_target, &body);
        }
        for method in &self.generated {
            let plan = self.plan(method.plan);
            let existing = plan.key.existing_target;
            let body = render_plan(&mut ctx, method.plan, existing);
            write_method(&mut printer, &method.name, plan.source(), plan.target(), existing, &body);
        }
        printer.finish()
    }
}

fn render_plan(ctx: &mut RenderContext<'_>, id: PlanId, existing_target: bool) -> Body {
    if existing_target {
        ctx.reset(&["source", "target"]);
        ctx.body(id, Expr::ident("source"), Some(Expr::ident("target")))
    } else {
        ctx.reset(&["source"]);
        ctx.body(id, Expr::ident("source"), None)
    }
}

fn write_method(
    printer: &mut SyntaxPrinter<'_>,
    name: &str,
    source: TypeId,
    target: TypeId,
    existing_target: bool,
    body: &Body,
) {
    if existing_target {
        printer.write_method(name, &[(source, "source"), (target, "target")], None, body);
    } else {
        printer.write_method(name, &[(source, "source")], Some(target), body);
    }
}

/// Resolves one mapper.
pub fn resolve_mapper(db: &dyn TypeDatabase, declaration: &MapperDeclaration) -> MapperResolution {
    let _span = span!(Level::DEBUG, "mapper", name = %declaration.name).entered();
    let mut resolver = Resolver::new(db, declaration.config.clone());

    let mut names = NameScope::new();
    for method in &declaration.methods {
        names.reserve(&method.name);
    }
    for user in &declaration.user_mappings {
        names.reserve(&user.name);
        if !db.contains(user.source) || !db.contains(user.target) {
            resolver.report(
                DiagnosticKind::UnknownUserMappingType,
                vec![user.name.as_str().into()],
            );
            continue;
        }
        resolver.add_user_mapping(&user.name, user.source, user.target);
    }

    let mut entry_points = Vec::with_capacity(declaration.methods.len());
    for method in &declaration.methods {
        let name: Name = method.name.as_str().into();
        resolver.diagnostics_mut().set_context(Some(name.clone()));
        let scope = resolver.request_scope(&method.directives, method.source, method.target);
        let request = MappingRequest::new(method.source, method.target).with_scope(scope);
        let plan = resolver.resolve_declared(&request, method.existing_target);
        if plan.is_none() {
            resolver.report(
                DiagnosticKind::CouldNotCreateMapping,
                vec![method.source.into(), method.target.into()],
            );
        }
        entry_points.push(EntryPoint {
            name,
            source: method.source,
            target: method.target,
            existing_target: method.existing_target,
            plan,
        });
    }
    resolver.diagnostics_mut().set_context(None);

    let (registry, diagnostics) = resolver.into_parts();
    let plans = registry.into_plans();

    let mut method_names: FxHashMap<PlanId, Name> = FxHashMap::default();
    for entry in &entry_points {
        if let Some(id) = entry.plan {
            method_names.entry(id).or_insert_with(|| entry.name.clone());
        }
    }

    let roots: Vec<PlanId> = entry_points.iter().filter_map(|entry| entry.plan).collect();
    let mut needed: Vec<PlanId> = called_plans(&plans, &roots)
        .into_iter()
        .filter(|id| !method_names.contains_key(id))
        .collect();
    needed.sort();

    let mut generated = Vec::with_capacity(needed.len());
    for id in needed {
        let name = names.fresh(&method_base_name(db, plans[id.index()].target()));
        method_names.insert(id, name.clone());
        generated.push(GeneratedMethod { name, plan: id });
    }
    debug!(
        plans = plans.len(),
        entry_points = entry_points.len(),
        generated = generated.len(),
        "mapper resolved"
    );

    MapperResolution {
        name: declaration.name.clone(),
        plans,
        entry_points,
        generated,
        diagnostics: diagnostics.into_vec(),
        method_names,
    }
}

/// Plans reachable from `roots` through a call edge that need a method of
/// their own.
fn called_plans(plans: &[MappingPlan], roots: &[PlanId]) -> FxHashSet<PlanId> {
    let mut needed = FxHashSet::default();
    let mut visited = FxHashSet::default();
    let mut stack: Vec<PlanId> = roots.to_vec();
    while let Some(id) = stack.pop() {
        if !visited.insert(id) {
            continue;
        }
        let plan = &plans[id.index()];
        let inlined = plan.inlined_children();
        for child in plan.kind.children() {
            let child_plan = &plans[child.index()];
            if !inlined.contains(&child) && !child_plan.key.expression && child_plan.needs_method() {
                needed.insert(child);
            }
            stack.push(child);
        }
    }
    needed
}

/// Resolves independent mappers in parallel.
pub fn resolve_all(
    db: &dyn TypeDatabase,
    declarations: &[MapperDeclaration],
) -> Vec<MapperResolution> {
    declarations
        .par_iter()
        .map(|declaration| resolve_mapper(db, declaration))
        .collect()
}

#[cfg(test)]
#[path = "../tests/mapper_tests.rs"]
mod mapper_tests;
