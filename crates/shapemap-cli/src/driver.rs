//! Load, resolve, report.

use crate::args::{CliArgs, OutputFormat};
use crate::schema::{self, Workspace};
use anyhow::{Result, bail};
use serde_json::{Value, json};
use shapemap_common::DiagnosticCategory;
use shapemap_solver::diagnostics::RenderedDiagnostic;
use shapemap_solver::{MapperResolution, PlanId, TypeDatabase, resolve_all};
use std::fmt::Write as _;
use std::time::Instant;
use tracing::info;

/// Rendered report plus whether the run should fail.
#[derive(Debug)]
pub struct RunOutcome {
    pub output: String,
    pub errors: usize,
    pub warnings: usize,
    pub failed: bool,
}

pub fn run(args: &CliArgs) -> Result<RunOutcome> {
    let workspace = schema::load(&args.input)?;
    run_workspace(args, &workspace)
}

pub fn run_workspace(args: &CliArgs, workspace: &Workspace) -> Result<RunOutcome> {
    let declarations: Vec<_> = match &args.mapper {
        Some(name) => {
            let selected: Vec<_> = workspace
                .mappers
                .iter()
                .filter(|mapper| &mapper.name == name)
                .cloned()
                .collect();
            if selected.is_empty() {
                bail!("no mapper named `{name}`");
            }
            selected
        }
        None => workspace.mappers.clone(),
    };

    let start = Instant::now();
    let resolutions = resolve_all(&workspace.store, &declarations);
    info!(
        mappers = resolutions.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "resolution finished"
    );

    let db: &dyn TypeDatabase = &workspace.store;
    let mut errors = 0;
    let mut warnings = 0;
    for resolution in &resolutions {
        for diagnostic in &resolution.diagnostics {
            match diagnostic.severity {
                DiagnosticCategory::Error => errors += 1,
                DiagnosticCategory::Warning => warnings += 1,
                DiagnosticCategory::Info => {}
            }
        }
    }

    let output = match args.format {
        OutputFormat::Text => text_report(db, &resolutions, args),
        OutputFormat::Json => serde_json::to_string_pretty(&json_report(db, &resolutions, args))?,
    };
    Ok(RunOutcome {
        output,
        errors,
        warnings,
        failed: errors > 0 || (args.deny_warnings && warnings > 0),
    })
}

fn visible(args: &CliArgs, diagnostic: &RenderedDiagnostic) -> bool {
    !(args.quiet && diagnostic.severity == DiagnosticCategory::Info)
}

fn severity_label(severity: DiagnosticCategory) -> &'static str {
    match severity {
        DiagnosticCategory::Error => "error",
        DiagnosticCategory::Warning => "warning",
        DiagnosticCategory::Info => "info",
    }
}

fn format_diagnostic(diagnostic: &RenderedDiagnostic) -> String {
    let mut line = format!(
        "{} {}: {}",
        severity_label(diagnostic.severity),
        diagnostic.code,
        diagnostic.message
    );
    if let Some(context) = &diagnostic.context {
        let _ = write!(line, " (in {context})");
    }
    line
}

/// One line per plan node: id, pair, strategy and the method it becomes.
fn plan_lines(db: &dyn TypeDatabase, resolution: &MapperResolution) -> Vec<String> {
    resolution
        .plans
        .iter()
        .enumerate()
        .map(|(index, plan)| {
            let id = PlanId(index as u32);
            let mut line = format!(
                "#{index} {} -> {} {}",
                db.name(plan.source()),
                db.name(plan.target()),
                plan.kind.tag()
            );
            if plan.key.expression {
                line.push_str(" [expression]");
            }
            if plan.key.existing_target {
                line.push_str(" [existing]");
            }
            if let Some(method) = resolution.method_name(id) {
                let _ = write!(line, " => {method}");
            }
            line
        })
        .collect()
}

fn text_report(db: &dyn TypeDatabase, resolutions: &[MapperResolution], args: &CliArgs) -> String {
    let mut out = String::new();
    for (i, resolution) in resolutions.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let _ = writeln!(out, "// mapper {}", resolution.name);
        for diagnostic in resolution.rendered_diagnostics(db) {
            if visible(args, &diagnostic) {
                let _ = writeln!(out, "// {}", format_diagnostic(&diagnostic));
            }
        }
        if args.plans {
            for line in plan_lines(db, resolution) {
                let _ = writeln!(out, "// {line}");
            }
        }
        if !args.no_code {
            out.push_str(&resolution.render(db));
        }
    }
    out
}

fn json_report(db: &dyn TypeDatabase, resolutions: &[MapperResolution], args: &CliArgs) -> Value {
    let mappers: Vec<Value> = resolutions
        .iter()
        .map(|resolution| {
            let diagnostics: Vec<RenderedDiagnostic> = resolution
                .rendered_diagnostics(db)
                .into_iter()
                .filter(|diagnostic| visible(args, diagnostic))
                .collect();
            let methods: Vec<Value> = resolution
                .entry_points
                .iter()
                .map(|entry| {
                    json!({
                        "name": &*entry.name,
                        "source": db.name(entry.source),
                        "target": db.name(entry.target),
                        "existingTarget": entry.existing_target,
                        "strategy": entry.plan.map(|id| resolution.plan(id).kind.tag()),
                    })
                })
                .collect();
            let generated: Vec<&str> = resolution.generated.iter().map(|m| &*m.name).collect();
            let mut value = json!({
                "mapper": resolution.name,
                "diagnostics": diagnostics,
                "methods": methods,
                "generated": generated,
            });
            if args.plans {
                value["plans"] = json!(plan_lines(db, resolution));
            }
            if !args.no_code {
                value["code"] = json!(resolution.render(db));
            }
            value
        })
        .collect();
    json!({ "mappers": mappers })
}

#[cfg(test)]
#[path = "../tests/driver_tests.rs"]
mod driver_tests;
