//! Mapping Plan Resolution Engine
//!
//! Given a declared request to convert one data shape into another, this
//! crate computes a deterministic, fully resolved plan of the conversion.
//! It uses:
//!
//! - **Builder chain**: fixed-priority strategies, first match wins
//! - **Plan registry**: identical requests share one plan node, re-entrant
//!   requests break cycles instead of recursing forever
//! - **Member paths**: nested access paths rebuilt from flattened names
//! - **Collection shapes**: classification plus pure strategy selection
//!
//! Type facts come from a host through [`TypeDatabase`]; [`TypeStore`] is an
//! in-memory implementation. Finished plans lower into the neutral [`syntax`]
//! IR, which [`printer`] turns into readable text.
pub mod builders;
pub mod collections;
pub mod config;
mod db;
pub mod diagnostics;
pub mod mapper;
pub mod member_path;
pub mod plan;
pub mod printer;
pub mod recursion;
pub mod registry;
mod store;
pub mod strategy;
pub mod syntax;
pub mod types;

pub use builders::{MappingRequest, Resolver};
pub use config::{MapperConfig, MappingConfiguration, RequestDirectives};
pub use db::TypeDatabase;
pub use diagnostics::{Diagnostic, DiagnosticKind, DiagnosticSink};
pub use mapper::{MapperDeclaration, MapperResolution, MappingMethod, UserMapping, resolve_all, resolve_mapper};
pub use plan::{MappingPlan, PlanId, PlanKind};
pub use store::TypeStore;
pub use types::{TypeId, WellKnownType};
