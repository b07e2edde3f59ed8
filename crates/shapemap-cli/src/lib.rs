//! Inspection driver for the mapping plan engine.
//!
//! Loads a JSON description of types and mapper declarations into a
//! [`TypeStore`](shapemap_solver::TypeStore), resolves every mapper and
//! reports diagnostics plus the rendered plans.
pub mod args;
pub mod driver;
pub mod schema;
pub mod tracing_config;
