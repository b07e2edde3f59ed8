//! Common types and utilities for the shapemap mapping engine.
//!
//! This crate provides foundational items used across all shapemap crates:
//! - Diagnostic categories, codes and the message catalog
//! - Resolution limits and thresholds

// Diagnostic catalog shared by the solver and the CLI
pub mod diagnostics;
pub use diagnostics::{DiagnosticCategory, DiagnosticMessage, format_message};

// Centralized limits and thresholds
pub mod limits;
