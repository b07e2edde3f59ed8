use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// CLI arguments for the shapemap binary.
#[derive(Parser, Debug)]
#[command(
    name = "shapemap",
    version,
    about = "Resolve object-mapping plans from a JSON description of types"
)]
pub struct CliArgs {
    /// JSON file with the type universe and mapper declarations.
    pub input: PathBuf,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, ignore_case = true)]
    pub format: OutputFormat,

    /// Only resolve the mapper with this name.
    #[arg(short = 'm', long)]
    pub mapper: Option<String>,

    /// List every plan node with its strategy.
    #[arg(long)]
    pub plans: bool,

    /// Omit the rendered method bodies.
    #[arg(long = "no-code", alias = "noCode")]
    pub no_code: bool,

    /// Hide informational diagnostics.
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Exit with a failure status when any warning is reported.
    #[arg(long = "deny-warnings", alias = "denyWarnings")]
    pub deny_warnings: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[cfg(test)]
#[path = "../tests/args_tests.rs"]
mod args_tests;
