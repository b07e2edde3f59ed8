#![allow(clippy::print_stderr)]

use anyhow::Result;
use clap::Parser;
use shapemap_cli::args::CliArgs;
use shapemap_cli::{driver, tracing_config};

const EXIT_SUCCESS: i32 = 0;
const EXIT_DIAGNOSTICS: i32 = 1;

fn main() -> Result<()> {
    // Installs a subscriber only when SHAPEMAP_LOG or RUST_LOG is set.
    tracing_config::init_tracing();

    let args = CliArgs::parse();
    let outcome = driver::run(&args)?;
    print!("{}", outcome.output);
    if outcome.errors > 0 || outcome.warnings > 0 {
        eprintln!(
            "Found {} error(s) and {} warning(s).",
            outcome.errors, outcome.warnings
        );
    }

    std::process::exit(if outcome.failed {
        EXIT_DIAGNOSTICS
    } else {
        EXIT_SUCCESS
    });
}
