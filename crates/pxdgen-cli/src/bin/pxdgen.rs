#![allow(clippy::print_stderr)]

use anyhow::Result;
use clap::Parser;
use std::io::{IsTerminal, Write};

use pxdgen_cli::args::CliArgs;
use pxdgen_cli::config::resolve_run_config;
use pxdgen_cli::driver;
use pxdgen_cli::parser::ParseError;
use pxdgen_cli::reporter::Reporter;
use pxdgen_common::Diagnostic;

/// Every input translated without errors.
const EXIT_SUCCESS: i32 = 0;
/// At least one input failed; the others were still written.
const EXIT_FILES_FAILED: i32 = 1;
/// The batch never started.
const EXIT_FATAL: i32 = 2;

fn main() -> Result<()> {
    let args = CliArgs::parse();

    // PXDGEN_LOG / RUST_LOG win over -v (see src/tracing_config.rs).
    pxdgen::tracing_config::init_tracing(args.verbose);

    let reporter =
        Reporter::new(std::io::stderr().is_terminal()).with_warning_level(args.warning_level);

    let config = match resolve_run_config(&args) {
        Ok(config) => config,
        Err(err) => fatal(&reporter, err.code(), &err.to_string()),
    };

    let outcome = match driver::run(&config) {
        Ok(outcome) => outcome,
        Err(err) => fatal(&reporter, fatal_code(&err), &format!("{err:#}")),
    };

    if let Some(text) = &outcome.stdout {
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(text.as_bytes())?;
        stdout.flush()?;
    }

    let output = reporter.render(&outcome.diagnostics);
    if !output.is_empty() {
        eprintln!("{output}");
    }

    if outcome.has_errors() {
        let summary = reporter.render_summary(&outcome.diagnostics);
        if !summary.is_empty() {
            eprintln!("{summary}");
        }
        std::process::exit(EXIT_FILES_FAILED);
    }

    std::process::exit(EXIT_SUCCESS);
}

fn fatal(reporter: &Reporter, code: u32, message: &str) -> ! {
    let diagnostic = Diagnostic::error("", message, code);
    eprintln!("{}", reporter.format_diagnostic(&diagnostic));
    std::process::exit(EXIT_FATAL);
}

fn fatal_code(err: &anyhow::Error) -> u32 {
    if let Some(err) = err.downcast_ref::<ParseError>() {
        return err.code();
    }
    0
}
