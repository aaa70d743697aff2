// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Read the directory document
// 3. Walk it section by section, probing each project for an fpm.toml
// 4. Print the report and how long it all took
// 5. Exit with proper code (0 = success, 2 = error)
//
// Rust concepts used:
// - async/await: reqwest is async, so main runs on a tokio runtime
// - Result<T, E>: For error handling (T = success type, E = error type)
// =============================================================================

// Module declarations - tells Rust about our other source files
mod checker;   // src/checker/ - locator extraction and manifest probing
mod cli;       // src/cli.rs - command-line parsing
mod input;     // src/input.rs - reading the document
mod logging;   // src/logging.rs - diagnostics on stderr
mod report;    // src/report.rs - Markdown and JSON output
mod triage;    // src/triage/ - sections, entries and the flush logic

use std::io;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser; // Parser trait enables the parse() method
use tracing::debug;

use checker::HttpChecker;
use cli::Cli;
use report::{Footer, JsonReport, TextReport};
use triage::{Classifier, Triage};

// The #[tokio::main] attribute transforms our async main into a real main function
#[tokio::main]
async fn main() {
    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            // If an unexpected error occurred, print it and exit with code 2
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

// This is the main application logic
// Returns:
//   Ok(0) = report printed
//   Err   = could not even start (unreadable input, broken HTTP setup, ...)
async fn run() -> Result<i32> {
    let cli = Cli::parse();
    logging::init(cli.debug);

    let start = Instant::now();

    let lines = input::load(&cli.file, cli.line_limit())?;
    let checker = HttpChecker::new(cli.probe_settings()).context("Failed to create HTTP client")?;
    let triage = Triage::new(Classifier::new(cli.title.as_str()), &checker);

    if cli.json {
        let mut report = JsonReport::default();
        let stats = triage.run(lines, &mut report).await;
        debug!(?stats, "scan finished");
        report.finish(&stats, &footer(start), io::stdout().lock())?;
    } else {
        let mut report = TextReport::new(io::stdout().lock());
        let stats = triage.run(lines, &mut report).await;
        debug!(?stats, "scan finished");
        report.finish(&footer(start))?;
    }

    Ok(0)
}

fn footer(start: Instant) -> Footer {
    Footer {
        last_update: chrono::Local::now().date_naive(),
        elapsed: start.elapsed(),
    }
}
