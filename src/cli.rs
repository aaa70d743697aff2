// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// We use the "derive" API which lets us define the CLI structure using
// Rust structs and attributes (the #[...] things).
//
// There is a single command: scan one directory document. Everything else
// is a flag.
// =============================================================================

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use crate::checker::{ProbeSettings, RetryPolicy, DEFAULT_MAX_REDIRECTS, DEFAULT_MAX_RETRIES};
use crate::input::TEST_LINE_LIMIT;
use crate::triage::DEFAULT_TITLE;

// This struct represents our entire CLI application
//
// #[derive(Parser)] tells clap to automatically generate parsing code
#[derive(Parser, Debug)]
#[command(
    name = "fpm-scout",
    version,
    about = "List projects, organized by topic, that can be built with the Fortran Package Manager",
    long_about = "fpm-scout reads the README.md of the 'Directory of Fortran codes on GitHub' \
                  (https://github.com/Beliavsky/Fortran-code-on-GitHub) and reports, section by \
                  section, every project whose repository carries an fpm.toml manifest."
)]
pub struct Cli {
    /// Directory document to scan ("-" reads stdin)
    ///
    /// This is a positional argument (required, no flag needed)
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Print diagnostics (line counts, probed URLs) on stderr
    #[arg(short, long)]
    pub debug: bool,

    /// Constrain a test run to the first 300 lines of input
    #[arg(short, long)]
    pub test: bool,

    /// Output a JSON report instead of Markdown
    #[arg(long)]
    pub json: bool,

    /// Heading of the document itself; it is echoed, never treated as a section
    #[arg(long, default_value = DEFAULT_TITLE)]
    pub title: String,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 5, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: u64,

    /// How often a 5xx answer or a flaky connection is retried
    #[arg(long, default_value_t = DEFAULT_MAX_RETRIES)]
    pub max_retries: u32,
}

impl Cli {
    pub fn line_limit(&self) -> Option<usize> {
        self.test.then_some(TEST_LINE_LIMIT)
    }

    pub fn probe_settings(&self) -> ProbeSettings {
        ProbeSettings {
            timeout: Duration::from_secs(self.timeout),
            max_redirects: DEFAULT_MAX_REDIRECTS,
            retry: RetryPolicy::with_max_retries(self.max_retries),
        }
    }
}
