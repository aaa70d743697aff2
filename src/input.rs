// src/input.rs
// =============================================================================
// Reads the directory document into numbered, trimmed lines.
//
// - "-" reads from stdin, anything else is opened as a file
// - Lines that are not valid UTF-8 are decoded lossily (with a warning)
//   instead of aborting the whole run
// - In test mode only the first TEST_LINE_LIMIT lines are kept
// =============================================================================

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use tracing::{debug, warn};

/// Lines kept by a `--test` run.
pub const TEST_LINE_LIMIT: usize = 300;

/// One line of the input document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    /// 1-based position in the document
    pub number: usize,
    pub text: String,
}

impl Line {
    pub fn new(number: usize, text: impl Into<String>) -> Self {
        Self {
            number,
            text: text.into(),
        }
    }
}

// Loads the document at `path` ("-" for stdin)
pub fn load(path: &Path, limit: Option<usize>) -> Result<Vec<Line>> {
    if path == Path::new("-") {
        let stdin = io::stdin();
        return read_lines(stdin.lock(), limit).context("Failed to read directory from stdin");
    }

    let file = File::open(path)
        .with_context(|| format!("Failed to open '{}'", path.display()))?;
    read_lines(BufReader::new(file), limit)
        .with_context(|| format!("Failed to read '{}'", path.display()))
}

// Reads every line, trims it, then applies the optional line limit
pub fn read_lines<R: BufRead>(mut reader: R, limit: Option<usize>) -> Result<Vec<Line>> {
    let mut lines = Vec::new();
    let mut buf = Vec::new();

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        let number = lines.len() + 1;
        let text = match std::str::from_utf8(&buf) {
            Ok(text) => text.trim().to_string(),
            Err(e) => {
                warn!(line = number, error = %e, "line is not valid UTF-8, decoding lossily");
                String::from_utf8_lossy(&buf).trim().to_string()
            }
        };
        lines.push(Line::new(number, text));
    }

    let total = lines.len();
    if let Some(limit) = limit {
        lines.truncate(limit);
    }

    debug!(before_limit = total, after_limit = lines.len(), "lines to process");
    debug!(
        projects = lines.iter().filter(|l| l.text.starts_with('[')).count(),
        "upper bound of projects to consider"
    );

    Ok(lines)
}
