// src/checker/markdown.rs
// =============================================================================
// This module pulls the project locator out of a Markdown directory entry.
//
// A directory entry looks like:
//   [stdlib](https://github.com/fortran-lang/stdlib): Fortran Standard Library
//
// We only want the URL in parentheses right after the first bracketed label.
// A full Markdown parser would be overkill here (and would disagree with the
// curated document on edge cases), so a lazy regex does the job.
//
// Rust concepts:
// - OnceLock: compile the regex once, reuse it for every line
// - Option<&str>: the locator borrows from the line, no copying
// =============================================================================

use regex::Regex;
use std::sync::OnceLock;

/// Path appended to a repository locator to reach its fpm manifest.
pub const MANIFEST_SUFFIX: &str = "/blob/master/fpm.toml";

// Extracts the locator of the first `[label](locator)` link on a line
//
// Parameters:
//   line: one line of the directory (borrowed as &str)
//
// Returns: Some(locator) if the line carries a non-empty link target,
//          None otherwise (the line is then simply not checkable)
//
// Example input:
//   "[fftpack](https://github.com/fortran-lang/fftpack) FFT routines"
//
// Example output:
//   Some("https://github.com/fortran-lang/fftpack")
pub fn extract_locator(line: &str) -> Option<&str> {
    static LINK_REGEX: OnceLock<Regex> = OnceLock::new();
    let link_re = LINK_REGEX.get_or_init(|| {
        // Lazy quantifiers so we stop at the first closing bracket/paren
        Regex::new(r"\[.*?\]\((.*?)\)").expect("Invalid link regex")
    });

    link_re
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .filter(|locator| !locator.is_empty())
}

// Builds the URL we probe to find out whether a project ships an fpm.toml
pub fn manifest_url(locator: &str) -> String {
    format!("{}{}", locator, MANIFEST_SUFFIX)
}
