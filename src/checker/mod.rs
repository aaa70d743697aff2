// src/checker/mod.rs
// =============================================================================
// This module contains everything needed to decide whether a directory entry
// points at an fpm project.
//
// Submodules:
// - markdown: Pulls the repository locator out of an entry line
// - http: Probes the manifest URL with HEAD requests
// - retry: Backoff schedule for transient failures
//
// This file (mod.rs) is the module root - it re-exports the public API that
// the rest of the application uses.
// =============================================================================

mod http;
mod markdown;
mod retry;

pub use http::{
    ExistenceChecker, HttpChecker, ProbeResult, ProbeSettings, DEFAULT_MAX_REDIRECTS,
};
pub use markdown::{extract_locator, manifest_url};
pub use retry::{RetryPolicy, DEFAULT_MAX_RETRIES};
