// src/triage/mod.rs
// =============================================================================
// This module sorts directory lines into sections and decides which entries
// make it into the report.
//
// Submodules:
// - classify: Tells headers, entries and list items apart
// - aggregate: Buffers entries per section and flushes them on close
// =============================================================================

mod aggregate;
mod classify;

pub use aggregate::{Emission, Sink, Triage, TriageStats};
pub use classify::{Classifier, DEFAULT_TITLE};
