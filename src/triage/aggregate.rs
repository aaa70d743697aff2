// src/triage/aggregate.rs
// =============================================================================
// Section aggregation: the heart of the scan.
//
// We walk the directory line by line. Entries are not checked the moment we
// see them; they are parked in the buffer of the section they belong to.
// When the section closes (next header, or end of input) every parked entry
// is probed, the ones with an fpm.toml are sorted, and the whole block is
// handed to the report.
//
// State machine:
//
//   NoSectionOpen --header--> SectionOpen(header, [])
//   NoSectionOpen --entry---> SectionOpen(untitled, [entry])
//   SectionOpen   --entry---> SectionOpen(header, [.., entry])
//   SectionOpen   --header--> flush, SectionOpen(new header, [])
//   any           --EOF-----> flush
//
// Title and list-item lines bypass the machine and are echoed right away.
// =============================================================================

use serde::Serialize;
use std::mem;
use tracing::debug;

use super::classify::{Classifier, LineKind};
use crate::checker::{extract_locator, manifest_url, ExistenceChecker, ProbeResult};
use crate::input::Line;

/// What the aggregator hands over to the report, in document order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Emission {
    /// Title or list-item line, written verbatim
    Echo { line: String },
    /// A closed section with at least one validated entry
    Section {
        /// `None` for entries that appeared before the first header
        header: Option<String>,
        /// Original entry lines, sorted case-insensitively
        entries: Vec<String>,
    },
}

/// Receives emissions as soon as they are known.
pub trait Sink {
    fn emit(&mut self, emission: Emission);
}

// Collecting into a Vec is handy for JSON output and tests
impl Sink for Vec<Emission> {
    fn emit(&mut self, emission: Emission) {
        self.push(emission);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TriageStats {
    pub lines: usize,
    pub headers: usize,
    pub candidates: usize,
    pub probes: usize,
    pub validated: usize,
    pub sections_emitted: usize,
}

// An entry waiting for its section to close
#[derive(Debug, Clone, PartialEq, Eq)]
struct Candidate {
    line: String,
    locator: String,
}

#[derive(Debug, Default, PartialEq, Eq)]
struct OpenSection {
    header: Option<String>,
    pending: Vec<Candidate>,
}

#[derive(Debug, Default, PartialEq, Eq)]
enum SectionState {
    #[default]
    NoSectionOpen,
    SectionOpen(OpenSection),
}

/// Drives the scan of one document.
pub struct Triage<'a, C: ExistenceChecker + ?Sized> {
    classifier: Classifier,
    checker: &'a C,
    state: SectionState,
    stats: TriageStats,
}

impl<'a, C: ExistenceChecker + ?Sized> Triage<'a, C> {
    pub fn new(classifier: Classifier, checker: &'a C) -> Self {
        Self {
            classifier,
            checker,
            state: SectionState::NoSectionOpen,
            stats: TriageStats::default(),
        }
    }

    /// Consumes the whole line stream, emitting into `sink` as it goes.
    pub async fn run<I, S>(mut self, lines: I, sink: &mut S) -> TriageStats
    where
        I: IntoIterator<Item = Line>,
        S: Sink + ?Sized,
    {
        for line in lines {
            self.feed(line, sink).await;
        }
        self.finish(sink).await;
        self.stats
    }

    async fn feed<S: Sink + ?Sized>(&mut self, line: Line, sink: &mut S) {
        self.stats.lines += 1;

        match self.classifier.classify(&line.text) {
            LineKind::Title | LineKind::ListItem => {
                sink.emit(Emission::Echo { line: line.text });
            }
            LineKind::Header => {
                self.stats.headers += 1;
                let next = SectionState::SectionOpen(OpenSection {
                    header: Some(line.text),
                    pending: Vec::new(),
                });
                let closed = mem::replace(&mut self.state, next);
                self.close(closed, sink).await;
            }
            LineKind::Candidate => {
                let Some(locator) = extract_locator(&line.text) else {
                    debug!(line = line.number, "no link on entry line, skipping");
                    return;
                };
                let candidate = Candidate {
                    locator: locator.to_string(),
                    line: line.text,
                };
                self.stats.candidates += 1;

                // Entries before the first header go into an untitled section
                if self.state == SectionState::NoSectionOpen {
                    self.state = SectionState::SectionOpen(OpenSection::default());
                }
                if let SectionState::SectionOpen(section) = &mut self.state {
                    section.pending.push(candidate);
                }
            }
            LineKind::Other => {}
        }
    }

    async fn finish<S: Sink + ?Sized>(&mut self, sink: &mut S) {
        let closed = mem::take(&mut self.state);
        self.close(closed, sink).await;
    }

    async fn close<S: Sink + ?Sized>(&mut self, state: SectionState, sink: &mut S) {
        if let SectionState::SectionOpen(section) = state {
            if !section.pending.is_empty() {
                self.flush(section, sink).await;
            }
        }
    }

    // Probes every parked entry and emits the survivors
    async fn flush<S: Sink + ?Sized>(&mut self, section: OpenSection, sink: &mut S) {
        debug!(
            section = section.header.as_deref().unwrap_or(""),
            entries = section.pending.len(),
            "entries to check"
        );

        let mut entries = Vec::new();
        for candidate in section.pending {
            let url = manifest_url(&candidate.locator);
            let result = self.checker.check(&url).await;
            self.stats.probes += 1;

            log_probe(&candidate, &result);
            if result.reachable {
                entries.push(candidate.line);
            }
        }

        if entries.is_empty() {
            return;
        }

        // Stable, so entries that compare equal keep their document order
        entries.sort_by_cached_key(|entry| entry.to_lowercase());

        self.stats.validated += entries.len();
        self.stats.sections_emitted += 1;
        sink.emit(Emission::Section {
            header: section.header,
            entries,
        });
    }
}

fn log_probe(candidate: &Candidate, result: &ProbeResult) {
    if result.reachable {
        debug!(entry = %candidate.line, url = %result.url, detail = %result.detail, "fpm manifest found");
    } else {
        debug!(entry = %candidate.line, url = %result.url, detail = %result.detail, "no fpm manifest");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::Mutex;

    // Answers 200 for URLs in `present`, 404 for everything else, and
    // remembers every URL it was asked about
    #[derive(Default)]
    struct FakeChecker {
        present: HashSet<String>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeChecker {
        fn with_manifests(locators: &[&str]) -> Self {
            Self {
                present: locators.iter().map(|l| manifest_url(l)).collect(),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ExistenceChecker for FakeChecker {
        async fn check(&self, url: &str) -> ProbeResult {
            self.calls.lock().unwrap().push(url.to_string());
            let status = if self.present.contains(url) { 200 } else { 404 };
            ProbeResult::from_status(url, status)
        }
    }

    fn lines(text: &str) -> Vec<Line> {
        text.lines()
            .enumerate()
            .map(|(i, l)| Line::new(i + 1, l.trim()))
            .collect()
    }

    async fn scan(text: &str, checker: &FakeChecker) -> (Vec<Emission>, TriageStats) {
        let mut out: Vec<Emission> = Vec::new();
        let stats = Triage::new(Classifier::default(), checker)
            .run(lines(text), &mut out)
            .await;
        (out, stats)
    }

    fn section(header: &str, entries: &[&str]) -> Emission {
        Emission::Section {
            header: Some(header.to_string()),
            entries: entries.iter().map(|e| e.to_string()).collect(),
        }
    }

    fn echo(line: &str) -> Emission {
        Emission::Echo {
            line: line.to_string(),
        }
    }

    #[tokio::test]
    async fn test_biology_chemistry_scenario() {
        let checker = FakeChecker::with_manifests(&["https://x/a"]);
        let (out, _) = scan(
            "## Biology\n[proj-a](https://x/a)\n[proj-b](https://x/b)\n## Chemistry\n",
            &checker,
        )
        .await;

        assert_eq!(out, vec![section("## Biology", &["[proj-a](https://x/a)"])]);
    }

    #[tokio::test]
    async fn test_section_without_hits_is_silent() {
        let checker = FakeChecker::default();
        let (out, stats) = scan("## Physics\n[p](https://x/p)\n[q](https://x/q)\n", &checker).await;

        assert!(out.is_empty());
        assert_eq!(stats.probes, 2);
        assert_eq!(stats.sections_emitted, 0);
    }

    #[tokio::test]
    async fn test_end_of_stream_flush() {
        let checker = FakeChecker::with_manifests(&["https://x/last"]);
        let (out, _) = scan("## Misc\n[last](https://x/last)", &checker).await;

        assert_eq!(out, vec![section("## Misc", &["[last](https://x/last)"])]);
    }

    #[tokio::test]
    async fn test_entries_sorted_case_insensitively_and_stably() {
        let checker = FakeChecker::with_manifests(&[
            "https://x/1",
            "https://x/2",
            "https://x/3",
            "https://x/4",
        ]);
        let doc = "## Numerics\n\
                   [zeta](https://x/1)\n\
                   [Alpha](https://x/2)\n\
                   [beta](https://x/3)\n\
                   [ALPHA](https://x/2)\n";
        let (out, _) = scan(doc, &checker).await;

        assert_eq!(
            out,
            vec![section(
                "## Numerics",
                &[
                    "[Alpha](https://x/2)",
                    "[ALPHA](https://x/2)",
                    "[beta](https://x/3)",
                    "[zeta](https://x/1)",
                ]
            )]
        );
    }

    #[tokio::test]
    async fn test_echoes_are_immediate_and_never_buffered() {
        // Nothing has an fpm.toml, echoes still come through
        let checker = FakeChecker::default();
        let doc = "## Fortran code on GitHub\n\
                   * [Directory Title](https://x/dir)\n\
                   ## Astronomy\n\
                   [star](https://x/star)\n";
        let (out, stats) = scan(doc, &checker).await;

        assert_eq!(
            out,
            vec![
                echo("## Fortran code on GitHub"),
                echo("* [Directory Title](https://x/dir)"),
            ]
        );
        // Only the real entry was probed
        assert_eq!(checker.calls(), vec![manifest_url("https://x/star")]);
        assert_eq!(stats.headers, 1);
    }

    #[tokio::test]
    async fn test_title_does_not_close_section() {
        let checker = FakeChecker::with_manifests(&["https://x/a", "https://x/b"]);
        let doc = "## Biology\n\
                   [a](https://x/a)\n\
                   ## Fortran code on GitHub\n\
                   [b](https://x/b)\n";
        let (out, _) = scan(doc, &checker).await;

        assert_eq!(
            out,
            vec![
                echo("## Fortran code on GitHub"),
                section("## Biology", &["[a](https://x/a)", "[b](https://x/b)"]),
            ]
        );
    }

    #[tokio::test]
    async fn test_probes_happen_at_section_close() {
        let checker = FakeChecker::with_manifests(&["https://x/a"]);
        let mut triage = Triage::new(Classifier::default(), &checker);
        let mut out: Vec<Emission> = Vec::new();

        for line in lines("## Biology\n[a](https://x/a)") {
            triage.feed(line, &mut out).await;
        }
        assert!(checker.calls().is_empty());
        assert!(out.is_empty());

        triage.feed(Line::new(3, "## Chemistry"), &mut out).await;
        assert_eq!(checker.calls(), vec![manifest_url("https://x/a")]);
        assert_eq!(out.len(), 1);
    }

    #[tokio::test]
    async fn test_each_candidate_probed_exactly_once() {
        let checker = FakeChecker::with_manifests(&["https://x/b"]);
        let doc = "## One\n[a](https://x/a)\n## Two\n## Three\n[b](https://x/b)\n[c](https://x/c)\n";
        let (out, stats) = scan(doc, &checker).await;

        assert_eq!(
            checker.calls(),
            vec![
                manifest_url("https://x/a"),
                manifest_url("https://x/b"),
                manifest_url("https://x/c"),
            ]
        );
        assert_eq!(out, vec![section("## Three", &["[b](https://x/b)"])]);
        assert_eq!(stats.candidates, 3);
        assert_eq!(stats.validated, 1);
    }

    #[tokio::test]
    async fn test_entries_before_first_header() {
        let checker = FakeChecker::with_manifests(&["https://x/early"]);
        let (out, _) = scan("[early](https://x/early)\n## Later\n", &checker).await;

        assert_eq!(
            out,
            vec![Emission::Section {
                header: None,
                entries: vec!["[early](https://x/early)".to_string()],
            }]
        );
    }

    #[tokio::test]
    async fn test_lines_without_locator_are_dropped() {
        let checker = FakeChecker::default();
        let doc = "## Tools\n[broken link\n[label only]\nsome prose\n";
        let (out, stats) = scan(doc, &checker).await;

        assert!(out.is_empty());
        assert!(checker.calls().is_empty());
        assert_eq!(stats.candidates, 0);
        assert_eq!(stats.lines, 4);
    }

    #[tokio::test]
    async fn test_sections_in_document_order() {
        let checker = FakeChecker::with_manifests(&["https://x/z", "https://x/a"]);
        let doc = "## Zoology\n[z](https://x/z)\n## Astronomy\n[a](https://x/a)\n";
        let (out, stats) = scan(doc, &checker).await;

        assert_eq!(
            out,
            vec![
                section("## Zoology", &["[z](https://x/z)"]),
                section("## Astronomy", &["[a](https://x/a)"]),
            ]
        );
        assert_eq!(stats.sections_emitted, 2);
    }
}
