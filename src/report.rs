// src/report.rs
// =============================================================================
// Turns emissions into output.
//
// Two flavours:
// - TextReport: Markdown, written as soon as each section closes, so a long
//   run shows progress. Every line is followed by a blank line.
// - JsonReport: collects everything and prints one JSON document at the end.
//
// Both end with a footer carrying the date and the elapsed wall-clock time.
// =============================================================================

use anyhow::Result;
use chrono::NaiveDate;
use serde::Serialize;
use std::io::Write;
use std::time::Duration;
use tracing::warn;

use crate::triage::{Emission, Sink, TriageStats};

/// Closing information printed after the last section.
#[derive(Debug, Clone, PartialEq)]
pub struct Footer {
    pub last_update: NaiveDate,
    pub elapsed: Duration,
}

// Markdown output straight to a writer (usually stdout)
pub struct TextReport<W: Write> {
    out: W,
}

impl<W: Write> TextReport<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    // Writes one line; if that fails, try to leave a notice in its place
    // and keep going
    fn line(&mut self, text: &str) {
        if let Err(e) = write!(self.out, "{}\n\n", text) {
            warn!(error = %e, "could not write line to output");
            let _ = writeln!(self.out, "An output error occurred: {}\n", e);
        }
    }

    pub fn finish(mut self, footer: &Footer) -> Result<()> {
        writeln!(self.out, "last update: {}", footer.last_update)?;
        writeln!(self.out, "time elapsed (s): {:.2}", footer.elapsed.as_secs_f64())?;
        self.out.flush()?;
        Ok(())
    }
}

impl<W: Write> Sink for TextReport<W> {
    fn emit(&mut self, emission: Emission) {
        match emission {
            Emission::Echo { line } => self.line(&line),
            Emission::Section { header, entries } => {
                // Entries before any header get an empty heading line
                self.line(header.as_deref().unwrap_or(""));
                for entry in &entries {
                    self.line(entry);
                }
            }
        }
        let _ = self.out.flush();
    }
}

// Everything we print in --json mode
#[derive(Debug, Serialize)]
struct JsonDocument<'a> {
    items: &'a [Emission],
    stats: &'a TriageStats,
    last_update: NaiveDate,
    elapsed_seconds: f64,
}

#[derive(Debug, Default)]
pub struct JsonReport {
    items: Vec<Emission>,
}

impl JsonReport {
    pub fn finish<W: Write>(self, stats: &TriageStats, footer: &Footer, mut out: W) -> Result<()> {
        let document = JsonDocument {
            items: &self.items,
            stats,
            last_update: footer.last_update,
            elapsed_seconds: footer.elapsed.as_secs_f64(),
        };
        serde_json::to_writer_pretty(&mut out, &document)?;
        writeln!(out)?;
        out.flush()?;
        Ok(())
    }
}

impl Sink for JsonReport {
    fn emit(&mut self, emission: Emission) {
        self.items.push(emission);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    fn footer() -> Footer {
        Footer {
            last_update: NaiveDate::from_ymd_opt(2024, 5, 7).unwrap(),
            elapsed: Duration::from_millis(12_346),
        }
    }

    fn render(emissions: Vec<Emission>) -> String {
        let mut out = Vec::new();
        let mut report = TextReport::new(&mut out);
        for emission in emissions {
            report.emit(emission);
        }
        report.finish(&footer()).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_text_report_layout() {
        let text = render(vec![
            Emission::Echo {
                line: "## Fortran code on GitHub".into(),
            },
            Emission::Section {
                header: Some("## Biology".into()),
                entries: vec!["[a](https://x/a)".into(), "[b](https://x/b)".into()],
            },
        ]);

        assert_eq!(
            text,
            "## Fortran code on GitHub\n\n\
             ## Biology\n\n\
             [a](https://x/a)\n\n\
             [b](https://x/b)\n\n\
             last update: 2024-05-07\n\
             time elapsed (s): 12.35\n"
        );
    }

    #[test]
    fn test_untitled_section_prints_empty_heading() {
        let text = render(vec![Emission::Section {
            header: None,
            entries: vec!["[early](https://x/early)".into()],
        }]);

        assert!(text.starts_with("\n\n[early](https://x/early)\n\n"));
    }

    // A writer that refuses lines containing a marker
    struct Picky {
        written: Vec<u8>,
    }

    impl Write for Picky {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if buf.windows(3).any(|w| w == b"BAD") {
                return Err(io::Error::new(io::ErrorKind::InvalidData, "cannot encode"));
            }
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_write_failure_leaves_notice_and_continues() {
        let mut picky = Picky {
            written: Vec::new(),
        };
        let mut report = TextReport::new(&mut picky);
        report.emit(Emission::Section {
            header: Some("## Misc".into()),
            entries: vec!["[BAD](https://x/bad)".into(), "[good](https://x/good)".into()],
        });

        report.finish(&footer()).unwrap();
        let text = String::from_utf8(picky.written).unwrap();
        assert!(text.contains("## Misc\n\n"));
        assert!(text.contains("An output error occurred: cannot encode"));
        assert!(text.contains("[good](https://x/good)\n\n"));
        assert!(!text.contains("[BAD]"));
    }

    #[test]
    fn test_json_report() {
        let mut report = JsonReport::default();
        report.emit(Emission::Echo {
            line: "* [Directory](https://x/dir)".into(),
        });
        report.emit(Emission::Section {
            header: Some("## Biology".into()),
            entries: vec!["[a](https://x/a)".into()],
        });
        let stats = TriageStats {
            lines: 4,
            headers: 1,
            candidates: 1,
            probes: 1,
            validated: 1,
            sections_emitted: 1,
        };

        let mut out = Vec::new();
        report.finish(&stats, &footer(), &mut out).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();

        assert_eq!(value["items"][0]["kind"], "echo");
        assert_eq!(value["items"][1]["kind"], "section");
        assert_eq!(value["items"][1]["header"], "## Biology");
        assert_eq!(value["items"][1]["entries"][0], "[a](https://x/a)");
        assert_eq!(value["stats"]["validated"], 1);
        assert_eq!(value["last_update"], "2024-05-07");
        let elapsed = value["elapsed_seconds"].as_f64().unwrap();
        assert!((elapsed - 12.346).abs() < 1e-9);
    }
}
