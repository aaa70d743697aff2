// src/triage/classify.rs
// =============================================================================
// Line classification for the curated directory.
//
// The directory is plain Markdown with a very regular shape:
//
//   ## Fortran code on GitHub            <- document title, echoed as-is
//   * [Art and Music](#art-and-music)    <- table of contents, echoed as-is
//   ## Astronomy and Astrophysics        <- section header
//   [project](https://github.com/o/p): .. <- candidate entry
//   anything else                        <- ignored
//
// Classification only looks at line prefixes; it never touches the network.
// =============================================================================

/// Title heading of the Fortran-code-on-GitHub directory.
pub const DEFAULT_TITLE: &str = "## Fortran code on GitHub";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// The document's own title heading
    Title,
    /// A second-level (or deeper) heading that opens a section
    Header,
    /// `* [..]` (or `*[..]`) top-level list item
    ListItem,
    /// A line starting with `[`, possibly a project entry
    Candidate,
    Other,
}

#[derive(Debug, Clone)]
pub struct Classifier {
    title: String,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(DEFAULT_TITLE)
    }
}

impl Classifier {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
        }
    }

    // The title check must come first: the title is also a "##" line
    pub fn classify(&self, line: &str) -> LineKind {
        if !self.title.is_empty() && line.starts_with(self.title.as_str()) {
            LineKind::Title
        } else if line.starts_with("* [") || line.starts_with("*[") {
            LineKind::ListItem
        } else if line.starts_with("##") {
            LineKind::Header
        } else if line.starts_with('[') {
            LineKind::Candidate
        } else {
            LineKind::Other
        }
    }
}
