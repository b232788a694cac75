//! Header-hierarchy splitter.
//!
//! Walks a flat Markdown document once and rebuilds the implicit section
//! tree: every ATX header (`#`, `##`, …) starts a section, and a stack of
//! open headers tells us which ancestors enclose it.
//!
//! ## Stack discipline
//!
//! ```text
//! # H1            stack: [1 H1]                 parents: {}
//! ## H1.1         stack: [1 H1, 2 H1.1]         parents: {h1: H1}
//! # H2            stack: [1 H2]                 parents: {}
//! ## H2.1         stack: [1 H2, 2 H2.1]         parents: {h1: H2}
//! ### H2.1.1      stack: [1 H2, 2 H2.1, 3 …]    parents: {h1: H2, h2: H2.1}
//! ```
//!
//! A new header first pops everything at its own depth or deeper, so a
//! sibling never nests under its predecessor and a closed subtree never
//! leaks ancestors into the next one.

#[cfg(doc)]
use crate::config::DEFAULT_ENCODING;
use crate::error::ChunkifyError;
use crate::pipeline::input;
use crate::pipeline::mask::mask_code_blocks;
use crate::section::{ParentHeaders, Section, MAX_PARENT_DEPTH};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;
use tracing::{debug, info, warn};

/// One or more `#`, horizontal whitespace, then non-blank header text.
static RE_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^(#+)[^\S\r\n]+(\S[^\r\n]*)").unwrap());

/// Produces ordered sections from Markdown text.
pub trait Splitter {
    fn split_text(&self, text: &str) -> Vec<Section>;
}

/// The header-depth splitter. Stateless; every call builds its own stack.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownSplitter;

impl MarkdownSplitter {
    pub fn new() -> Self {
        Self
    }

    /// Read `path`, decoded with the codec named by `encoding`, and split it.
    pub fn from_file(
        path: impl AsRef<Path>,
        encoding: &str,
    ) -> Result<Vec<Section>, ChunkifyError> {
        let text = input::read_text(path.as_ref(), encoding)?;
        Ok(Self.split_text(&text))
    }
}

impl Splitter for MarkdownSplitter {
    fn split_text(&self, text: &str) -> Vec<Section> {
        split(text)
    }
}

/// Split Markdown into sections, one per header, in document order.
///
/// Returns an empty vector for blank input and for documents without any
/// header; text before the first header is not turned into a section.
pub fn split(text: &str) -> Vec<Section> {
    if text.trim().is_empty() {
        warn!("split received empty input");
        return Vec::new();
    }

    info!("Splitting Markdown by headers");
    let masked = mask_code_blocks(text);
    let source = masked.text.as_str();

    let headers: Vec<_> = RE_HEADER.captures_iter(source).collect();
    debug!("Found {} headers", headers.len());

    let mut stack = HeaderStack::default();
    let mut sections = Vec::with_capacity(headers.len());

    for (i, caps) in headers.iter().enumerate() {
        let (Some(whole), Some(marks), Some(title)) = (caps.get(0), caps.get(1), caps.get(2))
        else {
            continue;
        };
        let level = marks.as_str().len();
        let header = title.as_str().trim();

        let body_end = headers
            .get(i + 1)
            .and_then(|next| next.get(0))
            .map_or(source.len(), |m| m.start());
        let body = masked.unmask(source[whole.end()..body_end].trim());

        let parents = stack.open(level, header);
        debug!("h{} '{}' parents={:?}", level, header, parents);

        sections.push(Section::new(header, body, level, parents));
    }

    info!("Split Markdown into {} sections", sections.len());
    sections
}

/// Split the Markdown file at `path`, decoded with the codec labelled
/// `encoding` (any WHATWG label; pass [`DEFAULT_ENCODING`] for UTF-8).
///
/// # Errors
/// - [`ChunkifyError::UnsupportedEncoding`] if the label names no codec
/// - [`ChunkifyError::FileNotFound`] if nothing exists at `path`
/// - [`ChunkifyError::IsADirectory`] if `path` is a directory
/// - [`ChunkifyError::Decode`] at the first byte the codec rejects
pub fn split_from_file(
    path: impl AsRef<Path>,
    encoding: &str,
) -> Result<Vec<Section>, ChunkifyError> {
    MarkdownSplitter::from_file(path, encoding)
}

/// Currently open headers, shallowest at the bottom.
#[derive(Debug, Default)]
struct HeaderStack {
    entries: Vec<(usize, String)>,
}

impl HeaderStack {
    /// Close everything at `level` or deeper, report the remaining
    /// ancestors, then open `header` at `level`.
    fn open(&mut self, level: usize, header: &str) -> ParentHeaders {
        while self.entries.last().is_some_and(|(depth, _)| *depth >= level) {
            self.entries.pop();
        }

        let mut parents = ParentHeaders::default();
        for (depth, text) in &self.entries {
            if *depth <= MAX_PARENT_DEPTH {
                parents.set(*depth, text.as_str());
            }
        }

        self.entries.push((level, header.to_string()));
        parents
    }
}
