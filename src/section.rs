//! Section value type produced by the splitter.
//!
//! A [`Section`] is one header-delimited chunk of a Markdown document together
//! with the chain of headers that enclose it. Sections are plain values: the
//! splitter builds each one exactly once and nothing mutates it afterwards.
//! The normaliser derives *new* sections from old ones, keeping the original
//! header and text in [`SectionMetadata::original_content`].
//!
//! ## Wire shape
//!
//! ```json
//! {
//!   "section_header": "Deep",
//!   "section_text": "Deep content",
//!   "header_level": 3,
//!   "metadata": { "parents": { "h1": "Main", "h2": "Sub" } }
//! }
//! ```
//!
//! Ancestors that do not exist are omitted from `parents`, never `null`, and
//! normalisation bookkeeping only appears once a normaliser has touched the
//! section. Downstream indexers rely on this shape.

use serde::de::{self, Deserializer};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Deepest header level tracked as a parent (`h1`..`h4`).
pub const MAX_PARENT_DEPTH: usize = 4;

const PARENT_LABELS: [&str; MAX_PARENT_DEPTH] = ["h1", "h2", "h3", "h4"];

/// Nearest enclosing header at each depth 1–4.
///
/// Stored as a fixed array rather than a sparse map so "no ancestor" is
/// unambiguous. Serialises as a map containing only the present depths.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParentHeaders([Option<String>; MAX_PARENT_DEPTH]);

impl ParentHeaders {
    /// Parent header at `depth` (1-based), if any.
    pub fn at_depth(&self, depth: usize) -> Option<&str> {
        if (1..=MAX_PARENT_DEPTH).contains(&depth) {
            self.0[depth - 1].as_deref()
        } else {
            None
        }
    }

    /// Parent header by label (`"h1"`..`"h4"`).
    pub fn get(&self, label: &str) -> Option<&str> {
        label_to_depth(label).and_then(|d| self.at_depth(d))
    }

    /// Record `header` as the ancestor at `depth`. Depths outside 1–4 are ignored.
    pub(crate) fn set(&mut self, depth: usize, header: impl Into<String>) {
        if (1..=MAX_PARENT_DEPTH).contains(&depth) {
            self.0[depth - 1] = Some(header.into());
        }
    }

    /// `(label, header)` pairs for present ancestors, shallowest first.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        PARENT_LABELS
            .iter()
            .zip(self.0.iter())
            .filter_map(|(label, h)| h.as_deref().map(|h| (*label, h)))
    }

    pub fn len(&self) -> usize {
        self.0.iter().filter(|h| h.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.0.iter().all(Option::is_none)
    }
}

fn label_to_depth(label: &str) -> Option<usize> {
    PARENT_LABELS.iter().position(|l| *l == label).map(|i| i + 1)
}

impl Serialize for ParentHeaders {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (label, header) in self.iter() {
            map.serialize_entry(label, header)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ParentHeaders {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Nulls are accepted on input and dropped.
        let raw = BTreeMap::<String, Option<String>>::deserialize(deserializer)?;
        let mut parents = ParentHeaders::default();
        for (label, header) in raw {
            let depth = label_to_depth(&label).ok_or_else(|| {
                de::Error::custom(format!("unknown parent level '{label}', expected h1..h4"))
            })?;
            if let Some(h) = header {
                parents.set(depth, h);
            }
        }
        Ok(parents)
    }
}

/// Header and text of a section before normalisation rewrote it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OriginalContent {
    pub section_header: String,
    pub section_text: String,
}

/// Hierarchy information plus normalisation bookkeeping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionMetadata {
    pub parents: ParentHeaders,

    /// True once a normaliser successfully rewrote the section.
    #[serde(default, skip_serializing_if = "is_false")]
    pub normalized: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_count: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_content: Option<OriginalContent>,

    /// Why normalisation gave up on this section.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Last raw model output, kept when it could not be parsed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<String>,
}

fn is_false(v: &bool) -> bool {
    !*v
}

/// One header-delimited chunk of a Markdown document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// Header text, trimmed, without the leading `#` marks.
    #[serde(rename = "section_header")]
    pub header: String,

    /// Body between this header and the next one, trimmed. May be empty.
    #[serde(rename = "section_text")]
    pub text: String,

    /// Number of `#` marks on the header line (≥ 1).
    #[serde(rename = "header_level", alias = "level")]
    pub level: usize,

    pub metadata: SectionMetadata,
}

impl Section {
    pub fn new(
        header: impl Into<String>,
        text: impl Into<String>,
        level: usize,
        parents: ParentHeaders,
    ) -> Self {
        Self {
            header: header.into(),
            text: text.into(),
            level,
            metadata: SectionMetadata {
                parents,
                ..Default::default()
            },
        }
    }

    pub fn parents(&self) -> &ParentHeaders {
        &self.metadata.parents
    }

    /// Render back to Markdown: header marks, header, blank line, body.
    pub fn to_markdown(&self) -> String {
        format!("{} {}\n\n{}", "#".repeat(self.level), self.header, self.text)
    }

    /// Derive the rewritten section returned by a successful normalisation.
    ///
    /// Level and parents carry over; the current header/text become
    /// `original_content`.
    pub fn normalized(
        &self,
        header: impl Into<String>,
        text: impl Into<String>,
        token_count: Option<usize>,
        model_version: Option<String>,
    ) -> Section {
        Section {
            header: header.into(),
            text: text.into(),
            level: self.level,
            metadata: SectionMetadata {
                parents: self.metadata.parents.clone(),
                normalized: true,
                token_count,
                model_version,
                original_content: Some(OriginalContent {
                    section_header: self.header.clone(),
                    section_text: self.text.clone(),
                }),
                error: None,
                raw_response: None,
            },
        }
    }

    /// Copy of this section annotated with a normalisation failure.
    pub fn with_error(&self, error: impl Into<String>, raw_response: Option<String>) -> Section {
        let mut out = self.clone();
        out.metadata.error = Some(error.into());
        out.metadata.raw_response = raw_response;
        out
    }
}

impl fmt::Display for Section {
    /// Pretty-printed JSON.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string_pretty(self).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}
