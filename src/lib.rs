//! # edgequake-chunkify
//!
//! Turn PDF (or Markdown) documents into header-delimited sections that
//! remember where they sit in the document outline.
//!
//! ## Why this crate?
//!
//! Retrieval pipelines chunk documents before indexing them. Fixed-size
//! windows cut through the middle of arguments and lose context; a section
//! titled "Results" means little without knowing it belongs to
//! "Experiment 2" of "Part II". This crate splits on headers and records,
//! for every section, the nearest enclosing H1–H4, so each chunk can be
//! indexed with its outline.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF / Markdown
//!  │
//!  ├─ 1. Input      resolve local file or download from URL
//!  ├─ 2. Extract    page text + font sizes via pdfium (spawn_blocking)
//!  ├─ 3. Layout     font sizes → #, ##, ### headings
//!  ├─ 4. Polish     deterministic cleanup (ligatures, hyphens, whitespace)
//!  ├─ 5. Split      header hierarchy → Vec<Section> (code fences masked)
//!  └─ 6. Normalise  optional per-section LLM rewrite with retry
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use edgequake_chunkify::split;
//!
//! let sections = split("# Main\nintro\n## Sub\ndetail");
//! assert_eq!(sections.len(), 2);
//! assert_eq!(sections[1].level, 2);
//! assert_eq!(sections[1].parents().get("h1"), Some("Main"));
//! ```
//!
//! Whole documents, including PDFs and URLs:
//!
//! ```rust,no_run
//! use edgequake_chunkify::{chunkify, ChunkifyConfig, NormalizerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ChunkifyConfig::builder()
//!         .normalize(NormalizerConfig::default())
//!         .build()?;
//!     let output = chunkify("paper.pdf", &config).await?;
//!     for section in &output.sections {
//!         println!("{}", section);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `chunkify` binary (clap + indicatif + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! edgequake-chunkify = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod section;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    ChunkifyConfig, ChunkifyConfigBuilder, NormalizerConfig, NormalizerConfigBuilder,
    PageSelection, PageSeparator, ParseConfig, ParseConfigBuilder, RetryConfig, TextEncoding,
    DEFAULT_ENCODING,
};
pub use convert::{build_normalizer, chunkify, chunkify_sync, chunkify_to_file};
pub use error::{ChunkifyError, NormalizeError};
pub use output::{ChunkifyOutput, ChunkifyStats};
pub use pipeline::normalize::{
    normalize_sections, Generation, LlmGenerator, NormalizeReport, SectionNormalizer,
    TextGenerator, UnicodeNormalizer,
};
pub use pipeline::parse::{MarkdownParser, ParsedDocument, PdfiumParser};
pub use pipeline::split::{split, split_from_file, MarkdownSplitter, Splitter};
pub use progress::{NoopProgressCallback, NormalizeProgressCallback, ProgressCallback};
pub use section::{OriginalContent, ParentHeaders, Section, SectionMetadata};
