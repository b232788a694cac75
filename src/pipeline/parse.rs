//! PDF → Markdown converter.
//!
//! Chains the PDF-side stages: [`input`](super::input) resolution,
//! [`extract`](super::extract), [`layout`](super::layout) and
//! [`postprocess`](super::postprocess), then optionally persists the result
//! next to where the caller wants it.

use super::{extract, input, layout, postprocess};
use crate::config::ParseConfig;
use crate::error::ChunkifyError;
use crate::output::write_atomic;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;

/// Produces Markdown from a document reference (path or URL).
pub trait MarkdownParser {
    fn parse<'a>(
        &'a self,
        input: &'a str,
    ) -> impl Future<Output = Result<String, ChunkifyError>> + Send + 'a;
}

/// Result of converting one PDF.
#[derive(Debug, Clone)]
pub struct ParsedDocument {
    pub markdown: String,
    /// Pages that produced output.
    pub pages: usize,
    /// Where the Markdown was written, when a destination was configured.
    pub persisted_to: Option<PathBuf>,
    pub duration_ms: u64,
}

/// pdfium-backed converter with font-size heading inference.
#[derive(Debug, Clone, Default)]
pub struct PdfiumParser {
    config: ParseConfig,
}

impl PdfiumParser {
    pub fn new(config: ParseConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ParseConfig {
        &self.config
    }

    /// Convert `input` and report how it went.
    pub async fn parse_document(&self, input_str: &str) -> Result<ParsedDocument, ChunkifyError> {
        let start = Instant::now();
        info!("Converting PDF: {}", input_str);

        let resolved = input::resolve_input(input_str, self.config.download_timeout_secs).await?;
        let pdf_path = resolved.path().to_path_buf();

        let pages = extract::extract_pages(
            &pdf_path,
            self.config.password.clone(),
            self.config.pages.clone(),
        )
        .await?;

        let raw = layout::pages_to_markdown(&pages, &self.config);
        let markdown = postprocess::clean_markdown(&raw);

        let persisted_to = match self.config.destination {
            Some(ref dir) => Some(persist(&markdown, dir, &pdf_path).await?),
            None => None,
        };

        let duration_ms = start.elapsed().as_millis() as u64;
        info!(
            "Converted {} pages to {} bytes of Markdown in {}ms",
            pages.len(),
            markdown.len(),
            duration_ms
        );

        Ok(ParsedDocument {
            markdown,
            pages: pages.len(),
            persisted_to,
            duration_ms,
        })
    }
}

impl MarkdownParser for PdfiumParser {
    fn parse<'a>(
        &'a self,
        input: &'a str,
    ) -> impl Future<Output = Result<String, ChunkifyError>> + Send + 'a {
        async move { self.parse_document(input).await.map(|doc| doc.markdown) }
    }
}

/// `<dir>/<pdf stem>.md`
pub fn destination_path(dir: &Path, pdf_path: &Path) -> PathBuf {
    let stem = pdf_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "document".to_string());
    dir.join(format!("{stem}.md"))
}

async fn persist(markdown: &str, dir: &Path, pdf_path: &Path) -> Result<PathBuf, ChunkifyError> {
    let target = destination_path(dir, pdf_path);
    write_atomic(&target, markdown).await?;
    info!("Markdown written to {}", target.display());
    Ok(target)
}
