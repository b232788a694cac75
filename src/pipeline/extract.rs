//! Text extraction: pull positioned text lines out of selected PDF pages.
//!
//! pdfium is a C library with thread-local state and blocking calls, so all
//! of it runs inside `tokio::task::spawn_blocking`. For every page we keep
//! each line's text together with its dominant font size; [`super::layout`]
//! turns those sizes into heading levels.

use crate::config::PageSelection;
use crate::error::ChunkifyError;
use pdfium_render::prelude::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// One line of page text and the font size most of its characters use.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub text: String,
    pub font_size: f32,
    /// Non-whitespace characters on the line; weights the body-size vote.
    pub weight: usize,
}

impl TextLine {
    pub fn new(text: impl Into<String>, font_size: f32) -> Self {
        let text = text.into();
        let weight = text.chars().filter(|c| !c.is_whitespace()).count();
        Self {
            text,
            font_size,
            weight,
        }
    }
}

/// Lines of a single page, top to bottom.
#[derive(Debug, Clone, Default)]
pub struct PageText {
    /// 0-based page index in the document.
    pub index: usize,
    pub lines: Vec<TextLine>,
}

/// Bind pdfium: `PDFIUM_LIB_PATH`, then the working directory, then the system library.
pub fn bind_pdfium() -> Result<Pdfium, ChunkifyError> {
    let mut candidates = Vec::new();
    if let Ok(p) = std::env::var("PDFIUM_LIB_PATH") {
        let p = PathBuf::from(p);
        if p.is_dir() {
            candidates.push(Pdfium::pdfium_platform_library_name_at_path(&p));
        } else {
            candidates.push(p);
        }
    }
    candidates.push(Pdfium::pdfium_platform_library_name_at_path("./"));

    for candidate in &candidates {
        match Pdfium::bind_to_library(candidate) {
            Ok(bindings) => {
                debug!("Bound pdfium from {}", candidate.display());
                return Ok(Pdfium::new(bindings));
            }
            Err(e) => debug!("pdfium not loadable from {}: {:?}", candidate.display(), e),
        }
    }

    Pdfium::bind_to_system_library()
        .map(Pdfium::new)
        .map_err(|e| ChunkifyError::PdfiumBindingFailed(format!("{e:?}")))
}

/// Extract text lines from the selected pages of `pdf_path`.
pub async fn extract_pages(
    pdf_path: &Path,
    password: Option<String>,
    selection: PageSelection,
) -> Result<Vec<PageText>, ChunkifyError> {
    let path = pdf_path.to_path_buf();

    tokio::task::spawn_blocking(move || extract_pages_blocking(&path, password.as_deref(), &selection))
        .await
        .map_err(|e| ChunkifyError::Internal(format!("Extraction task panicked: {}", e)))?
}

fn extract_pages_blocking(
    pdf_path: &Path,
    password: Option<&str>,
    selection: &PageSelection,
) -> Result<Vec<PageText>, ChunkifyError> {
    let pdfium = bind_pdfium()?;

    let document = pdfium
        .load_pdf_from_file(pdf_path, password)
        .map_err(|e| map_load_error(pdf_path, password.is_some(), e))?;

    let pages = document.pages();
    let total_pages = pages.len() as usize;
    let indices = selection.to_indices(total_pages);
    info!(
        "PDF loaded: {} pages, extracting {}",
        total_pages,
        indices.len()
    );

    let mut out = Vec::with_capacity(indices.len());
    for idx in indices {
        let page = match u16::try_from(idx).ok().and_then(|i| pages.get(i).ok()) {
            Some(p) => p,
            None => {
                warn!("Skipping page {} (could not be opened)", idx + 1);
                continue;
            }
        };
        let lines = match page.text() {
            Ok(text) => page_lines(&text),
            Err(e) => {
                warn!("Page {} has no extractable text: {:?}", idx + 1, e);
                Vec::new()
            }
        };
        debug!("Page {} → {} lines", idx + 1, lines.len());
        out.push(PageText { index: idx, lines });
    }

    Ok(out)
}

fn map_load_error(path: &Path, had_password: bool, e: PdfiumError) -> ChunkifyError {
    let detail = format!("{:?}", e);
    if detail.contains("Password") || detail.contains("password") {
        if had_password {
            ChunkifyError::WrongPassword {
                path: path.to_path_buf(),
            }
        } else {
            ChunkifyError::PasswordRequired {
                path: path.to_path_buf(),
            }
        }
    } else {
        ChunkifyError::CorruptPdf {
            path: path.to_path_buf(),
            detail,
        }
    }
}

/// Split page text on pdfium's line breaks, tracking each line's font sizes.
fn page_lines(text: &PdfPageText) -> Vec<TextLine> {
    let mut lines = Vec::new();
    let mut current = LineBuilder::default();

    for ch in text.chars().iter() {
        let Some(c) = ch.unicode_char() else {
            continue;
        };
        if c == '\n' || c == '\r' {
            current.finish_into(&mut lines);
            continue;
        }
        current.push(c, ch.scaled_font_size().value);
    }
    current.finish_into(&mut lines);
    lines
}

/// Accumulates one line and a histogram of its font sizes.
#[derive(Default)]
struct LineBuilder {
    text: String,
    sizes: HashMap<u32, usize>,
}

impl LineBuilder {
    fn push(&mut self, c: char, size: f32) {
        self.text.push(c);
        if !c.is_whitespace() && size.is_finite() && size > 0.0 {
            *self.sizes.entry(size_bucket(size)).or_default() += 1;
        }
    }

    fn finish_into(&mut self, lines: &mut Vec<TextLine>) {
        let text = self.text.trim();
        if !text.is_empty() {
            let size = self
                .sizes
                .iter()
                .max_by(|a, b| a.1.cmp(b.1).then(a.0.cmp(b.0)))
                .map(|(bucket, _)| bucket_size(*bucket))
                .unwrap_or(0.0);
            lines.push(TextLine::new(text, size));
        }
        self.text.clear();
        self.sizes.clear();
    }
}

/// Font sizes are compared in half-point buckets.
pub(crate) fn size_bucket(size: f32) -> u32 {
    (size * 2.0).round().max(0.0) as u32
}

pub(crate) fn bucket_size(bucket: u32) -> f32 {
    bucket as f32 / 2.0
}
