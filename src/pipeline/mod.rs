//! Pipeline stages for PDF → sections.
//!
//! Each submodule implements exactly one transformation step so each can be
//! tested on its own.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──▶ layout ──▶ postprocess ──▶ split ──▶ normalize
//! (URL/path) (pdfium)  (headings)   (cleanup)    (sections)  (optional LLM)
//!                                                    ▲
//!                                                  mask
//! ```
//!
//! 1. [`input`]   — canonicalise the user-supplied path or URL; decode text files
//! 2. [`extract`] — per-page text lines with font sizes; runs in
//!    `spawn_blocking` because pdfium is not async-safe
//! 3. [`layout`]  — infer heading levels from font sizes and emit Markdown
//! 4. [`postprocess`] — deterministic cleanup of extraction artefacts
//! 5. [`parse`]   — the converter tying 1–4 together
//! 6. [`split`]   — header-hierarchy splitter; [`mask`] hides `#` lines in
//!    code fences from it
//! 7. [`normalize`] — per-section rewrite with retry; the only stage that
//!    talks to a model

pub mod extract;
pub mod input;
pub mod layout;
pub mod mask;
pub mod normalize;
pub mod parse;
pub mod postprocess;
pub mod split;
