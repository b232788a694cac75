//! Error types for the edgequake-chunkify library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`ChunkifyError`] — **Fatal**: the pipeline cannot proceed at all
//!   (missing file, unreadable PDF, provider not configured). Returned as
//!   `Err(ChunkifyError)` from the entry points.
//!
//! * [`NormalizeError`] — **Non-fatal**: one section could not be rewritten
//!   by the model. It never escapes the normaliser; its message is recorded
//!   in [`crate::section::SectionMetadata::error`] and the original section
//!   is kept.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the edgequake-chunkify library.
#[derive(Debug, Error)]
pub enum ChunkifyError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Nothing exists at the given path.
    #[error("File not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// The path exists but points at a directory.
    #[error("Path is a directory, expected a file: '{path}'")]
    IsADirectory { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'")]
    DownloadTimeout { url: String, secs: u64 },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── Text decoding ─────────────────────────────────────────────────────
    /// The requested text encoding label is not one we can decode.
    #[error("Unsupported text encoding '{label}'\nUse a WHATWG label such as utf-8, windows-1252, shift_jis or utf-16.")]
    UnsupportedEncoding { label: String },

    /// The file bytes are not valid in the requested encoding.
    #[error("'{path}' is not valid {encoding}: invalid byte at offset {offset}")]
    Decode {
        path: PathBuf,
        encoding: &'static str,
        offset: usize,
    },

    /// Underlying read failure, surfaced as-is.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium, place the library in the working\n\
directory, or install it system-wide.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Output errors ─────────────────────────────────────────────────────
    /// Could not create or write an output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── LLM / config errors ───────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal failure while normalising a single section.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NormalizeError {
    /// The text-generation call itself failed.
    #[error("generation failed: {0}")]
    Generation(String),

    /// The response body was not the JSON object we asked for.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The JSON object was missing a required field.
    #[error("response is missing field '{0}'")]
    MissingField(&'static str),
}
