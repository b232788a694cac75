//! Input resolution: turn a user-supplied path or URL into something the
//! pipeline can read.
//!
//! PDFs go to pdfium, which needs a file-system path, so URLs are downloaded
//! into a `TempDir` that lives as long as the [`ResolvedInput`]. Markdown
//! files are read and decoded here with the requested [`TextEncoding`].

use crate::config::TextEncoding;
#[cfg(doc)]
use crate::config::DEFAULT_ENCODING;
use crate::error::ChunkifyError;
use encoding_rs::{DecoderResult, Encoding, UTF_16BE, UTF_16LE};
use std::io::Read;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info};

const PDF_MAGIC: &[u8; 4] = b"%PDF";

/// What kind of document an input names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Pdf,
    Markdown,
}

/// Classify an input by URL scheme, extension, then magic bytes.
///
/// URLs are always treated as PDFs. Local paths ending in `.md`,
/// `.markdown` or `.txt` are Markdown; anything else is sniffed for `%PDF`.
pub fn detect_kind(input: &str) -> InputKind {
    if is_url(input) {
        return InputKind::Pdf;
    }
    let path = Path::new(input);
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("md" | "markdown" | "txt") => InputKind::Markdown,
        Some("pdf") => InputKind::Pdf,
        _ => {
            let mut magic = [0u8; 4];
            let is_pdf = std::fs::File::open(path)
                .and_then(|mut f| f.read_exact(&mut magic))
                .map(|_| &magic == PDF_MAGIC)
                .unwrap_or(false);
            if is_pdf {
                InputKind::Pdf
            } else {
                InputKind::Markdown
            }
        }
    }
}

/// A PDF that is ready to open: either a local path or a downloaded temp file.
pub enum ResolvedInput {
    Local(PathBuf),
    /// The `TempDir` is held so the download survives until processing ends.
    Downloaded { path: PathBuf, _temp_dir: TempDir },
}

impl ResolvedInput {
    pub fn path(&self) -> &Path {
        match self {
            ResolvedInput::Local(p) => p,
            ResolvedInput::Downloaded { path, .. } => path,
        }
    }
}

pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve `input` to a local PDF path, downloading URLs first.
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<ResolvedInput, ChunkifyError> {
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else {
        resolve_local(input)
    }
}

fn resolve_local(path_str: &str) -> Result<ResolvedInput, ChunkifyError> {
    let path = PathBuf::from(path_str);
    ensure_file(&path)?;

    match std::fs::File::open(&path) {
        Ok(mut f) => {
            let mut magic = [0u8; 4];
            if f.read_exact(&mut magic).is_ok() && &magic != PDF_MAGIC {
                return Err(ChunkifyError::NotAPdf { path, magic });
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(ChunkifyError::PermissionDenied { path });
        }
        Err(e) => return Err(e.into()),
    }

    debug!("Resolved local PDF: {}", path.display());
    Ok(ResolvedInput::Local(path))
}

async fn download_url(url: &str, timeout_secs: u64) -> Result<ResolvedInput, ChunkifyError> {
    info!("Downloading PDF from: {}", url);

    let failed = |reason: String| ChunkifyError::DownloadFailed {
        url: url.to_string(),
        reason,
    };

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| failed(e.to_string()))?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            ChunkifyError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            failed(e.to_string())
        }
    })?;

    if !response.status().is_success() {
        return Err(failed(format!("HTTP {}", response.status())));
    }

    let filename = filename_from_url(url);
    let bytes = response.bytes().await.map_err(|e| failed(e.to_string()))?;

    if bytes.len() >= 4 && &bytes[..4] != PDF_MAGIC {
        let mut magic = [0u8; 4];
        magic.copy_from_slice(&bytes[..4]);
        return Err(ChunkifyError::NotAPdf {
            path: PathBuf::from(filename),
            magic,
        });
    }

    let temp_dir = TempDir::new()?;
    let file_path = temp_dir.path().join(&filename);
    tokio::fs::write(&file_path, &bytes).await?;

    info!("Downloaded {} bytes to: {}", bytes.len(), file_path.display());

    Ok(ResolvedInput::Downloaded {
        path: file_path,
        _temp_dir: temp_dir,
    })
}

/// Last path segment of `url` when it looks like a file name, else `downloaded.pdf`.
fn filename_from_url(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|parsed| {
            parsed
                .path_segments()
                .and_then(|mut segments| segments.next_back().map(str::to_string))
        })
        .filter(|last| !last.is_empty() && last.contains('.'))
        .unwrap_or_else(|| "downloaded.pdf".to_string())
}

/// Fail with `FileNotFound` / `IsADirectory` before anything is read.
fn ensure_file(path: &Path) -> Result<(), ChunkifyError> {
    match std::fs::metadata(path) {
        Ok(meta) if meta.is_dir() => Err(ChunkifyError::IsADirectory {
            path: path.to_path_buf(),
        }),
        Ok(_) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(ChunkifyError::FileNotFound {
            path: path.to_path_buf(),
        }),
        Err(e) => Err(e.into()),
    }
}

/// Read a text file, decoding it with the codec named by `label`
/// (`"utf-8"` when in doubt, see [`DEFAULT_ENCODING`]).
///
/// # Errors
/// - [`ChunkifyError::UnsupportedEncoding`] for a label no codec answers to
/// - [`ChunkifyError::FileNotFound`] / [`ChunkifyError::IsADirectory`],
///   checked before reading
/// - [`ChunkifyError::Io`] for any read failure, unchanged
/// - [`ChunkifyError::Decode`] at the first malformed byte sequence
pub fn read_text(path: &Path, label: &str) -> Result<String, ChunkifyError> {
    read_text_as(path, label.parse()?)
}

/// [`read_text`] with an already resolved encoding.
pub fn read_text_as(path: &Path, encoding: TextEncoding) -> Result<String, ChunkifyError> {
    ensure_file(path)?;
    let bytes = std::fs::read(path)?;
    debug!(
        "Read {} bytes from {} as {}",
        bytes.len(),
        path.display(),
        encoding
    );
    decode(&bytes, encoding).map_err(|offset| ChunkifyError::Decode {
        path: path.to_path_buf(),
        encoding: encoding.label(),
        offset,
    })
}

/// Decode `bytes` strictly, or return the offset of the first malformed
/// sequence.
///
/// A BOM-aware encoding drops a leading byte-order mark of its own family
/// (for UTF-16 the mark also picks the byte order); otherwise the bytes are
/// decoded exactly as given.
pub fn decode(bytes: &[u8], encoding: TextEncoding) -> Result<String, usize> {
    let (codec, skip) = match Encoding::for_bom(bytes) {
        Some((codec, bom_len))
            if encoding.is_bom_aware() && is_utf16(codec) == is_utf16(encoding.encoding()) =>
        {
            (codec, bom_len)
        }
        _ => (encoding.encoding(), 0),
    };
    let input = &bytes[skip..];

    let mut decoder = codec.new_decoder_without_bom_handling();
    let mut out = String::with_capacity(
        decoder
            .max_utf8_buffer_length_without_replacement(input.len())
            .unwrap_or(input.len()),
    );
    let mut consumed = 0;
    loop {
        let (result, read) =
            decoder.decode_to_string_without_replacement(&input[consumed..], &mut out, true);
        consumed += read;
        match result {
            DecoderResult::InputEmpty => return Ok(out),
            DecoderResult::Malformed(bad, pending) => {
                return Err(skip + consumed - bad as usize - pending as usize);
            }
            DecoderResult::OutputFull => {
                let more = decoder
                    .max_utf8_buffer_length_without_replacement(input.len() - consumed)
                    .unwrap_or(input.len() - consumed)
                    .max(16);
                out.reserve(more);
            }
        }
    }
}

fn is_utf16(codec: &'static Encoding) -> bool {
    codec == UTF_16LE || codec == UTF_16BE
}
