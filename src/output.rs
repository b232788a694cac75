//! Pipeline output types and file writers.

use crate::error::ChunkifyError;
use crate::section::Section;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Everything [`crate::chunkify`] produced for one input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkifyOutput {
    /// The Markdown that was split (converted from PDF, or read from disk).
    pub markdown: String,
    pub sections: Vec<Section>,
    pub stats: ChunkifyStats,
}

/// Counters and timings for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkifyStats {
    /// PDF pages converted; 0 for Markdown input.
    pub pages: usize,
    pub section_count: usize,
    pub normalized_sections: usize,
    /// Sections whose normalisation gave up (they keep their original text).
    pub failed_sections: usize,
    /// Total tokens reported by the model across normalised sections.
    pub output_tokens: u64,
    /// Where converted Markdown was persisted, if anywhere.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub markdown_path: Option<PathBuf>,
    pub parse_duration_ms: u64,
    pub split_duration_ms: u64,
    pub normalize_duration_ms: u64,
    pub total_duration_ms: u64,
}

impl ChunkifyStats {
    /// Fill the section counters from the final sections.
    pub fn count_sections(&mut self, sections: &[Section]) {
        self.section_count = sections.len();
        self.normalized_sections = sections.iter().filter(|s| s.metadata.normalized).count();
        self.failed_sections = sections
            .iter()
            .filter(|s| s.metadata.error.is_some())
            .count();
        self.output_tokens = sections
            .iter()
            .filter_map(|s| s.metadata.token_count)
            .map(|n| n as u64)
            .sum();
    }
}

/// Write `contents` to `path` via a sibling temp file and rename, creating
/// parent directories as needed. Readers never observe a partial file.
pub async fn write_atomic(path: &Path, contents: &str) -> Result<(), ChunkifyError> {
    let fail = |source| ChunkifyError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(fail)?;
    }

    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    tokio::fs::write(&tmp_path, contents).await.map_err(fail)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(fail)?;
    Ok(())
}

/// Serialise `sections` as pretty JSON and write it atomically to `path`.
pub async fn write_sections_json(path: &Path, sections: &[Section]) -> Result<(), ChunkifyError> {
    let json = serde_json::to_string_pretty(sections)
        .map_err(|e| ChunkifyError::Internal(format!("serialising sections: {e}")))?;
    write_atomic(path, &format!("{json}\n")).await
}
