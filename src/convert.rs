//! End-to-end entry points: document in, sections out.
//!
//! [`chunkify`] picks the source by input kind (PDF path/URL or Markdown
//! file), splits the Markdown by header hierarchy, and optionally runs every
//! section through the normaliser. The provider is resolved *before* the
//! PDF is converted so a missing API key fails in milliseconds, not after a
//! long extraction.

use crate::config::{ChunkifyConfig, NormalizerConfig};
use crate::error::ChunkifyError;
use crate::output::{write_sections_json, ChunkifyOutput, ChunkifyStats};
use crate::pipeline::input::{self, InputKind};
use crate::pipeline::normalize::{normalize_sections, LlmGenerator, UnicodeNormalizer};
use crate::pipeline::parse::PdfiumParser;
use crate::pipeline::split::split;
use edgequake_llm::{LLMProvider, ProviderFactory};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Model used when neither config nor environment names one.
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Convert (if needed), split and optionally normalise one document.
///
/// # Arguments
/// * `input`  — local PDF or Markdown path, or an HTTP/HTTPS URL to a PDF
/// * `config` — pipeline configuration
///
/// # Errors
/// Only fatal problems are returned: unreadable input, a PDF pdfium cannot
/// open, an unconfigured provider when normalisation is requested. A section
/// the model could not rewrite is *not* an error; see
/// `output.stats.failed_sections`.
pub async fn chunkify(
    input_str: impl AsRef<str>,
    config: &ChunkifyConfig,
) -> Result<ChunkifyOutput, ChunkifyError> {
    let total_start = Instant::now();
    let input_str = input_str.as_ref();
    info!("Starting chunkify: {}", input_str);

    let mut stats = ChunkifyStats::default();

    // ── Step 1: Resolve the normaliser early ─────────────────────────────
    let normalizer = match config.normalize {
        Some(ref n) => Some(build_normalizer(n)?),
        None => None,
    };

    // ── Step 2: Obtain Markdown ──────────────────────────────────────────
    let parse_start = Instant::now();
    let markdown = match input::detect_kind(input_str) {
        InputKind::Pdf => {
            let doc = PdfiumParser::new(config.parse.clone())
                .parse_document(input_str)
                .await?;
            stats.pages = doc.pages;
            stats.markdown_path = doc.persisted_to;
            doc.markdown
        }
        InputKind::Markdown => {
            let path = PathBuf::from(input_str);
            let encoding = config.encoding;
            tokio::task::spawn_blocking(move || input::read_text_as(&path, encoding))
                .await
                .map_err(|e| ChunkifyError::Internal(format!("Read task panicked: {}", e)))??
        }
    };
    stats.parse_duration_ms = parse_start.elapsed().as_millis() as u64;

    // ── Step 3: Split ────────────────────────────────────────────────────
    let split_start = Instant::now();
    let sections = split(&markdown);
    stats.split_duration_ms = split_start.elapsed().as_millis() as u64;

    // ── Step 4: Normalise ────────────────────────────────────────────────
    let sections = match (normalizer, config.normalize.as_ref()) {
        (Some(normalizer), Some(n)) => {
            let start = Instant::now();
            let out = normalize_sections(
                &normalizer,
                sections,
                n.concurrency,
                config.progress_callback.as_ref(),
            )
            .await;
            stats.normalize_duration_ms = start.elapsed().as_millis() as u64;
            out
        }
        _ => sections,
    };

    stats.count_sections(&sections);
    stats.total_duration_ms = total_start.elapsed().as_millis() as u64;

    info!(
        "Chunkify complete: {} sections ({} normalised, {} failed), {}ms total",
        stats.section_count,
        stats.normalized_sections,
        stats.failed_sections,
        stats.total_duration_ms
    );

    Ok(ChunkifyOutput {
        markdown,
        sections,
        stats,
    })
}

/// Run [`chunkify`] and write the sections as JSON to `output_path`.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn chunkify_to_file(
    input_str: impl AsRef<str>,
    output_path: impl AsRef<Path>,
    config: &ChunkifyConfig,
) -> Result<ChunkifyStats, ChunkifyError> {
    let output = chunkify(input_str, config).await?;
    write_sections_json(output_path.as_ref(), &output.sections).await?;
    Ok(output.stats)
}

/// Synchronous wrapper around [`chunkify`].
///
/// Creates a temporary tokio runtime internally.
pub fn chunkify_sync(
    input_str: impl AsRef<str>,
    config: &ChunkifyConfig,
) -> Result<ChunkifyOutput, ChunkifyError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ChunkifyError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(chunkify(input_str, config))
}

/// Build the LLM-backed normaliser described by `config`.
pub fn build_normalizer(
    config: &NormalizerConfig,
) -> Result<UnicodeNormalizer<LlmGenerator>, ChunkifyError> {
    let (provider, model) = resolve_provider(config)?;
    debug!("Normaliser using model '{}'", model);

    let generator =
        LlmGenerator::new(provider, model).with_options(config.temperature, config.max_tokens);
    let mut normalizer = UnicodeNormalizer::new(generator).with_retry(config.retry);
    if let Some(ref template) = config.instructions {
        normalizer = normalizer.with_template(template.clone());
    }
    Ok(normalizer)
}

// ── Internal helpers ─────────────────────────────────────────────────────

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Model name: config, then `EDGEQUAKE_MODEL`, then `GOOGLE_GEMINI_MODEL`,
/// then [`DEFAULT_MODEL`].
pub fn resolve_model(config: &NormalizerConfig) -> String {
    config
        .model
        .clone()
        .or_else(|| non_empty_env("EDGEQUAKE_MODEL"))
        .or_else(|| non_empty_env("GOOGLE_GEMINI_MODEL"))
        .unwrap_or_else(|| DEFAULT_MODEL.to_string())
}

fn create_provider(
    provider_name: &str,
    model: &str,
) -> Result<Arc<dyn LLMProvider>, ChunkifyError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        ChunkifyError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

/// Resolve the LLM provider, from most-specific to least-specific.
///
/// 1. **Pre-built provider** (`config.provider`) — used as-is.
/// 2. **Named provider** (`config.provider_name`) with the resolved model;
///    the factory reads the matching API key from the environment.
/// 3. **Environment pair** (`EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`).
/// 4. **Gemini key present** (`GEMINI_API_KEY` / `GOOGLE_API_KEY`) — Gemini
///    with the resolved model, so the default model is honoured even when
///    other keys are also set.
/// 5. **Full auto-detection** (`ProviderFactory::from_env`).
fn resolve_provider(
    config: &NormalizerConfig,
) -> Result<(Arc<dyn LLMProvider>, String), ChunkifyError> {
    let model = resolve_model(config);

    if let Some(ref provider) = config.provider {
        return Ok((Arc::clone(provider), model));
    }

    if let Some(ref name) = config.provider_name {
        return Ok((create_provider(name, &model)?, model));
    }

    if let (Some(prov), Some(env_model)) = (
        non_empty_env("EDGEQUAKE_LLM_PROVIDER"),
        non_empty_env("EDGEQUAKE_MODEL"),
    ) {
        let model = config.model.clone().unwrap_or(env_model);
        return Ok((create_provider(&prov, &model)?, model));
    }

    if non_empty_env("GEMINI_API_KEY")
        .or_else(|| non_empty_env("GOOGLE_API_KEY"))
        .is_some()
    {
        return Ok((create_provider("gemini", &model)?, model));
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| ChunkifyError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set GEMINI_API_KEY, OPENAI_API_KEY, or configure a provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok((llm_provider, model))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn explicit_model_wins() {
        let config = NormalizerConfig::builder().model("my-model").build().unwrap();
        assert_eq!(resolve_model(&config), "my-model");
    }

    #[tokio::test]
    async fn markdown_input_is_split_without_conversion() {
        let mut f = tempfile::Builder::new().suffix(".md").tempfile().unwrap();
        f.write_all(b"# Main\nintro\n## Sub\ndetail\n").unwrap();

        let out = chunkify(f.path().to_str().unwrap(), &ChunkifyConfig::default())
            .await
            .unwrap();
        assert_eq!(out.sections.len(), 2);
        assert_eq!(out.sections[1].parents().get("h1"), Some("Main"));
        assert_eq!(out.stats.pages, 0);
        assert_eq!(out.stats.section_count, 2);
        assert_eq!(out.stats.normalized_sections, 0);
    }

    #[tokio::test]
    async fn missing_markdown_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("gone.md");
        let err = chunkify(missing.to_str().unwrap(), &ChunkifyConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ChunkifyError::FileNotFound { .. }));
    }

    #[tokio::test]
    async fn chunkify_to_file_writes_json() {
        let dir = tempfile::tempdir().unwrap();
        let md = dir.path().join("doc.markdown");
        std::fs::write(&md, "# Only\nbody").unwrap();
        let out = dir.path().join("out/sections.json");

        let stats = chunkify_to_file(md.to_str().unwrap(), &out, &ChunkifyConfig::default())
            .await
            .unwrap();
        assert_eq!(stats.section_count, 1);

        let v: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(v[0]["section_header"], "Only");
        assert_eq!(v[0]["metadata"]["parents"], serde_json::json!({}));
    }

    #[test]
    fn chunkify_sync_runs_outside_a_runtime() {
        let mut f = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        f.write_all(b"no headers here").unwrap();
        let out = chunkify_sync(f.path().to_str().unwrap(), &ChunkifyConfig::default()).unwrap();
        assert!(out.sections.is_empty());
        assert_eq!(out.markdown, "no headers here");
    }
}
