//! Configuration types for the chunkify pipeline.
//!
//! Each stage gets its own config struct, built through a builder with
//! documented defaults:
//!
//! * [`ParseConfig`] — PDF → Markdown conversion
//! * [`NormalizerConfig`] (with its [`RetryConfig`]) — optional LLM rewrite
//! * [`ChunkifyConfig`] — the end-to-end pipeline, owning the other two
//!
//! The splitter itself has no knobs.

use crate::error::ChunkifyError;
use crate::progress::ProgressCallback;
use edgequake_llm::LLMProvider;
use encoding_rs::Encoding;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

// ── Text encoding ────────────────────────────────────────────────────────

/// Label used when the caller does not name an encoding.
pub const DEFAULT_ENCODING: &str = "utf-8";

/// Encoding used to decode Markdown files read from disk.
///
/// Parsed from any WHATWG encoding label (`utf-8`, `windows-1252`,
/// `shift_jis`, `utf-16le`, …) plus the common Python spellings
/// (`latin-1`, `utf_8`, `cp1252`, `utf-8-sig`). `utf-16` and `utf-8-sig`
/// honour a byte-order mark; every other label decodes the bytes as they are.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextEncoding {
    encoding: &'static Encoding,
    bom_aware: bool,
}

impl TextEncoding {
    /// Resolve `label`, or fail with [`ChunkifyError::UnsupportedEncoding`].
    pub fn for_label(label: &str) -> Result<Self, ChunkifyError> {
        let wanted = label.trim().to_ascii_lowercase();
        let bom_aware = matches!(
            wanted.as_str(),
            "utf-8-sig" | "utf_8_sig" | "utf8-sig" | "utf-16" | "utf_16" | "utf16"
        );
        let lookup = wanted
            .trim_end_matches("-sig")
            .trim_end_matches("_sig")
            .to_string();

        [lookup.clone(), lookup.replace('_', "-"), lookup.replace(['_', '-'], "")]
            .iter()
            .find_map(|candidate| Encoding::for_label(candidate.as_bytes()))
            .filter(|encoding| *encoding != encoding_rs::REPLACEMENT)
            .map(|encoding| TextEncoding {
                encoding,
                bom_aware,
            })
            .ok_or_else(|| ChunkifyError::UnsupportedEncoding {
                label: label.to_string(),
            })
    }

    /// The `encoding_rs` codec behind this encoding.
    pub fn encoding(self) -> &'static Encoding {
        self.encoding
    }

    /// Whether a leading byte-order mark picks the codec and is dropped.
    pub fn is_bom_aware(self) -> bool {
        self.bom_aware
    }

    /// Canonical codec name, as used in error messages.
    pub fn label(self) -> &'static str {
        self.encoding.name()
    }
}

impl Default for TextEncoding {
    fn default() -> Self {
        TextEncoding {
            encoding: encoding_rs::UTF_8,
            bom_aware: false,
        }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TextEncoding {
    type Err = ChunkifyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::for_label(s)
    }
}

impl Serialize for TextEncoding {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for TextEncoding {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Self::for_label(&label).map_err(serde::de::Error::custom)
    }
}

// ── PDF conversion ───────────────────────────────────────────────────────

/// Configuration for PDF → Markdown conversion.
///
/// # Example
/// ```rust
/// use edgequake_chunkify::{PageSelection, ParseConfig};
///
/// let config = ParseConfig::builder()
///     .pages(PageSelection::Range(1, 10))
///     .max_heading_levels(3)
///     .build()
///     .unwrap();
/// assert_eq!(config.max_heading_levels, 3);
/// ```
#[derive(Debug, Clone)]
pub struct ParseConfig {
    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Page selection. Default: all pages.
    pub pages: PageSelection,

    /// Separator between pages in the assembled Markdown. Default: blank line.
    pub page_separator: PageSeparator,

    /// How many distinct heading sizes become `#`..`######`. Range 1–6. Default: 4.
    ///
    /// Only four levels feed the parent hierarchy, so deeper levels are
    /// rarely worth detecting.
    pub max_heading_levels: usize,

    /// Minimum ratio of a line's font size to the body size for it to count
    /// as a heading. Default: 1.15.
    pub heading_size_ratio: f32,

    /// Lines longer than this are body text even at a heading size. Default: 120.
    ///
    /// Large-font paragraphs (pull quotes, title pages) would otherwise turn
    /// into absurd headers.
    pub max_heading_chars: usize,

    /// Directory to persist `<pdf stem>.md` into. Default: none.
    pub destination: Option<PathBuf>,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,
}

impl Default for ParseConfig {
    fn default() -> Self {
        Self {
            password: None,
            pages: PageSelection::default(),
            page_separator: PageSeparator::default(),
            max_heading_levels: 4,
            heading_size_ratio: 1.15,
            max_heading_chars: 120,
            destination: None,
            download_timeout_secs: 120,
        }
    }
}

impl ParseConfig {
    pub fn builder() -> ParseConfigBuilder {
        ParseConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ParseConfig`].
#[derive(Debug)]
pub struct ParseConfigBuilder {
    config: ParseConfig,
}

impl ParseConfigBuilder {
    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn pages(mut self, selection: PageSelection) -> Self {
        self.config.pages = selection;
        self
    }

    pub fn page_separator(mut self, sep: PageSeparator) -> Self {
        self.config.page_separator = sep;
        self
    }

    pub fn max_heading_levels(mut self, n: usize) -> Self {
        self.config.max_heading_levels = n;
        self
    }

    pub fn heading_size_ratio(mut self, ratio: f32) -> Self {
        self.config.heading_size_ratio = ratio;
        self
    }

    pub fn max_heading_chars(mut self, n: usize) -> Self {
        self.config.max_heading_chars = n;
        self
    }

    pub fn destination(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.destination = Some(dir.into());
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ParseConfig, ChunkifyError> {
        let c = &self.config;
        if !(1..=6).contains(&c.max_heading_levels) {
            return Err(ChunkifyError::InvalidConfig(format!(
                "max_heading_levels must be 1–6, got {}",
                c.max_heading_levels
            )));
        }
        if !(c.heading_size_ratio.is_finite() && c.heading_size_ratio > 1.0) {
            return Err(ChunkifyError::InvalidConfig(format!(
                "heading_size_ratio must be > 1.0, got {}",
                c.heading_size_ratio
            )));
        }
        if c.max_heading_chars == 0 {
            return Err(ChunkifyError::InvalidConfig(
                "max_heading_chars must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}

/// Specifies which pages of the PDF to convert.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageSelection {
    /// Every page (default).
    #[default]
    All,
    /// A single page (1-indexed).
    Single(usize),
    /// A contiguous range (1-indexed, inclusive).
    Range(usize, usize),
    /// Specific pages (1-indexed, deduplicated).
    Set(Vec<usize>),
}

impl PageSelection {
    /// Sorted, deduplicated 0-indexed pages that exist in a `total_pages` document.
    pub fn to_indices(&self, total_pages: usize) -> Vec<usize> {
        let in_range = |p: &usize| (1..=total_pages).contains(p);
        let mut indices: Vec<usize> = match self {
            PageSelection::All => (0..total_pages).collect(),
            PageSelection::Single(p) => in_range(p).then(|| p - 1).into_iter().collect(),
            PageSelection::Range(start, end) => {
                ((*start).max(1) - 1..(*end).min(total_pages)).collect()
            }
            PageSelection::Set(pages) => pages.iter().filter(|p| in_range(p)).map(|p| p - 1).collect(),
        };
        indices.sort_unstable();
        indices.dedup();
        indices
    }
}

impl FromStr for PageSelection {
    type Err = ChunkifyError;

    /// Parses `all`, `5`, `3-15`, or `1,3,5`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        let page = |p: &str| -> Result<usize, ChunkifyError> {
            match p.trim().parse::<usize>() {
                Ok(n) if n >= 1 => Ok(n),
                Ok(_) => Err(ChunkifyError::InvalidConfig(
                    "pages are 1-indexed, minimum is 1".into(),
                )),
                Err(_) => Err(ChunkifyError::InvalidConfig(format!(
                    "invalid page number '{}'",
                    p.trim()
                ))),
            }
        };

        if s == "all" {
            return Ok(PageSelection::All);
        }
        if let Some((start, end)) = s.split_once('-') {
            let (start, end) = (page(start)?, page(end)?);
            if start > end {
                return Err(ChunkifyError::InvalidConfig(format!(
                    "invalid page range '{start}-{end}': start must be <= end"
                )));
            }
            return Ok(PageSelection::Range(start, end));
        }
        if s.contains(',') {
            let pages = s.split(',').map(page).collect::<Result<Vec<_>, _>>()?;
            return Ok(PageSelection::Set(pages));
        }
        Ok(PageSelection::Single(page(&s)?))
    }
}

/// How to separate pages in the assembled Markdown.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageSeparator {
    /// Blank line only. (default)
    #[default]
    None,
    /// Horizontal rule: `---`.
    HorizontalRule,
    /// HTML comment with page number: `<!-- page N -->`.
    Comment,
    /// Custom string inserted between pages.
    Custom(String),
}

impl PageSeparator {
    /// Separator placed before page `page_num` (1-indexed).
    pub fn render(&self, page_num: usize) -> String {
        match self {
            PageSeparator::None => "\n\n".to_string(),
            PageSeparator::HorizontalRule => "\n\n---\n\n".to_string(),
            PageSeparator::Comment => format!("\n\n<!-- page {} -->\n\n", page_num),
            PageSeparator::Custom(s) => format!("\n\n{}\n\n", s),
        }
    }
}

impl From<&str> for PageSeparator {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "none" => PageSeparator::None,
            "hr" | "---" => PageSeparator::HorizontalRule,
            "comment" => PageSeparator::Comment,
            _ => PageSeparator::Custom(s.to_string()),
        }
    }
}

// ── Retry policy ─────────────────────────────────────────────────────────

/// Retry policy for the normalisation call.
///
/// Waits are "full jitter" exponential: after failed attempt `n` (1-based)
/// the normaliser sleeps a uniformly random duration in
/// `[0, min(multiplier · 2^(n-1), max_wait)]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts, first call included. Must be ≥ 1. Default: 3.
    pub attempts: u32,
    /// Backoff multiplier in milliseconds. Must be > 0. Default: 1000.
    pub multiplier_ms: u64,
    /// Upper bound on any single wait in milliseconds. Must be > 0. Default: 10 000.
    pub max_wait_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            attempts: 3,
            multiplier_ms: 1000,
            max_wait_ms: 10_000,
        }
    }
}

impl RetryConfig {
    pub fn validate(&self) -> Result<(), ChunkifyError> {
        if self.attempts == 0 {
            return Err(ChunkifyError::InvalidConfig("retry attempts must be ≥ 1".into()));
        }
        if self.multiplier_ms == 0 || self.max_wait_ms == 0 {
            return Err(ChunkifyError::InvalidConfig(
                "retry multiplier and max wait must be > 0".into(),
            ));
        }
        Ok(())
    }

    /// Largest wait allowed after failed attempt `attempt` (1-based).
    pub fn backoff_ceiling(&self, attempt: u32) -> Duration {
        let exp = 2u64.saturating_pow(attempt.saturating_sub(1));
        Duration::from_millis(self.multiplier_ms.saturating_mul(exp).min(self.max_wait_ms))
    }
}

// ── Normalisation ────────────────────────────────────────────────────────

/// Configuration for the optional per-section LLM rewrite.
#[derive(Clone)]
pub struct NormalizerConfig {
    /// Model identifier. If None, `EDGEQUAKE_MODEL` or `gemini-2.0-flash`.
    pub model: Option<String>,

    /// Provider name (e.g. "gemini", "openai", "ollama").
    /// If None along with `provider`, the provider is auto-detected.
    pub provider_name: Option<String>,

    /// Pre-constructed provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature. Default: 0.0; the rewrite should be literal.
    pub temperature: f32,

    /// Maximum tokens the model may generate per section. Default: 4096.
    pub max_tokens: usize,

    /// Prompt template override; must contain `{section_content}`.
    pub instructions: Option<String>,

    /// Retry policy around each call.
    pub retry: RetryConfig,

    /// Sections normalised at once. Default: 1 (sequential).
    pub concurrency: usize,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            model: None,
            provider_name: None,
            provider: None,
            temperature: 0.0,
            max_tokens: 4096,
            instructions: None,
            retry: RetryConfig::default(),
            concurrency: 1,
        }
    }
}

impl fmt::Debug for NormalizerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NormalizerConfig")
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("instructions", &self.instructions.as_ref().map(|s| s.len()))
            .field("retry", &self.retry)
            .field("concurrency", &self.concurrency)
            .finish()
    }
}

impl NormalizerConfig {
    pub fn builder() -> NormalizerConfigBuilder {
        NormalizerConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`NormalizerConfig`].
#[derive(Debug)]
pub struct NormalizerConfigBuilder {
    config: NormalizerConfig,
}

impl NormalizerConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn instructions(mut self, template: impl Into<String>) -> Self {
        self.config.instructions = Some(template.into());
        self
    }

    pub fn retry(mut self, retry: RetryConfig) -> Self {
        self.config.retry = retry;
        self
    }

    pub fn attempts(mut self, n: u32) -> Self {
        self.config.retry.attempts = n;
        self
    }

    pub fn max_wait_ms(mut self, ms: u64) -> Self {
        self.config.retry.max_wait_ms = ms;
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<NormalizerConfig, ChunkifyError> {
        self.config.retry.validate()?;
        if let Some(ref t) = self.config.instructions {
            if !t.contains(crate::prompts::SECTION_PLACEHOLDER) {
                return Err(ChunkifyError::InvalidConfig(format!(
                    "instructions template must contain {}",
                    crate::prompts::SECTION_PLACEHOLDER
                )));
            }
        }
        Ok(self.config)
    }
}

// ── End-to-end pipeline ──────────────────────────────────────────────────

/// Configuration for [`crate::chunkify`].
#[derive(Clone, Default)]
pub struct ChunkifyConfig {
    pub parse: ParseConfig,

    /// Encoding for Markdown inputs read from disk. Default: UTF-8.
    pub encoding: TextEncoding,

    /// Normalise every section when set. Default: off.
    pub normalize: Option<NormalizerConfig>,

    /// Receives per-section normalisation events.
    pub progress_callback: Option<ProgressCallback>,
}

impl fmt::Debug for ChunkifyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChunkifyConfig")
            .field("parse", &self.parse)
            .field("encoding", &self.encoding)
            .field("normalize", &self.normalize)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn NormalizeProgressCallback>"),
            )
            .finish()
    }
}

impl ChunkifyConfig {
    pub fn builder() -> ChunkifyConfigBuilder {
        ChunkifyConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ChunkifyConfig`].
#[derive(Default)]
pub struct ChunkifyConfigBuilder {
    config: ChunkifyConfig,
}

impl ChunkifyConfigBuilder {
    pub fn parse(mut self, parse: ParseConfig) -> Self {
        self.config.parse = parse;
        self
    }

    pub fn encoding(mut self, encoding: TextEncoding) -> Self {
        self.config.encoding = encoding;
        self
    }

    pub fn normalize(mut self, normalizer: NormalizerConfig) -> Self {
        self.config.normalize = Some(normalizer);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    pub fn build(self) -> Result<ChunkifyConfig, ChunkifyError> {
        if let Some(ref n) = self.config.normalize {
            n.retry.validate()?;
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoding_labels_resolve_through_encoding_rs() {
        let name = |l: &str| l.parse::<TextEncoding>().unwrap().label();
        assert_eq!(name("UTF-8"), "UTF-8");
        assert_eq!(name("utf8"), "UTF-8");
        assert_eq!(name("utf_8"), "UTF-8");
        assert_eq!(name("latin-1"), "windows-1252");
        assert_eq!(name("ISO_8859-1"), "windows-1252");
        assert_eq!(name("cp1252"), "windows-1252");
        assert_eq!(name("us-ascii"), "windows-1252");
        assert_eq!(name("shift_jis"), "Shift_JIS");
        assert_eq!(name("gb18030"), "gb18030");
        assert_eq!(name("utf-16"), "UTF-16LE");
        assert_eq!(TextEncoding::default().to_string(), "UTF-8");
        assert_eq!(DEFAULT_ENCODING.parse::<TextEncoding>().unwrap(), TextEncoding::default());
    }

    #[test]
    fn bom_aware_labels() {
        assert!("utf-8-sig".parse::<TextEncoding>().unwrap().is_bom_aware());
        assert!("utf-16".parse::<TextEncoding>().unwrap().is_bom_aware());
        assert!(!"utf-16le".parse::<TextEncoding>().unwrap().is_bom_aware());
        assert!(!"utf-8".parse::<TextEncoding>().unwrap().is_bom_aware());
    }

    #[test]
    fn unknown_encoding_labels_are_rejected() {
        for label in ["ebcdic-klingon", "", "iso-2022-kr"] {
            assert!(
                matches!(
                    label.parse::<TextEncoding>(),
                    Err(ChunkifyError::UnsupportedEncoding { .. })
                ),
                "{label}"
            );
        }
    }

    #[test]
    fn encoding_serialises_as_label() {
        let enc: TextEncoding = serde_json::from_str("\"windows-1252\"").unwrap();
        assert_eq!(serde_json::to_string(&enc).unwrap(), "\"windows-1252\"");
        assert!(serde_json::from_str::<TextEncoding>("\"nope\"").is_err());
    }

    #[test]
    fn page_selection_to_indices() {
        assert_eq!(PageSelection::All.to_indices(3), vec![0, 1, 2]);
        assert_eq!(PageSelection::Single(3).to_indices(5), vec![2]);
        assert_eq!(PageSelection::Single(6).to_indices(5), Vec::<usize>::new());
        assert_eq!(PageSelection::Range(2, 4).to_indices(5), vec![1, 2, 3]);
        assert_eq!(PageSelection::Range(3, 10).to_indices(4), vec![2, 3]);
        assert_eq!(PageSelection::Set(vec![3, 1, 3]).to_indices(5), vec![0, 2]);
    }

    #[test]
    fn page_selection_parsing() {
        assert_eq!("all".parse::<PageSelection>().unwrap(), PageSelection::All);
        assert_eq!("5".parse::<PageSelection>().unwrap(), PageSelection::Single(5));
        assert_eq!(
            " 3-15 ".parse::<PageSelection>().unwrap(),
            PageSelection::Range(3, 15)
        );
        assert_eq!(
            "1,3,5".parse::<PageSelection>().unwrap(),
            PageSelection::Set(vec![1, 3, 5])
        );
        assert!("0".parse::<PageSelection>().is_err());
        assert!("9-2".parse::<PageSelection>().is_err());
        assert!("x".parse::<PageSelection>().is_err());
    }

    #[test]
    fn separator_from_str() {
        assert_eq!(PageSeparator::from("hr"), PageSeparator::HorizontalRule);
        assert_eq!(PageSeparator::from("COMMENT"), PageSeparator::Comment);
        assert_eq!(
            PageSeparator::from("* * *"),
            PageSeparator::Custom("* * *".into())
        );
        assert_eq!(PageSeparator::Comment.render(4), "\n\n<!-- page 4 -->\n\n");
    }

    #[test]
    fn parse_config_validation() {
        assert!(ParseConfig::builder().build().is_ok());
        assert!(ParseConfig::builder().max_heading_levels(0).build().is_err());
        assert!(ParseConfig::builder().max_heading_levels(7).build().is_err());
        assert!(ParseConfig::builder().heading_size_ratio(1.0).build().is_err());
        assert!(ParseConfig::builder().max_heading_chars(0).build().is_err());
    }

    #[test]
    fn retry_defaults_and_ceiling() {
        let r = RetryConfig::default();
        assert_eq!(r.attempts, 3);
        assert_eq!(r.backoff_ceiling(1), Duration::from_millis(1000));
        assert_eq!(r.backoff_ceiling(2), Duration::from_millis(2000));
        assert_eq!(r.backoff_ceiling(4), Duration::from_millis(8000));
        assert_eq!(r.backoff_ceiling(5), Duration::from_millis(10_000));
        assert_eq!(r.backoff_ceiling(200), Duration::from_millis(10_000));
    }

    #[test]
    fn retry_validation() {
        let bad = RetryConfig {
            attempts: 0,
            ..Default::default()
        };
        assert!(bad.validate().is_err());
        assert!(NormalizerConfig::builder().attempts(0).build().is_err());
        assert!(NormalizerConfig::builder().max_wait_ms(0).build().is_err());
    }

    #[test]
    fn instructions_must_have_placeholder() {
        assert!(NormalizerConfig::builder()
            .instructions("rewrite this")
            .build()
            .is_err());
        assert!(NormalizerConfig::builder()
            .instructions("rewrite: {section_content}")
            .build()
            .is_ok());
    }

    #[test]
    fn normalizer_debug_hides_provider() {
        let dbg = format!("{:?}", NormalizerConfig::default());
        assert!(dbg.contains("NormalizerConfig"));
        assert!(dbg.contains("concurrency: 1"));
    }
}
