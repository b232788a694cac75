//! Section normalisation: rewrite one section through a text-generation call.
//!
//! The model receives the section rendered as Markdown inside a prompt and
//! must answer with `{"section_header": …, "section_text": …}`. Anything
//! else (transport failure, non-JSON, missing field) counts as a failed
//! attempt.
//!
//! ## Retry Strategy
//!
//! An explicit loop with a fixed attempt budget. After failed attempt `n`
//! the loop sleeps a uniformly random duration in
//! `[0, min(multiplier · 2^(n-1), max_wait)]` ("full jitter"), so concurrent
//! sections hitting the same rate limit spread out instead of retrying in
//! lockstep.
//!
//! ## Failure Semantics
//!
//! Normalisation never fails past this module. When every attempt fails the
//! caller gets the original section back with `metadata.error` set, plus the
//! last raw model output when there was one.

use crate::config::RetryConfig;
use crate::error::NormalizeError;
use crate::progress::ProgressCallback;
use crate::prompts::{render_prompt, NORMALIZE_SYSTEM_PROMPT, UNICODE_REPLACE_PROMPT};
use crate::section::Section;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider};
use futures::stream::{self, StreamExt};
use rand::Rng;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Raw output of one text-generation call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Generation {
    pub text: String,
    /// Tokens the model produced, when the backend reports it.
    pub completion_tokens: Option<usize>,
    pub model: Option<String>,
}

/// Anything that turns a prompt into text.
pub trait TextGenerator: Send + Sync {
    fn generate<'a>(
        &'a self,
        prompt: &'a str,
    ) -> impl Future<Output = Result<Generation, NormalizeError>> + Send + 'a;
}

/// [`TextGenerator`] backed by an edgequake-llm chat provider.
pub struct LlmGenerator {
    provider: Arc<dyn LLMProvider>,
    model: String,
    options: CompletionOptions,
}

impl LlmGenerator {
    pub fn new(provider: Arc<dyn LLMProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            options: CompletionOptions {
                temperature: Some(0.0),
                max_tokens: Some(4096),
                ..Default::default()
            },
        }
    }

    pub fn with_options(mut self, temperature: f32, max_tokens: usize) -> Self {
        self.options.temperature = Some(temperature);
        self.options.max_tokens = Some(max_tokens);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

impl TextGenerator for LlmGenerator {
    fn generate<'a>(
        &'a self,
        prompt: &'a str,
    ) -> impl Future<Output = Result<Generation, NormalizeError>> + Send + 'a {
        async move {
            let messages = vec![
                ChatMessage::system(NORMALIZE_SYSTEM_PROMPT),
                ChatMessage::user(prompt),
            ];
            let response = self
                .provider
                .chat(&messages, Some(&self.options))
                .await
                .map_err(|e| NormalizeError::Generation(e.to_string()))?;
            debug!(
                "{} prompt tokens, {} completion tokens",
                response.prompt_tokens, response.completion_tokens
            );
            Ok(Generation {
                text: response.content,
                completion_tokens: Some(response.completion_tokens as usize),
                model: Some(self.model.clone()),
            })
        }
    }
}

/// A normalised (or error-annotated) section and the calls it took.
#[derive(Debug, Clone)]
pub struct NormalizeReport {
    pub section: Section,
    pub attempts: u32,
}

impl NormalizeReport {
    pub fn is_normalized(&self) -> bool {
        self.section.metadata.normalized
    }
}

/// Transforms one section. Never fails: errors end up in the section metadata.
pub trait SectionNormalizer: Send + Sync {
    fn normalize_tracked<'a>(
        &'a self,
        section: &'a Section,
    ) -> impl Future<Output = NormalizeReport> + Send + 'a;

    fn normalize<'a>(&'a self, section: &'a Section) -> impl Future<Output = Section> + Send + 'a {
        async move { self.normalize_tracked(section).await.section }
    }
}

/// Asks the model to replace non-ASCII characters with ASCII equivalents.
pub struct UnicodeNormalizer<G> {
    generator: G,
    template: String,
    retry: RetryConfig,
}

impl<G: TextGenerator> UnicodeNormalizer<G> {
    pub fn new(generator: G) -> Self {
        Self {
            generator,
            template: UNICODE_REPLACE_PROMPT.to_string(),
            retry: RetryConfig::default(),
        }
    }

    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = template.into();
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    async fn attempt(&self, section: &Section, prompt: &str) -> Result<Section, Failure> {
        let generation = self.generator.generate(prompt).await.map_err(|error| Failure {
            error,
            raw: None,
        })?;
        let (header, text) = parse_response(&generation.text).map_err(|error| Failure {
            error,
            raw: Some(generation.text.clone()),
        })?;
        Ok(section.normalized(header, text, generation.completion_tokens, generation.model))
    }
}

struct Failure {
    error: NormalizeError,
    raw: Option<String>,
}

impl<G: TextGenerator> SectionNormalizer for UnicodeNormalizer<G> {
    fn normalize_tracked<'a>(
        &'a self,
        section: &'a Section,
    ) -> impl Future<Output = NormalizeReport> + Send + 'a {
        async move {
            let prompt = render_prompt(&self.template, &section.to_markdown());
            debug!(
                "Normalising '{}' ({} chars)",
                section.header,
                section.text.len()
            );

            let attempts = self.retry.attempts.max(1);
            let mut last_error = NormalizeError::Generation("no attempt made".into());
            let mut last_raw: Option<String> = None;

            for attempt in 1..=attempts {
                match self.attempt(section, &prompt).await {
                    Ok(normalized) => {
                        debug!("'{}' normalised on attempt {}", section.header, attempt);
                        return NormalizeReport {
                            section: normalized,
                            attempts: attempt,
                        };
                    }
                    Err(Failure { error, raw }) => {
                        warn!(
                            "'{}': attempt {}/{} failed: {}",
                            section.header, attempt, attempts, error
                        );
                        last_error = error;
                        if raw.is_some() {
                            last_raw = raw;
                        }
                    }
                }

                if attempt < attempts {
                    let wait = jittered(self.retry.backoff_ceiling(attempt));
                    debug!("Retrying '{}' in {:?}", section.header, wait);
                    tokio::time::sleep(wait).await;
                }
            }

            warn!(
                "Skipped '{}' after {} attempts: {}",
                section.header, attempts, last_error
            );
            NormalizeReport {
                section: section.with_error(last_error.to_string(), last_raw),
                attempts,
            }
        }
    }
}

/// Uniform random duration in `[0, ceiling]`.
fn jittered(ceiling: Duration) -> Duration {
    let max_ms = ceiling.as_millis() as u64;
    if max_ms == 0 {
        return Duration::ZERO;
    }
    Duration::from_millis(rand::thread_rng().gen_range(0..=max_ms))
}

/// Pull `(section_header, section_text)` out of a model response.
///
/// Accepts the object bare or wrapped in a ```json fence. Leading `#`
/// marks on the header are dropped.
pub fn parse_response(raw: &str) -> Result<(String, String), NormalizeError> {
    let body = strip_json_fence(raw.trim());
    let value: Value =
        serde_json::from_str(body).map_err(|e| NormalizeError::MalformedResponse(e.to_string()))?;
    let obj = value.as_object().ok_or_else(|| {
        NormalizeError::MalformedResponse("expected a JSON object".to_string())
    })?;

    let field = |name: &'static str| -> Result<String, NormalizeError> {
        match obj.get(name) {
            None | Some(Value::Null) => Err(NormalizeError::MissingField(name)),
            Some(Value::String(s)) => Ok(s.clone()),
            Some(other) => Err(NormalizeError::MalformedResponse(format!(
                "'{name}' should be a string, got {other}"
            ))),
        }
    };

    let header = field("section_header")?;
    let text = field("section_text")?;
    let header = header.trim().trim_start_matches('#').trim().to_string();
    Ok((header, text.trim().to_string()))
}

fn strip_json_fence(s: &str) -> &str {
    let Some(rest) = s.strip_prefix("```") else {
        return s;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    rest.trim()
}

/// Normalise every section, `concurrency` at a time, keeping document order.
pub async fn normalize_sections<N: SectionNormalizer>(
    normalizer: &N,
    sections: Vec<Section>,
    concurrency: usize,
    progress: Option<&ProgressCallback>,
) -> Vec<Section> {
    let total = sections.len();
    info!(
        "Normalising {} sections (concurrency {})",
        total,
        concurrency.max(1)
    );
    if let Some(cb) = progress {
        cb.on_normalize_start(total);
    }

    let reports: Vec<NormalizeReport> = stream::iter(sections.iter().enumerate().map(
        |(index, section)| async move {
            if let Some(cb) = progress {
                cb.on_section_start(index, total);
            }
            let report = normalizer.normalize_tracked(section).await;
            if let Some(cb) = progress {
                match report.section.metadata.error {
                    None => cb.on_section_complete(index, total, report.attempts),
                    Some(ref e) => cb.on_section_error(index, total, e),
                }
            }
            report
        },
    ))
    .buffered(concurrency.max(1))
    .collect()
    .await;

    let ok = reports.iter().filter(|r| r.is_normalized()).count();
    info!("Normalised {}/{} sections", ok, total);
    if let Some(cb) = progress {
        cb.on_normalize_complete(total, ok);
    }

    reports.into_iter().map(|r| r.section).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_object() {
        let (h, t) = parse_response(r#"{"section_header":"Cafe","section_text":"naive"}"#).unwrap();
        assert_eq!(h, "Cafe");
        assert_eq!(t, "naive");
    }

    #[test]
    fn parses_fenced_object_and_strips_header_marks() {
        let raw = "```json\n{\"section_header\": \"## Intro\", \"section_text\": \" body \"}\n```";
        let (h, t) = parse_response(raw).unwrap();
        assert_eq!(h, "Intro");
        assert_eq!(t, "body");
    }

    #[test]
    fn missing_and_null_fields() {
        assert_eq!(
            parse_response(r#"{"section_header":"x"}"#),
            Err(NormalizeError::MissingField("section_text"))
        );
        assert_eq!(
            parse_response(r#"{"section_header":null,"section_text":"x"}"#),
            Err(NormalizeError::MissingField("section_header"))
        );
    }

    #[test]
    fn malformed_responses() {
        assert!(matches!(
            parse_response("Sure! Here you go"),
            Err(NormalizeError::MalformedResponse(_))
        ));
        assert!(matches!(
            parse_response("[1, 2]"),
            Err(NormalizeError::MalformedResponse(_))
        ));
        assert!(matches!(
            parse_response(r#"{"section_header": 3, "section_text": "x"}"#),
            Err(NormalizeError::MalformedResponse(_))
        ));
    }

    #[test]
    fn jitter_stays_under_ceiling() {
        let ceiling = Duration::from_millis(50);
        for _ in 0..100 {
            assert!(jittered(ceiling) <= ceiling);
        }
        assert_eq!(jittered(Duration::ZERO), Duration::ZERO);
    }
}
