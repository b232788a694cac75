//! End-to-end integration tests for edgequake-chunkify.
//!
//! These tests use real PDF files in `./test_cases/`, need a pdfium library
//! and (for the normalisation tests) make live LLM API calls. They are gated
//! behind the `E2E_ENABLED` environment variable so they do not run in CI
//! unless explicitly requested.
//!
//! Run with:
//!   E2E_ENABLED=1 PDFIUM_LIB_PATH=. cargo test --test e2e -- --nocapture
//!
//! To restrict to a specific test:
//!   E2E_ENABLED=1 cargo test --test e2e test_split_arxiv -- --nocapture

use edgequake_chunkify::{
    chunkify, chunkify_to_file, ChunkifyConfig, ChunkifyError, NormalizerConfig, PageSelection,
    PageSeparator, ParseConfig, PdfiumParser, Section,
};
use std::path::PathBuf;

// ── Test helpers ─────────────────────────────────────────────────────────────

fn test_cases_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("test_cases")
}

fn output_dir() -> PathBuf {
    let d = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("test_cases/output");
    std::fs::create_dir_all(&d).ok();
    d
}

/// Skip this test if E2E_ENABLED is not set *or* no PDF file at `path`.
macro_rules! e2e_skip_unless_ready {
    ($path:expr) => {{
        if std::env::var("E2E_ENABLED").is_err() {
            println!("SKIP — set E2E_ENABLED=1 to run e2e tests");
            return;
        }
        let p: PathBuf = $path;
        if !p.exists() {
            println!("SKIP — test file not found: {}", p.display());
            println!("       Place sample PDFs under test_cases/");
            return;
        }
        p
    }};
}

/// Skip unless at least one LLM key is present.
macro_rules! skip_without_llm_key {
    () => {
        if ["GEMINI_API_KEY", "GOOGLE_API_KEY", "OPENAI_API_KEY", "ANTHROPIC_API_KEY"]
            .iter()
            .all(|k| std::env::var(k).is_err())
        {
            println!("SKIP — no LLM API key in environment");
            return;
        }
    };
}

/// Assert the converted Markdown passes basic quality checks.
fn assert_markdown_quality(md: &str, context: &str) {
    assert!(!md.trim().is_empty(), "[{context}] Markdown is empty");
    assert!(
        md.ends_with('\n'),
        "[{context}] Markdown must end with a newline"
    );
    assert!(
        !md.contains("\n\n\n"),
        "[{context}] Output has more than one consecutive blank line"
    );

    let invisible = ['\u{200B}', '\u{FEFF}', '\u{200C}', '\u{200D}', '\u{2060}'];
    for ch in invisible {
        assert!(
            !md.contains(ch),
            "[{context}] Output contains invisible char U+{:04X}",
            ch as u32
        );
    }

    println!("[{context}] ✓  {} bytes, quality checks passed", md.len());
}

/// Every section's parents must be headers that actually precede it at a
/// shallower level.
fn assert_outline_consistent(sections: &[Section], context: &str) {
    for (i, s) in sections.iter().enumerate() {
        assert!(s.level >= 1, "[{context}] section {i} has level 0");
        for (label, header) in s.parents().iter() {
            let depth: usize = label[1..].parse().unwrap();
            assert!(depth < s.level, "[{context}] {label} not shallower than h{}", s.level);
            assert!(
                sections[..i]
                    .iter()
                    .any(|p| p.level == depth && p.header == header),
                "[{context}] parent {label}={header:?} of '{}' never opened",
                s.header
            );
        }
    }
}

// ── Conversion + split (pdfium, no LLM) ──────────────────────────────────────

/// Split the first pages of the Attention paper.
#[tokio::test]
async fn test_split_arxiv_first_pages() {
    let path = e2e_skip_unless_ready!(test_cases_dir().join("attention_is_all_you_need.pdf"));

    let config = ChunkifyConfig::builder()
        .parse(
            ParseConfig::builder()
                .pages(PageSelection::Range(1, 3))
                .destination(output_dir())
                .build()
                .expect("valid config"),
        )
        .build()
        .expect("valid config");

    let output = chunkify(path.to_str().unwrap(), &config)
        .await
        .expect("chunkify should succeed");

    assert_eq!(output.stats.pages, 3);
    assert_markdown_quality(&output.markdown, "arxiv");
    assert!(
        output.markdown.to_lowercase().contains("attention"),
        "First pages should mention 'Attention'"
    );
    assert!(!output.sections.is_empty(), "Paper should have headings");
    assert_outline_consistent(&output.sections, "arxiv");

    let md_path = output.stats.markdown_path.expect("markdown persisted");
    assert_eq!(md_path.file_name().unwrap(), "attention_is_all_you_need.md");
    assert_eq!(std::fs::read_to_string(md_path).unwrap(), output.markdown);

    for s in &output.sections {
        println!("h{} {:<50} {:?}", s.level, s.header, s.parents());
    }
}

/// Page separators end up between pages.
#[tokio::test]
async fn test_parse_irs_form_with_separators() {
    let path = e2e_skip_unless_ready!(test_cases_dir().join("irs_form_1040.pdf"));

    let parser = PdfiumParser::new(
        ParseConfig::builder()
            .page_separator(PageSeparator::Comment)
            .build()
            .expect("valid config"),
    );
    let doc = parser
        .parse_document(path.to_str().unwrap())
        .await
        .expect("parse should succeed");

    assert_eq!(doc.pages, 2, "IRS form has 2 pages");
    assert!(doc.markdown.contains("<!-- page 1 -->"));
    assert!(doc.markdown.contains("<!-- page 2 -->"));
    assert_markdown_quality(&doc.markdown, "irs_form");
}

#[tokio::test]
async fn test_not_a_pdf_is_rejected() {
    if std::env::var("E2E_ENABLED").is_err() {
        println!("SKIP");
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let fake = dir.path().join("fake.pdf");
    std::fs::write(&fake, b"GIF89a not really").unwrap();

    let err = chunkify(fake.to_str().unwrap(), &ChunkifyConfig::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ChunkifyError::NotAPdf { .. }), "{err:?}");
}

#[tokio::test]
async fn test_nonexistent_pdf() {
    if std::env::var("E2E_ENABLED").is_err() {
        println!("SKIP");
        return;
    }
    let err = chunkify("/definitely/not/a/real/file.pdf", &ChunkifyConfig::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ChunkifyError::FileNotFound { .. }), "{err:?}");
}

// ── Normalisation (needs LLM API) ────────────────────────────────────────────

#[tokio::test]
async fn test_normalize_arxiv_first_page() {
    let path = e2e_skip_unless_ready!(test_cases_dir().join("attention_is_all_you_need.pdf"));
    skip_without_llm_key!();
    let out_path = output_dir().join("arxiv_sections.json");

    let config = ChunkifyConfig::builder()
        .parse(
            ParseConfig::builder()
                .pages(PageSelection::Single(1))
                .build()
                .expect("valid config"),
        )
        .normalize(
            NormalizerConfig::builder()
                .concurrency(4)
                .build()
                .expect("valid config"),
        )
        .build()
        .expect("valid config");

    let stats = chunkify_to_file(path.to_str().unwrap(), &out_path, &config)
        .await
        .expect("chunkify should succeed");

    println!("[arxiv] {:?}", stats);
    assert!(stats.section_count > 0);
    assert_eq!(
        stats.normalized_sections + stats.failed_sections,
        stats.section_count
    );

    let sections: Vec<Section> =
        serde_json::from_str(&std::fs::read_to_string(&out_path).unwrap()).unwrap();
    for s in sections.iter().filter(|s| s.metadata.normalized) {
        assert!(s.header.is_ascii(), "non-ASCII header left: {:?}", s.header);
        assert!(s.metadata.original_content.is_some());
    }
}

#[tokio::test]
async fn test_normalize_markdown_with_unicode() {
    if std::env::var("E2E_ENABLED").is_err() {
        println!("SKIP");
        return;
    }
    skip_without_llm_key!();

    let dir = tempfile::tempdir().unwrap();
    let md = dir.path().join("notes.md");
    std::fs::write(
        &md,
        "# Résumé\nCafé — “naïve” façade.\n## Ünits\n5 µm ± 0.2 µm\n",
    )
    .unwrap();

    let config = ChunkifyConfig::builder()
        .normalize(NormalizerConfig::default())
        .build()
        .expect("valid config");
    let output = chunkify(md.to_str().unwrap(), &config)
        .await
        .expect("chunkify should succeed");

    assert_eq!(output.sections.len(), 2);
    assert_eq!(output.sections[1].parents().len(), 1);
    for s in &output.sections {
        println!("{s}");
        if s.metadata.normalized {
            assert!(s.text.is_ascii(), "non-ASCII text left: {:?}", s.text);
        }
    }
}
