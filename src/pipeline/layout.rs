//! Heading inference: turn font-sized text lines into Markdown.
//!
//! PDF has no notion of "header"; it only knows glyphs and sizes. We treat
//! the size that carries most of the document's characters as body text and
//! rank every noticeably larger size as a heading level:
//!
//! ```text
//! size  chars   role
//! 24.0     40   # (level 1)
//! 16.0    210   ## (level 2)
//! 13.0    380   ### (level 3)
//! 11.0  18000   body
//!  9.0   1200   body (footnotes, captions)
//! ```
//!
//! The analysis is pure so it can be tested without pdfium.

use super::extract::{bucket_size, size_bucket, PageText, TextLine};
use crate::config::{PageSeparator, ParseConfig};
use std::collections::HashMap;
use tracing::debug;

/// Mapping from font size to heading level for one document.
#[derive(Debug, Clone, PartialEq)]
pub struct HeadingScale {
    pub body_size: f32,
    /// `(bucket, level)`, largest size first.
    levels: Vec<(u32, usize)>,
}

impl HeadingScale {
    /// Derive the scale from every line of the document.
    pub fn analyse(pages: &[PageText], config: &ParseConfig) -> Self {
        let mut votes: HashMap<u32, usize> = HashMap::new();
        for line in pages.iter().flat_map(|p| &p.lines) {
            if line.font_size > 0.0 {
                *votes.entry(size_bucket(line.font_size)).or_default() += line.weight;
            }
        }

        // ties go to the smaller size
        let body_bucket = votes
            .iter()
            .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(a.0)))
            .map(|(bucket, _)| *bucket)
            .unwrap_or(0);
        let body_size = bucket_size(body_bucket);

        let threshold = body_size * config.heading_size_ratio;
        let mut heading_buckets: Vec<u32> = votes
            .keys()
            .copied()
            .filter(|b| body_bucket > 0 && bucket_size(*b) >= threshold)
            .collect();
        heading_buckets.sort_unstable_by(|a, b| b.cmp(a));
        heading_buckets.truncate(config.max_heading_levels);

        let levels = heading_buckets
            .into_iter()
            .enumerate()
            .map(|(i, b)| (b, i + 1))
            .collect::<Vec<_>>();

        debug!("Body size {:.1}pt, heading sizes {:?}", body_size, levels);
        Self { body_size, levels }
    }

    /// Heading level for `line`, or None for body text.
    pub fn level_of(&self, line: &TextLine, max_chars: usize) -> Option<usize> {
        if line.text.chars().count() > max_chars {
            return None;
        }
        let bucket = size_bucket(line.font_size);
        self.levels
            .iter()
            .find(|(b, _)| *b == bucket)
            .map(|(_, level)| *level)
    }

    pub fn heading_levels(&self) -> usize {
        self.levels.len()
    }
}

/// Render extracted pages as Markdown with inferred headings.
pub fn pages_to_markdown(pages: &[PageText], config: &ParseConfig) -> String {
    let scale = HeadingScale::analyse(pages, config);
    let mut out = String::new();

    for (i, page) in pages.iter().enumerate() {
        if i > 0 {
            out.push_str(&config.page_separator.render(page.index + 1));
        } else if let PageSeparator::Comment = config.page_separator {
            out.push_str(config.page_separator.render(page.index + 1).trim_start());
        }
        out.push_str(&page_to_markdown(page, &scale, config.max_heading_chars));
    }

    out
}

fn page_to_markdown(page: &PageText, scale: &HeadingScale, max_chars: usize) -> String {
    let mut blocks: Vec<String> = Vec::new();
    let mut paragraph: Vec<String> = Vec::new();
    let mut pending_heading: Option<(usize, String)> = None;

    let flush_heading = |pending: &mut Option<(usize, String)>, blocks: &mut Vec<String>| {
        if let Some((level, text)) = pending.take() {
            blocks.push(format!("{} {}", "#".repeat(level), text));
        }
    };

    for line in &page.lines {
        match scale.level_of(line, max_chars) {
            Some(level) => {
                if !paragraph.is_empty() {
                    blocks.push(paragraph.join("\n"));
                    paragraph.clear();
                }
                // A title wrapped over two lines stays one heading.
                match pending_heading.as_mut() {
                    Some((lvl, text)) if *lvl == level => {
                        text.push(' ');
                        text.push_str(&line.text);
                    }
                    _ => {
                        flush_heading(&mut pending_heading, &mut blocks);
                        pending_heading = Some((level, line.text.clone()));
                    }
                }
            }
            None => {
                flush_heading(&mut pending_heading, &mut blocks);
                paragraph.push(escape_body_line(&line.text));
            }
        }
    }
    flush_heading(&mut pending_heading, &mut blocks);
    if !paragraph.is_empty() {
        blocks.push(paragraph.join("\n"));
    }

    blocks.join("\n\n")
}

/// Body lines that begin with `#` would otherwise read as headers downstream.
fn escape_body_line(text: &str) -> String {
    if text.starts_with('#') {
        format!("\\{}", text)
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(index: usize, lines: &[(&str, f32)]) -> PageText {
        PageText {
            index,
            lines: lines.iter().map(|(t, s)| TextLine::new(*t, *s)).collect(),
        }
    }

    fn body(n: usize) -> String {
        "lorem ipsum dolor sit amet ".repeat(n).trim().to_string()
    }

    #[test]
    fn body_size_is_the_character_majority() {
        let b = body(4);
        let pages = vec![page(0, &[("Title", 24.0), (&b, 11.0), ("note", 9.0)])];
        let scale = HeadingScale::analyse(&pages, &ParseConfig::default());
        assert_eq!(scale.body_size, 11.0);
        assert_eq!(scale.heading_levels(), 1);
    }

    #[test]
    fn sizes_rank_into_levels() {
        let b = body(10);
        let pages = vec![page(
            0,
            &[
                ("Paper", 24.0),
                ("Intro", 16.0),
                (&b, 11.0),
                ("Detail", 13.0),
                (&b, 11.0),
            ],
        )];
        let md = pages_to_markdown(&pages, &ParseConfig::default());
        assert!(md.starts_with("# Paper\n\n## Intro\n\nlorem"), "got: {md}");
        assert!(md.contains("\n\n### Detail\n\n"), "got: {md}");
    }

    #[test]
    fn small_bumps_stay_body_text() {
        let b = body(5);
        // 11.5 / 11.0 < 1.15
        let pages = vec![page(0, &[("Slightly bigger", 11.5), (&b, 11.0)])];
        let md = pages_to_markdown(&pages, &ParseConfig::default());
        assert!(!md.contains('#'), "got: {md}");
    }

    #[test]
    fn level_count_is_capped() {
        let b = body(10);
        let config = ParseConfig::builder().max_heading_levels(2).build().unwrap();
        let pages = vec![page(
            0,
            &[("A", 30.0), ("B", 20.0), ("C", 15.0), (&b, 10.0)],
        )];
        let md = pages_to_markdown(&pages, &config);
        assert!(md.contains("# A"));
        assert!(md.contains("## B"));
        assert!(md.contains("\n\nC\n"), "got: {md}");
    }

    #[test]
    fn long_large_lines_are_not_headings() {
        let b = body(10);
        let quote = "x".repeat(200);
        let pages = vec![page(0, &[(&quote, 20.0), ("Short", 20.0), (&b, 10.0)])];
        let md = pages_to_markdown(&pages, &ParseConfig::default());
        assert!(md.contains("# Short"));
        assert!(!md.contains(&format!("# {quote}")));
    }

    #[test]
    fn wrapped_title_merges() {
        let b = body(10);
        let pages = vec![page(
            0,
            &[("A Very Long", 20.0), ("Document Title", 20.0), (&b, 10.0)],
        )];
        let md = pages_to_markdown(&pages, &ParseConfig::default());
        assert!(md.starts_with("# A Very Long Document Title\n\n"), "got: {md}");
    }

    #[test]
    fn hash_in_body_is_escaped() {
        let b = body(10);
        let pages = vec![page(0, &[(&b, 10.0), ("#hashtag line", 10.0)])];
        let md = pages_to_markdown(&pages, &ParseConfig::default());
        assert!(md.contains("\n\\#hashtag line"));
    }

    #[test]
    fn pages_are_separated() {
        let config = ParseConfig::builder()
            .page_separator(PageSeparator::HorizontalRule)
            .build()
            .unwrap();
        let pages = vec![page(0, &[("one", 10.0)]), page(1, &[("two", 10.0)])];
        assert_eq!(pages_to_markdown(&pages, &config), "one\n\n---\n\ntwo");
    }

    #[test]
    fn comment_separator_marks_first_page_too() {
        let config = ParseConfig::builder()
            .page_separator(PageSeparator::Comment)
            .build()
            .unwrap();
        let pages = vec![page(2, &[("three", 10.0)]), page(4, &[("five", 10.0)])];
        assert_eq!(
            pages_to_markdown(&pages, &config),
            "<!-- page 3 -->\n\nthree\n\n<!-- page 5 -->\n\nfive"
        );
    }

    #[test]
    fn no_text_gives_empty_markdown() {
        let pages = vec![page(0, &[])];
        assert_eq!(pages_to_markdown(&pages, &ParseConfig::default()), "");
    }
}
