//! Prompts for section normalisation.
//!
//! Keeping the prompt text here means the retry and parsing logic in
//! [`crate::pipeline::normalize`] never changes when the wording does, and
//! tests can inspect the template without a model.
//!
//! Callers can replace the template via
//! [`crate::config::NormalizerConfigBuilder::instructions`]; a replacement
//! must contain [`SECTION_PLACEHOLDER`].

/// Marker replaced by the section's Markdown.
pub const SECTION_PLACEHOLDER: &str = "{section_content}";

/// System message sent ahead of every normalisation request.
pub const NORMALIZE_SYSTEM_PROMPT: &str = "You rewrite Markdown sections and answer with a single JSON object. \
Never add commentary, never wrap the object in code fences.";

/// Default template: replace non-ASCII characters with ASCII equivalents.
pub const UNICODE_REPLACE_PROMPT: &str = r##"Rewrite the Markdown section below so that it contains only ASCII characters.

Rules:
1. Replace every non-ASCII character with its closest ASCII equivalent:
   - accented letters lose their accent (é → e, ß → ss, Ø → O)
   - typographic quotes become straight quotes, dashes become "-", ellipsis becomes "..."
   - ligatures are expanded (ﬁ → fi)
   - symbols with a common spelling are spelled out (© → (c), ™ → (TM), → → ->)
   - Greek letters and math symbols are written as their names (α → alpha, ≤ → <=)
2. Change nothing else: keep wording, punctuation, Markdown syntax, code blocks,
   links and line breaks exactly as they are.
3. The first line is the section header. Return it WITHOUT the leading "#" marks.

Answer with exactly this JSON object:
{"section_header": "<rewritten header>", "section_text": "<rewritten body>"}

Section:
"""
{section_content}
""""##;

/// Substitute `section_markdown` into `template`.
pub fn render_prompt(template: &str, section_markdown: &str) -> String {
    template.replace(SECTION_PLACEHOLDER, section_markdown)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_template_has_placeholder_once() {
        assert_eq!(UNICODE_REPLACE_PROMPT.matches(SECTION_PLACEHOLDER).count(), 1);
    }

    #[test]
    fn default_template_keeps_header_rule_and_tail() {
        assert!(UNICODE_REPLACE_PROMPT.contains("WITHOUT the leading \"#\" marks."));
        assert!(UNICODE_REPLACE_PROMPT.ends_with("{section_content}\n\"\"\""));
    }

    #[test]
    fn render_substitutes_section() {
        let out = render_prompt(UNICODE_REPLACE_PROMPT, "# Café\n\nnaïve");
        assert!(out.contains("\"\"\"\n# Café\n\nnaïve\n\"\"\""));
        assert!(!out.contains(SECTION_PLACEHOLDER));
    }

    #[test]
    fn custom_template() {
        assert_eq!(render_prompt("X {section_content} Y", "s"), "X s Y");
    }
}
