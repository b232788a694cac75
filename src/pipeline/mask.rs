//! Code-fence masking: hide `#` comment lines from the header scan.
//!
//! Inside a fenced code block a line such as `# install deps` is a shell or
//! Python comment, not a Markdown header. Before scanning for headers every
//! such line is swapped for an opaque token; after a section body has been
//! cut out of the masked text the tokens are swapped back.
//!
//! Tokens look like `{{CODE_COMMENT_7}}`. The counter runs across the whole
//! document, so each token maps to exactly one original line. If the input
//! already contains the token prefix, a numeric salt is added to the prefix
//! until it no longer occurs in the input.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use tracing::debug;

/// Opening fence with optional info string, then the body, then the closing fence.
static RE_CODE_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)(```[^\n]*\n)(.*?)```").unwrap());

const TOKEN_PREFIX: &str = "{{CODE_COMMENT_";
const TOKEN_SUFFIX: &str = "}}";

/// Masked document plus what is needed to undo the masking.
#[derive(Debug, Clone)]
pub struct MaskedText {
    /// Input with every code-block comment line replaced by a token.
    pub text: String,
    prefix: String,
    /// Original line for token `n` lives at index `n`.
    originals: Vec<String>,
}

impl MaskedText {
    /// Number of lines that were masked.
    pub fn masked_lines(&self) -> usize {
        self.originals.len()
    }

    /// Token standing in for masked line `index`.
    pub fn token(&self, index: usize) -> String {
        format!("{}{}{}", self.prefix, index, TOKEN_SUFFIX)
    }

    /// Original line behind masked line `index`, indentation included.
    pub fn original(&self, index: usize) -> Option<&str> {
        self.originals.get(index).map(String::as_str)
    }

    /// Replace every token in `fragment` with the line it stands for.
    ///
    /// Text that merely resembles a token but does not name a recorded line
    /// is left alone.
    pub fn unmask(&self, fragment: &str) -> String {
        if self.originals.is_empty() {
            return fragment.to_string();
        }

        let mut out = String::with_capacity(fragment.len());
        let mut rest = fragment;
        while let Some(pos) = rest.find(&self.prefix) {
            out.push_str(&rest[..pos]);
            let after = &rest[pos + self.prefix.len()..];
            let digits = after.bytes().take_while(u8::is_ascii_digit).count();
            let restored = after[digits..]
                .starts_with(TOKEN_SUFFIX)
                .then(|| after[..digits].parse::<usize>().ok())
                .flatten()
                .and_then(|idx| self.originals.get(idx));

            match restored {
                Some(line) => {
                    out.push_str(line);
                    rest = &after[digits + TOKEN_SUFFIX.len()..];
                }
                None => {
                    out.push_str(&self.prefix);
                    rest = after;
                }
            }
        }
        out.push_str(rest);
        out
    }
}

/// Replace `#`-prefixed lines inside fenced code blocks with unique tokens.
///
/// Fences, info strings, and every other line are kept byte-for-byte, so
/// `mask.unmask(&mask.text) == text` for any input.
pub fn mask_code_blocks(text: &str) -> MaskedText {
    let prefix = unused_prefix(text);
    let mut originals: Vec<String> = Vec::new();

    let masked = RE_CODE_FENCE.replace_all(text, |caps: &Captures<'_>| {
        let opening = &caps[1];
        let body = &caps[2];

        let lines: Vec<String> = body
            .split('\n')
            .map(|line| {
                if line.trim_start().starts_with('#') {
                    let token = format!("{}{}{}", prefix, originals.len(), TOKEN_SUFFIX);
                    originals.push(line.to_string());
                    token
                } else {
                    line.to_string()
                }
            })
            .collect();

        format!("{}{}```", opening, lines.join("\n"))
    });

    if !originals.is_empty() {
        debug!("Masked {} comment lines inside code blocks", originals.len());
    }

    MaskedText {
        text: masked.into_owned(),
        prefix,
        originals,
    }
}

/// Pick a token prefix that does not already occur in `text`.
fn unused_prefix(text: &str) -> String {
    if !text.contains(TOKEN_PREFIX) {
        return TOKEN_PREFIX.to_string();
    }
    (0u64..)
        .map(|salt| format!("{{{{CODE_COMMENT_{salt}_"))
        .find(|p| !text.contains(p.as_str()))
        .unwrap_or_else(|| TOKEN_PREFIX.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_comment_lines_only_inside_fences() {
        let input = "# Real header\n```python\n# comment\nx = 1\n```\n# Another";
        let m = mask_code_blocks(input);
        assert_eq!(m.masked_lines(), 1);
        assert_eq!(
            m.text,
            "# Real header\n```python\n{{CODE_COMMENT_0}}\nx = 1\n```\n# Another"
        );
        assert_eq!(m.original(0), Some("# comment"));
    }

    #[test]
    fn keeps_indentation_of_masked_line() {
        let input = "```sh\n    # indented comment\necho hi\n```";
        let m = mask_code_blocks(input);
        assert_eq!(m.original(0), Some("    # indented comment"));
        assert_eq!(m.unmask(&m.text), input);
    }

    #[test]
    fn counter_is_global_across_blocks() {
        let input = "```\n# a\n```\ntext\n```rust\n// b\n# c\n```";
        let m = mask_code_blocks(input);
        assert_eq!(m.masked_lines(), 2);
        assert!(m.text.contains("{{CODE_COMMENT_0}}"));
        assert!(m.text.contains("{{CODE_COMMENT_1}}"));
        assert_eq!(m.original(1), Some("# c"));
    }

    #[test]
    fn block_without_comments_is_unchanged() {
        let input = "```js\nconst a = 1;\n```\n";
        let m = mask_code_blocks(input);
        assert_eq!(m.masked_lines(), 0);
        assert_eq!(m.text, input);
    }

    #[test]
    fn unmask_round_trips_whole_document() {
        let input = "intro\n```\n# one\n  # two\n```\n## H\n```py\n#three\n```";
        let m = mask_code_blocks(input);
        assert_eq!(m.masked_lines(), 3);
        assert_eq!(m.unmask(&m.text), input);
    }

    #[test]
    fn token_like_text_in_input_gets_a_salted_prefix() {
        let input = "literal {{CODE_COMMENT_0}} here\n```\n# hidden\n```";
        let m = mask_code_blocks(input);
        assert!(m.text.contains("literal {{CODE_COMMENT_0}} here"));
        assert_eq!(m.token(0), "{{CODE_COMMENT_0_0}}");
        assert_eq!(m.unmask(&m.text), input);
    }

    #[test]
    fn unknown_token_index_is_left_alone() {
        let m = mask_code_blocks("```\n# x\n```");
        assert_eq!(m.unmask("{{CODE_COMMENT_9}}"), "{{CODE_COMMENT_9}}");
        assert_eq!(m.unmask("{{CODE_COMMENT_"), "{{CODE_COMMENT_");
    }

    #[test]
    fn unterminated_fence_is_not_masked() {
        let input = "```\n# not closed";
        let m = mask_code_blocks(input);
        assert_eq!(m.masked_lines(), 0);
        assert_eq!(m.text, input);
    }
}
