//! Post-processing: deterministic cleanup of Markdown assembled from PDF text.
//!
//! pdfium hands back text as it was laid out for print: typographic
//! ligatures, soft hyphens, words split across line ends, Windows line
//! endings, runs of empty lines where images used to be. These rules undo
//! that without touching content.
//!
//! ## Rule Order
//!
//! Line endings are normalised first so every later rule can assume `\n`.
//! Dehyphenation runs before whitespace trimming because it needs to see
//! the hyphen at the very end of the line, and heading spacing runs after
//! blank-line collapsing so it never re-introduces long gaps.

use once_cell::sync::Lazy;
use regex::Regex;

/// Apply all post-processing rules to assembled Markdown.
///
/// Rules (applied in order):
/// 1. Normalise line endings (CRLF / CR → LF)
/// 2. Strip invisible Unicode (zero-width spaces, BOM, soft hyphens, etc.)
/// 3. Expand typographic ligatures (`ﬁ` → `fi`, …)
/// 4. Re-join words hyphenated across a line break
/// 5. Trim trailing whitespace per line
/// 6. Collapse runs of blank lines down to one
/// 7. Ensure heading lines are surrounded by blank lines
/// 8. Ensure the text ends with exactly one newline
pub fn clean_markdown(input: &str) -> String {
    let s = normalise_line_endings(input);
    let s = remove_invisible_chars(&s);
    let s = expand_ligatures(&s);
    let s = dehyphenate(&s);
    let s = trim_trailing_whitespace(&s);
    let s = collapse_blank_lines(&s);
    let s = normalise_heading_spacing(&s);
    ensure_final_newline(&s)
}

// ── Rule 1: Normalise line endings ───────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 2: Remove invisible Unicode characters ─────────────────────────────

fn remove_invisible_chars(input: &str) -> String {
    input.replace(
        [
            '\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{200C}', '\u{200D}', '\u{2060}', '\u{FFFE}',
        ],
        "",
    )
}

// ── Rule 3: Expand ligatures ─────────────────────────────────────────────────

const LIGATURES: [(char, &str); 7] = [
    ('\u{FB00}', "ff"),
    ('\u{FB01}', "fi"),
    ('\u{FB02}', "fl"),
    ('\u{FB03}', "ffi"),
    ('\u{FB04}', "ffl"),
    ('\u{FB05}', "st"),
    ('\u{FB06}', "st"),
];

fn expand_ligatures(input: &str) -> String {
    if !input.chars().any(|c| ('\u{FB00}'..='\u{FB06}').contains(&c)) {
        return input.to_string();
    }
    let mut out = String::with_capacity(input.len() + 16);
    for c in input.chars() {
        match LIGATURES.iter().find(|(lig, _)| *lig == c) {
            Some((_, expanded)) => out.push_str(expanded),
            None => out.push(c),
        }
    }
    out
}

// ── Rule 4: Dehyphenate ──────────────────────────────────────────────────────
//
// Only lower-case on both sides: "Jean-\nPaul" and "2019-\n2020" keep their
// hyphen and line break.

static RE_HYPHEN_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\p{Ll})-[ \t]*\n[ \t]*(\p{Ll})").unwrap());

fn dehyphenate(input: &str) -> String {
    RE_HYPHEN_BREAK.replace_all(input, "$1$2").to_string()
}

// ── Rule 5: Trim trailing whitespace per line ────────────────────────────────

static RE_TRAILING_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)[ \t]+$").unwrap());

fn trim_trailing_whitespace(input: &str) -> String {
    RE_TRAILING_WS.replace_all(input, "").into_owned()
}

// ── Rule 6: Collapse excessive blank lines ───────────────────────────────────

static RE_BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

fn collapse_blank_lines(input: &str) -> String {
    RE_BLANK_LINES.replace_all(input, "\n\n").into_owned()
}

// ── Rule 7: Blank line around headings ───────────────────────────────────────

static RE_HEADING_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^#{1,6}[ \t]+\S").unwrap());

fn normalise_heading_spacing(input: &str) -> String {
    let mut lines: Vec<&str> = Vec::new();
    let mut prev_heading = false;
    for line in input.lines() {
        let heading = RE_HEADING_LINE.is_match(line);
        let needs_gap = heading || (prev_heading && !line.is_empty());
        if needs_gap && lines.last().is_some_and(|l| !l.is_empty()) {
            lines.push("");
        }
        lines.push(line);
        prev_heading = heading;
    }
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

// ── Rule 8: Exactly one trailing newline ─────────────────────────────────────

fn ensure_final_newline(input: &str) -> String {
    let mut out = input.trim_end().to_string();
    out.push('\n');
    out
}
