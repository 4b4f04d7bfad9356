//! Best-effort Markdown-to-plain-text reduction.
//!
//! Not a Markdown parser: an ordered list of regex substitutions that
//! strips the common syntax well enough to estimate size savings and
//! produce a `.txt` export. Rules run in a fixed order — code spans must
//! go before the emphasis-character sweep, and image syntax before link
//! syntax (an image is a link with a `!` prefix). Each rule is a pure
//! `&str -> String` function testable on its own.

use once_cell::sync::Lazy;
use regex::Regex;

type Rule = fn(&str) -> String;

/// The reduction pipeline, applied top to bottom
const RULES: &[(&str, Rule)] = &[
    ("strip code spans", strip_code_spans),
    ("strip block markers", strip_block_markers),
    ("replace images with alt text", replace_images),
    ("replace links with link text", replace_links),
    ("strip emphasis characters", strip_emphasis_chars),
    ("collapse horizontal whitespace", collapse_whitespace),
    ("trim", trim_outer),
];

/// Reduce Markdown to an approximate plain text. Lossy by design; never
/// fails, and empty input yields empty output.
pub fn strip_markdown(md: &str) -> String {
    RULES
        .iter()
        .fold(md.to_string(), |text, (_, rule)| rule(&text))
}

// ── Rule 1: code spans ──────────────────────────────────────────────────

static RE_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"`{1,3}[^`]*`{1,3}").unwrap());

fn strip_code_spans(input: &str) -> String {
    RE_CODE.replace_all(input, "").to_string()
}

// ── Rule 2: leading block markers ───────────────────────────────────────

static RE_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\s{0,3}(#+|\*|-|\+|>)\s*").unwrap());

fn strip_block_markers(input: &str) -> String {
    RE_BLOCK.replace_all(input, "").to_string()
}

// ── Rule 3: image syntax ────────────────────────────────────────────────

static RE_IMAGE: Lazy<Regex> = Lazy::new(|| Regex::new(r"!\[([^\]]*)\]\([^)]+\)").unwrap());

fn replace_images(input: &str) -> String {
    RE_IMAGE.replace_all(input, "$1").to_string()
}

// ── Rule 4: link syntax ─────────────────────────────────────────────────

static RE_LINK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[([^\]]+)\]\([^)]+\)").unwrap());

fn replace_links(input: &str) -> String {
    RE_LINK.replace_all(input, "$1").to_string()
}

// ── Rule 5: residual emphasis/structure characters ──────────────────────

static RE_EMPHASIS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[*_>#~`]").unwrap());

fn strip_emphasis_chars(input: &str) -> String {
    RE_EMPHASIS.replace_all(input, "").to_string()
}

// ── Rule 6: horizontal whitespace runs ──────────────────────────────────

static RE_HSPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]+").unwrap());

fn collapse_whitespace(input: &str) -> String {
    RE_HSPACE.replace_all(input, " ").to_string()
}

// ── Rule 7: outer whitespace ────────────────────────────────────────────

fn trim_outer(input: &str) -> String {
    input.trim().to_string()
}
