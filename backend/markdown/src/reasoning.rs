//! Reasoning-to-answer extraction.
//!
//! Some model configurations leave the direct answer empty and put a chain of
//! thought on a separate reasoning channel. This digs a short final answer out
//! of that text. It is a best-effort heuristic: precision is traded for
//! availability, and the vocabulary below is hand-tuned for extinguisher tags.

use std::sync::LazyLock;

use regex::Regex;
use tagscan_core::UNKNOWN;

use crate::renderer::Renderer;

/// Extinguisher-type vocabulary, in canonical casing.
pub const EXTINGUISHER_TYPES: &[&str] = &[
    "ABC",
    "BC",
    "CO2",
    "Dry Chemical",
    "Water",
    "Foam",
    "Class A",
    "Class B",
    "Class C",
    "Class K",
];

/// Longest trailing segment after a colon accepted as an answer.
const MAX_ANSWER_CHARS: usize = 50;

/// Longest line accepted by the last-line fallback.
const MAX_FALLBACK_LINE_CHARS: usize = 100;

const ANSWER_MARKERS: &[&str] = &["answer:", "result:", "type:", "unknown", "n/a"];

static TYPE_TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:class\s+[abck]|dry\s+chemical|co2|abc|bc|water|foam)\b").unwrap()
});

/// Extract a short final answer from free-form reasoning text.
///
/// Returns [`UNKNOWN`] when nothing plausible is found.
pub fn extract_answer(reasoning: &str) -> String {
    let lines: Vec<String> = reasoning
        .lines()
        .map(plain_line)
        .filter(|line| !line.is_empty())
        .collect();
    if lines.is_empty() {
        return UNKNOWN.to_string();
    }

    for line in lines.iter().rev() {
        if !has_marker(line) {
            continue;
        }
        match line.rsplit_once(':') {
            Some((_, tail)) => {
                let tail = clean_answer(tail);
                if tail.is_empty() {
                    continue;
                }
                if tail.chars().count() <= MAX_ANSWER_CHARS {
                    return tail;
                }
                return line.clone();
            }
            None => return line.clone(),
        }
    }

    if let Some(token) = TYPE_TOKEN_RE.find(reasoning) {
        return canonical_type(token.as_str());
    }

    lines
        .iter()
        .rev()
        .find(|line| line.chars().count() <= MAX_FALLBACK_LINE_CHARS)
        .map(|line| clean_answer(line))
        .filter(|answer| !answer.is_empty())
        .unwrap_or_else(|| UNKNOWN.to_string())
}

fn has_marker(line: &str) -> bool {
    let lower = line.to_lowercase();
    ANSWER_MARKERS.iter().any(|m| lower.contains(m)) || TYPE_TOKEN_RE.is_match(line)
}

/// One line with markdown markup rendered away. Falls back to the trimmed
/// raw line when rendering swallows everything (e.g. `2024.` parses as an
/// empty ordered-list item).
fn plain_line(line: &str) -> String {
    let raw = line.trim();
    if raw.is_empty() {
        return String::new();
    }
    let plain = Renderer::to_plain_text(raw);
    if plain.is_empty() {
        raw.trim_matches(|c: char| matches!(c, '*' | '_' | '#' | '`' | '>' | '-'))
            .trim()
            .to_string()
    } else {
        plain
    }
}

fn clean_answer(s: &str) -> String {
    s.trim()
        .trim_matches(|c: char| matches!(c, '"' | '\'' | '`' | '*' | '.'))
        .trim()
        .to_string()
}

fn canonical_type(token: &str) -> String {
    let normalized = token.split_whitespace().collect::<Vec<_>>().join(" ");
    EXTINGUISHER_TYPES
        .iter()
        .find(|t| t.eq_ignore_ascii_case(&normalized))
        .map(|t| t.to_string())
        .unwrap_or(normalized)
}
