//! Code Block Unwrapping
//!
//! Structured layers ask the model for a bare JSON object but routinely get it
//! back inside a fenced block, with a language tag or without, sometimes
//! surrounded by prose. This module digs the object out and decodes it.

use std::sync::LazyLock;

use regex::Regex;
use serde::de::DeserializeOwned;
use tagscan_core::is_unknown;
use thiserror::Error;
use tracing::{debug, warn};

/// First opening fence (optional language tag) through its closing fence.
static FENCED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```[A-Za-z0-9_+\-]*[ \t]*\r?\n?(.*?)```").unwrap());

/// A stray fence marker with its optional language tag.
static FENCE_MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```[A-Za-z0-9_+\-]*").unwrap());

#[derive(Debug, Error)]
pub enum SanitizeError {
    #[error("answer is empty or the unknown sentinel")]
    NoAnswer,

    #[error("no JSON object found in answer")]
    NoObject,

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

pub struct CodeBlockAnalyzer;

impl CodeBlockAnalyzer {
    /// Returns the content of the first fenced block, or the input with any
    /// stray fence markers removed when no complete block exists.
    pub fn unwrap_fenced(raw: &str) -> String {
        if let Some(caps) = FENCED_RE.captures(raw) {
            return caps[1].trim().to_string();
        }
        FENCE_MARKER_RE.replace_all(raw, "").trim().to_string()
    }

    /// Finds the first balanced `{...}` object embedded in `text`.
    ///
    /// Braces inside JSON string literals are ignored. If an opening brace
    /// never closes, the search resumes at the next one.
    pub fn find_json_object(text: &str) -> Option<&str> {
        let bytes = text.as_bytes();
        let mut start = 0;
        while let Some(offset) = text[start..].find('{') {
            let open = start + offset;
            let mut depth = 0usize;
            let mut in_string = false;
            let mut escaped = false;
            for (i, &b) in bytes.iter().enumerate().skip(open) {
                if in_string {
                    match b {
                        _ if escaped => escaped = false,
                        b'\\' => escaped = true,
                        b'"' => in_string = false,
                        _ => {}
                    }
                    continue;
                }
                match b {
                    b'"' => in_string = true,
                    b'{' => depth += 1,
                    b'}' => {
                        depth -= 1;
                        if depth == 0 {
                            return Some(&text[open..=i]);
                        }
                    }
                    _ => {}
                }
            }
            start = open + 1;
        }
        None
    }

    /// Decodes a structured answer: fenced content first, then the first
    /// embedded object.
    pub fn parse_structured<T: DeserializeOwned>(raw: &str) -> Result<T, SanitizeError> {
        if is_unknown(raw) {
            return Err(SanitizeError::NoAnswer);
        }
        let unwrapped = Self::unwrap_fenced(raw);
        let first_err = match serde_json::from_str::<T>(&unwrapped) {
            Ok(value) => return Ok(value),
            Err(e) => e,
        };
        let Some(object) = Self::find_json_object(&unwrapped) else {
            return Err(if unwrapped.contains('{') {
                SanitizeError::Json(first_err)
            } else {
                SanitizeError::NoObject
            });
        };
        debug!("Decoding JSON object embedded in surrounding text");
        Ok(serde_json::from_str::<T>(object)?)
    }

    /// Decodes a structured answer, falling back to `T::default()` on any
    /// failure. `field` names the layer for logging.
    pub fn parse_or_default<T: DeserializeOwned + Default>(field: &str, raw: &str) -> T {
        match Self::parse_structured(raw) {
            Ok(value) => value,
            Err(SanitizeError::NoAnswer) => T::default(),
            Err(e) => {
                warn!(field = %field, error = %e, "Structured answer unusable; using defaults");
                T::default()
            }
        }
    }
}
