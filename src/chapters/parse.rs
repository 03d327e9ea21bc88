//! Parsing of chapter lists returned by the model.

use super::Chapter;
use crate::error::{KapittelError, Result};
use crate::transcript::parse_timestamp;
use regex::Regex;
use serde::Deserialize;
use std::sync::LazyLock;

/// Titles longer than this are cut.
pub const MAX_TITLE_CHARS: usize = 120;

static CHAPTER_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s*(?:[-*•]\s+|\d+[.)]\s+)?[*_]*\[?(\d{1,3}(?::\d{2}){1,2})\]?[*_]*\s*(?:[-–—:|]\s*)?(.+?)\s*$",
    )
    .expect("Invalid regex")
});

/// Result of parsing one model response.
#[derive(Debug, Default)]
pub struct ParsedChapters {
    /// Well-formed entries, in the order the model gave them.
    pub chapters: Vec<Chapter>,
    /// One reason per malformed entry.
    pub rejected: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ChapterEnvelope {
    chapters: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct RawChapter {
    timestamp: String,
    title: String,
}

/// Parse a model response into chapters.
///
/// Accepts `{"chapters": [...]}`, a bare JSON array, or `MM:SS - Title` lines,
/// with or without surrounding prose or code fences. Fails only when none of
/// these shapes can be found.
pub fn parse_chapters(response: &str) -> Result<ParsedChapters> {
    if let Some(entries) = json_entries(response) {
        let mut parsed = ParsedChapters::default();
        for (idx, entry) in entries.into_iter().enumerate() {
            match serde_json::from_value::<RawChapter>(entry) {
                Ok(raw) => match validate(&raw.timestamp, &raw.title) {
                    Ok(chapter) => parsed.chapters.push(chapter),
                    Err(reason) => parsed.rejected.push(format!("entry {}: {}", idx, reason)),
                },
                Err(e) => parsed.rejected.push(format!("entry {}: {}", idx, e)),
            }
        }
        return Ok(parsed);
    }

    let mut parsed = ParsedChapters::default();
    for line in response.lines() {
        if let Some(caps) = CHAPTER_LINE.captures(line) {
            match validate(&caps[1], &caps[2]) {
                Ok(chapter) => parsed.chapters.push(chapter),
                Err(reason) => parsed.rejected.push(format!("line '{}': {}", line.trim(), reason)),
            }
        }
    }

    if parsed.chapters.is_empty() && parsed.rejected.is_empty() {
        return Err(KapittelError::Generation(format!(
            "could not find a chapter list in model response: {}",
            crate::openai::preview(response, 300)
        )));
    }

    Ok(parsed)
}

/// Locate the chapter entries in a JSON response, object form first.
fn json_entries(response: &str) -> Option<Vec<serde_json::Value>> {
    if let Some(object) = slice_between(response, '{', '}') {
        if let Ok(envelope) = serde_json::from_str::<ChapterEnvelope>(object) {
            return Some(envelope.chapters);
        }
    }

    slice_between(response, '[', ']')
        .and_then(|array| serde_json::from_str::<Vec<serde_json::Value>>(array).ok())
}

fn slice_between(text: &str, open: char, close: char) -> Option<&str> {
    let start = text.find(open)?;
    let end = text.rfind(close)?;
    (end > start).then(|| &text[start..=end])
}

fn validate(timestamp: &str, title: &str) -> std::result::Result<Chapter, String> {
    let start_seconds =
        parse_timestamp(timestamp).ok_or_else(|| format!("invalid timestamp '{}'", timestamp))?;

    let title = title
        .trim()
        .trim_matches(|c: char| c == '*' || c == '_' || c == '"' || c.is_whitespace());
    if title.is_empty() {
        return Err("empty title".to_string());
    }

    let title: String = title.chars().take(MAX_TITLE_CHARS).collect();
    Ok(Chapter::new(start_seconds, title.trim_end()))
}
