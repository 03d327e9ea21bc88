//! Chapter generation: a drafting pass and a refining pass over a transcript.
//!
//! Both passes call a [`ChatModel`] and treat whatever it returns as untrusted
//! input. Chapters that leave this module always start at `00:00` and have
//! ascending, unique timestamps.

mod drafter;
mod parse;
mod refiner;

pub use drafter::ChapterDrafter;
pub use parse::{parse_chapters, ParsedChapters, MAX_TITLE_CHARS};
pub use refiner::{ChapterRefiner, RefineOutcome};

use crate::error::Result;
use crate::transcript::format_timestamp;
use async_trait::async_trait;
use serde::Serialize;

/// A chapter marker: where it starts and what it is called.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chapter {
    #[serde(skip)]
    pub start_seconds: u32,
    /// Start time as `MM:SS`.
    pub timestamp: String,
    pub title: String,
}

impl Chapter {
    pub fn new(start_seconds: u32, title: impl Into<String>) -> Self {
        Self {
            start_seconds,
            timestamp: format_timestamp(f64::from(start_seconds)),
            title: title.into(),
        }
    }

    fn set_start(&mut self, start_seconds: u32) {
        self.start_seconds = start_seconds;
        self.timestamp = format_timestamp(f64::from(start_seconds));
    }
}

/// Render chapters one per line as `MM:SS - Title`, the format YouTube
/// accepts in video descriptions.
pub fn format_chapter_list(chapters: &[Chapter]) -> String {
    chapters
        .iter()
        .map(|c| format!("{} - {}", c.timestamp, c.title))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Move the first chapter to `00:00`.
fn force_first_to_zero(chapters: &mut [Chapter]) {
    if let Some(first) = chapters.first_mut() {
        if first.start_seconds != 0 {
            first.set_start(0);
        }
    }
}

/// A single prompt for a chat model.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub system: String,
    pub user: String,
    pub temperature: f32,
    /// Ask the model for a JSON object response.
    pub json_output: bool,
}

/// Trait for text-generation backends.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Send one prompt and return the raw response text.
    async fn complete(&self, request: ChatRequest) -> Result<String>;
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chapter_new_formats_timestamp() {
        let chapter = Chapter::new(195, "Setup");
        assert_eq!(chapter.timestamp, "03:15");
    }

    #[test]
    fn test_chapter_serializes_without_seconds() {
        let json = serde_json::to_value(Chapter::new(15, "Main")).unwrap();
        assert_eq!(json, serde_json::json!({"timestamp": "00:15", "title": "Main"}));
    }

    #[test]
    fn test_format_chapter_list() {
        let chapters = vec![Chapter::new(0, "Intro"), Chapter::new(75, "Details")];
        assert_eq!(format_chapter_list(&chapters), "00:00 - Intro\n01:15 - Details");
    }

    #[test]
    fn test_force_first_to_zero() {
        let mut chapters = vec![Chapter::new(4, "Intro"), Chapter::new(30, "Next")];
        force_first_to_zero(&mut chapters);
        assert_eq!(chapters[0], Chapter::new(0, "Intro"));
        assert_eq!(chapters[1].timestamp, "00:30");
    }
}
