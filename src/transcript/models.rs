//! Data models for transcripts, and the `MM:SS` timestamp format.

use serde::{Deserialize, Serialize};

/// A single timed line of a transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    /// Start time in seconds.
    pub start_seconds: f64,
    /// Duration in seconds.
    pub duration_seconds: f64,
    /// Caption text.
    pub text: String,
}

impl TranscriptSegment {
    /// Create a new transcript segment.
    pub fn new(start_seconds: f64, duration_seconds: f64, text: impl Into<String>) -> Self {
        Self {
            start_seconds,
            duration_seconds,
            text: text.into(),
        }
    }

    /// End time in seconds.
    pub fn end_seconds(&self) -> f64 {
        self.start_seconds + self.duration_seconds
    }
}

/// A complete transcript in one language.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    /// Video ID this transcript belongs to.
    pub video_id: String,
    /// Language code of the caption track.
    pub language: String,
    /// Segments ordered by start time.
    pub segments: Vec<TranscriptSegment>,
    /// All segment texts joined by single spaces.
    pub full_text: String,
}

impl Transcript {
    /// Create a new transcript from segments, ordering them by start time.
    pub fn new(video_id: String, language: String, mut segments: Vec<TranscriptSegment>) -> Self {
        segments.sort_by(|a, b| a.start_seconds.total_cmp(&b.start_seconds));

        let full_text = segments
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");

        Self {
            video_id,
            language,
            segments,
            full_text,
        }
    }

    /// Latest end time over all segments.
    pub fn end_seconds(&self) -> f64 {
        self.segments
            .iter()
            .map(|s| s.end_seconds())
            .fold(0.0f64, f64::max)
    }

    /// Start of the segment containing `seconds`: the last segment starting at
    /// or before it. Falls back to 0 before the first segment.
    pub fn segment_start_at(&self, seconds: f64) -> f64 {
        let idx = self
            .segments
            .partition_point(|s| s.start_seconds <= seconds);
        match idx {
            0 => 0.0,
            i => self.segments[i - 1].start_seconds,
        }
    }

    /// One `[MM:SS] text` line per segment, for prompts.
    pub fn format_with_timestamps(&self) -> String {
        self.segments
            .iter()
            .map(|s| format!("[{}] {}", format_timestamp(s.start_seconds), s.text))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Format seconds as `MM:SS`.
///
/// Minutes are not rolled over into hours: 2 hours and 5 minutes is `125:00`.
/// Negative or non-finite input is treated as zero.
pub fn format_timestamp(seconds: f64) -> String {
    let total_seconds = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    format!("{:02}:{:02}", total_seconds / 60, total_seconds % 60)
}

/// Parse `MM:SS` (any number of minute digits) or `H:MM:SS` into whole seconds.
pub fn parse_timestamp(label: &str) -> Option<u32> {
    let parts: Vec<&str> = label.trim().split(':').collect();
    let numbers = parts
        .iter()
        .map(|p| {
            if p.is_empty() || !p.bytes().all(|b| b.is_ascii_digit()) {
                None
            } else {
                p.parse::<u32>().ok()
            }
        })
        .collect::<Option<Vec<u32>>>()?;

    match (numbers.as_slice(), parts.as_slice()) {
        ([minutes, seconds], [_, s]) if *seconds < 60 && s.len() == 2 => {
            minutes.checked_mul(60)?.checked_add(*seconds)
        }
        ([hours, minutes, seconds], [_, m, s])
            if *minutes < 60 && *seconds < 60 && m.len() == 2 && s.len() == 2 =>
        {
            hours
                .checked_mul(3600)?
                .checked_add(minutes * 60)?
                .checked_add(*seconds)
        }
        _ => None,
    }
}
