//! Transcript retrieval for Kapittel.
//!
//! A [`TranscriptSource`] turns a video ID (and optional language hint) into an
//! ordered, timed transcript. The production source reads YouTube caption
//! tracks through yt-dlp.

mod captions;
mod models;
mod youtube;

pub use captions::{
    parse_json3, select_track, tracks_from_metadata, CaptionFormat, CaptionTrack, TrackKind,
};
pub use models::{format_timestamp, parse_timestamp, Transcript, TranscriptSegment};
pub use youtube::{extract_video_id, watch_url, YtDlpTranscriptSource};

use crate::error::Result;
use async_trait::async_trait;

/// Trait for transcript providers.
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    /// Fetch the transcript for a video.
    ///
    /// Fails with `TranscriptNotFound` when the video has no transcript, or
    /// none in the requested language.
    async fn fetch(&self, video_id: &str, language: Option<&str>) -> Result<Transcript>;
}
