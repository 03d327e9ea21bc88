//! YouTube transcript source: video ID extraction and caption retrieval via yt-dlp.

use super::captions::{parse_json3, select_track, tracks_from_metadata};
use super::{Transcript, TranscriptSource};
use crate::config::TranscriptSettings;
use crate::error::{KapittelError, Result};
use async_trait::async_trait;
use regex::Regex;
use std::sync::LazyLock;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info, instrument};
use url::Url;

static VIDEO_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("Invalid regex"));

static BARE_VIDEO_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]{11}$").expect("Invalid regex"));

/// Extract a video ID from a YouTube URL or a bare 11-character ID.
///
/// Handles `watch?v=`, `youtu.be/`, and the `/embed/`, `/shorts/`, `/live/`
/// and `/v/` path forms, with or without a scheme.
pub fn extract_video_id(input: &str) -> Option<String> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }
    if BARE_VIDEO_ID.is_match(input) {
        return Some(input.to_string());
    }

    let url = Url::parse(input)
        .or_else(|_| Url::parse(&format!("https://{}", input)))
        .ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }

    let host = url.host_str()?.to_ascii_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host);
    let mut segments = url.path_segments()?.filter(|s| !s.is_empty());

    let candidate = if host == "youtu.be" {
        segments.next().map(str::to_string)
    } else if host == "youtube.com"
        || host.ends_with(".youtube.com")
        || host == "youtube-nocookie.com"
    {
        match segments.next() {
            Some("watch") => url
                .query_pairs()
                .find(|(k, _)| k == "v")
                .map(|(_, v)| v.into_owned()),
            Some("embed" | "shorts" | "live" | "v") => segments.next().map(str::to_string),
            _ => None,
        }
    } else {
        None
    };

    candidate.filter(|id| VIDEO_ID.is_match(id))
}

/// Canonical watch URL for a video ID.
pub fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={}", video_id)
}

/// Transcript source that lists caption tracks with yt-dlp and downloads the
/// chosen track over HTTP.
pub struct YtDlpTranscriptSource {
    ytdlp_path: String,
    preferred_language: String,
    timeout: Duration,
    http: reqwest::Client,
}

impl YtDlpTranscriptSource {
    /// Create a new source from settings.
    pub fn new(settings: &TranscriptSettings) -> Result<Self> {
        let timeout = Duration::from_secs(settings.timeout_seconds);
        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            ytdlp_path: settings.ytdlp_path.clone(),
            preferred_language: settings.preferred_language.clone(),
            timeout,
            http,
        })
    }

    /// Fetch video metadata (including caption track listings) using yt-dlp.
    async fn fetch_metadata(&self, video_id: &str) -> Result<serde_json::Value> {
        let url = watch_url(video_id);

        let run = Command::new(&self.ytdlp_path)
            .args([
                "--dump-json",
                "--skip-download",
                "--no-playlist",
                "--no-warnings",
                &url,
            ])
            .kill_on_drop(true)
            .output();

        let output = tokio::time::timeout(self.timeout, run)
            .await
            .map_err(|_| {
                KapittelError::VideoSource(format!(
                    "yt-dlp timed out after {}s",
                    self.timeout.as_secs()
                ))
            })?
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    KapittelError::ToolNotFound(self.ytdlp_path.clone())
                } else {
                    KapittelError::VideoSource(format!("Failed to run yt-dlp: {}", e))
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(KapittelError::TranscriptNotFound(format!(
                "video {} not found or unavailable: {}",
                video_id,
                stderr.trim()
            )));
        }

        serde_json::from_slice(&output.stdout).map_err(|e| {
            KapittelError::VideoSource(format!("Failed to parse yt-dlp output: {}", e))
        })
    }
}

#[async_trait]
impl TranscriptSource for YtDlpTranscriptSource {
    #[instrument(skip(self))]
    async fn fetch(&self, video_id: &str, language: Option<&str>) -> Result<Transcript> {
        let metadata = self.fetch_metadata(video_id).await?;
        let tracks = tracks_from_metadata(&metadata);
        debug!("Found {} caption tracks", tracks.len());

        let track = select_track(&tracks, language, &self.preferred_language)?;
        let caption_url = track.json3_url().ok_or_else(|| {
            KapittelError::TranscriptNotFound(format!(
                "caption track '{}' has no json3 rendition",
                track.language
            ))
        })?;

        info!("Downloading {:?} captions in '{}'", track.kind, track.language);
        let body = self
            .http
            .get(caption_url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let segments = parse_json3(&body)?;
        if segments.is_empty() {
            return Err(KapittelError::TranscriptNotFound(format!(
                "caption track '{}' is empty",
                track.language
            )));
        }

        Ok(Transcript::new(
            video_id.to_string(),
            track.language.clone(),
            segments,
        ))
    }
}
