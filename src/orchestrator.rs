//! Pipeline orchestrator for Kapittel.
//!
//! Runs one chapter request through
//! `ParsingUrl -> FetchingTranscript -> Drafting -> Refining -> Done`.
//! Every stage runs at most once; a failure in any stage except refining ends
//! the request.

use crate::chapters::{Chapter, ChapterDrafter, ChapterRefiner, ChatModel};
use crate::config::{Prompts, Settings};
use crate::error::{KapittelError, Result};
use crate::transcript::{extract_video_id, format_timestamp, Transcript, TranscriptSource};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::field::Empty;
use tracing::{info, instrument, warn, Span};

/// Stages of a chapter request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ParsingUrl,
    FetchingTranscript,
    Drafting,
    Refining,
    Done,
    Errored,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::ParsingUrl => "parsing_url",
            Stage::FetchingTranscript => "fetching_transcript",
            Stage::Drafting => "drafting",
            Stage::Refining => "refining",
            Stage::Done => "done",
            Stage::Errored => "errored",
        };
        f.write_str(name)
    }
}

/// Input for one chapter request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChapterRequest {
    /// YouTube video URL.
    pub url: String,
    /// Transcript language code; auto-detected when absent.
    #[serde(default)]
    pub language: Option<String>,
}

/// One transcript line in the response.
#[derive(Debug, Clone, Serialize)]
pub struct TranscriptEntry {
    /// Start as `MM:SS`.
    pub time: String,
    pub text: String,
    /// Start in seconds.
    pub start: f64,
    /// Duration in seconds.
    pub duration: f64,
}

/// Result of a successful chapter request.
#[derive(Debug, Clone, Serialize)]
pub struct ChapterResponse {
    pub success: bool,
    pub video_id: String,
    /// Language of the transcript that was used.
    pub language: String,
    pub transcript: Vec<TranscriptEntry>,
    pub full_text: String,
    /// Chapters from the drafting pass.
    pub initial_chapters: Vec<Chapter>,
    /// Final chapters: refined, or the draft if refinement was discarded.
    pub chapters: Vec<Chapter>,
    /// End of the latest-ending transcript segment.
    #[serde(skip)]
    pub duration_seconds: f64,
}

impl ChapterResponse {
    fn assemble(transcript: Transcript, initial_chapters: Vec<Chapter>, chapters: Vec<Chapter>) -> Self {
        let duration_seconds = transcript.end_seconds();
        let entries = transcript
            .segments
            .iter()
            .map(|s| TranscriptEntry {
                time: format_timestamp(s.start_seconds),
                text: s.text.clone(),
                start: s.start_seconds,
                duration: s.duration_seconds,
            })
            .collect();

        Self {
            success: true,
            video_id: transcript.video_id,
            language: transcript.language,
            transcript: entries,
            full_text: transcript.full_text,
            initial_chapters,
            chapters,
            duration_seconds,
        }
    }
}

/// The main orchestrator for the Kapittel pipeline.
///
/// Holds only read-only collaborators, so one instance serves concurrent
/// requests.
pub struct Orchestrator {
    source: Arc<dyn TranscriptSource>,
    drafter: ChapterDrafter,
    refiner: ChapterRefiner,
}

impl Orchestrator {
    /// Create an orchestrator from settings, sharing one chat model between
    /// both passes.
    pub fn new(
        settings: &Settings,
        source: Arc<dyn TranscriptSource>,
        model: Arc<dyn ChatModel>,
    ) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        let drafter = ChapterDrafter::new(model.clone())
            .with_prompts(prompts.clone())
            .with_temperature(settings.llm.draft_temperature);
        let refiner = ChapterRefiner::new(model)
            .with_prompts(prompts)
            .with_temperature(settings.llm.refine_temperature);

        Ok(Self::with_components(source, drafter, refiner))
    }

    /// Create an orchestrator with custom components.
    pub fn with_components(
        source: Arc<dyn TranscriptSource>,
        drafter: ChapterDrafter,
        refiner: ChapterRefiner,
    ) -> Self {
        Self {
            source,
            drafter,
            refiner,
        }
    }

    /// Generate chapters for a video.
    #[instrument(
        skip(self, request),
        fields(url = %request.url, video_id = Empty, stage = Empty)
    )]
    pub async fn generate(&self, request: &ChapterRequest) -> Result<ChapterResponse> {
        let result = self.run(request).await;
        match &result {
            Ok(response) => {
                enter(Stage::Done);
                info!(
                    "Generated {} chapters ({} drafted)",
                    response.chapters.len(),
                    response.initial_chapters.len()
                );
            }
            Err(e) => {
                enter(Stage::Errored);
                warn!("Chapter generation failed: {}", e);
            }
        }
        result
    }

    async fn run(&self, request: &ChapterRequest) -> Result<ChapterResponse> {
        enter(Stage::ParsingUrl);
        let video_id = extract_video_id(&request.url)
            .ok_or_else(|| KapittelError::InvalidUrl(request.url.clone()))?;
        Span::current().record("video_id", video_id.as_str());

        enter(Stage::FetchingTranscript);
        let language = request.language.as_deref().filter(|l| !l.trim().is_empty());
        let transcript = self.source.fetch(&video_id, language).await?;
        info!(
            "Fetched {} transcript segments in '{}'",
            transcript.segments.len(),
            transcript.language
        );

        enter(Stage::Drafting);
        let initial_chapters = self.drafter.draft(&transcript).await?;

        enter(Stage::Refining);
        let chapters = self
            .refiner
            .refine_or_keep(&transcript, &initial_chapters)
            .await
            .into_chapters();

        Ok(ChapterResponse::assemble(transcript, initial_chapters, chapters))
    }
}

fn enter(stage: Stage) {
    Span::current().record("stage", tracing::field::display(stage));
    tracing::debug!("Entering stage {}", stage);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chapters::testing::ScriptedModel;
    use crate::transcript::testing::FakeSource;
    use crate::transcript::TranscriptSegment;

    fn source() -> Arc<FakeSource> {
        Arc::new(FakeSource::three_segments("abc123"))
    }

    const TWO_CHAPTERS: &str = r#"{"chapters": [
        {"timestamp": "00:00", "title": "Welcome"},
        {"timestamp": "00:15", "title": "Ownership"}
    ]}"#;

    fn orchestrator(source: Arc<FakeSource>, model: Arc<ScriptedModel>) -> Orchestrator {
        Orchestrator::with_components(
            source,
            ChapterDrafter::new(model.clone()),
            ChapterRefiner::new(model),
        )
    }

    fn request(url: &str) -> ChapterRequest {
        ChapterRequest {
            url: url.to_string(),
            language: None,
        }
    }

    #[tokio::test]
    async fn test_end_to_end() {
        let model = Arc::new(ScriptedModel::new(vec![
            Ok(TWO_CHAPTERS.to_string()),
            Ok(TWO_CHAPTERS.to_string()),
        ]));
        let orchestrator = orchestrator(source(), model.clone());

        let response = orchestrator
            .generate(&request("https://www.youtube.com/watch?v=abc123"))
            .await
            .unwrap();

        assert!(response.success);
        assert_eq!(response.video_id, "abc123");
        assert_eq!(response.language, "en");
        assert_eq!(response.transcript.len(), 3);
        assert_eq!(response.transcript[1].time, "00:10");
        assert_eq!(
            response.full_text,
            "Hello and welcome Today we talk about Rust First, ownership"
        );
        assert_eq!(response.initial_chapters.len(), 2);
        assert_eq!(response.chapters.len(), 2);
        assert_eq!(response.initial_chapters[0].timestamp, "00:00");
        assert_eq!(response.chapters[0].timestamp, "00:00");
        assert_eq!(model.request_count(), 2);
    }

    #[tokio::test]
    async fn test_invalid_url_stops_before_fetch() {
        let source = source();
        let model = Arc::new(ScriptedModel::new(vec![]));
        let err = orchestrator(source.clone(), model.clone())
            .generate(&request("not a url"))
            .await
            .unwrap_err();

        assert!(matches!(err, KapittelError::InvalidUrl(_)));
        assert!(source.calls.lock().unwrap().is_empty());
        assert_eq!(model.request_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_transcript_is_not_found() {
        let model = Arc::new(ScriptedModel::new(vec![]));
        let err = orchestrator(source(), model.clone())
            .generate(&request("https://youtu.be/zzz999"))
            .await
            .unwrap_err();

        assert!(matches!(err, KapittelError::TranscriptNotFound(_)));
        assert_eq!(model.request_count(), 0);
    }

    #[tokio::test]
    async fn test_language_hint_is_forwarded() {
        let source = source();
        let model = Arc::new(ScriptedModel::new(vec![
            Ok(TWO_CHAPTERS.to_string()),
            Ok(TWO_CHAPTERS.to_string()),
        ]));
        let response = orchestrator(source.clone(), model)
            .generate(&ChapterRequest {
                url: "https://www.youtube.com/watch?v=abc123".to_string(),
                language: Some("de".to_string()),
            })
            .await
            .unwrap();

        assert_eq!(response.language, "de");
        assert_eq!(
            source.calls.lock().unwrap()[0],
            ("abc123".to_string(), Some("de".to_string()))
        );
    }

    #[tokio::test]
    async fn test_drafting_failure_is_fatal() {
        let model = Arc::new(ScriptedModel::new(vec![Err(KapittelError::OpenAI(
            "boom".to_string(),
        ))]));
        let err = orchestrator(source(), model.clone())
            .generate(&request("https://www.youtube.com/watch?v=abc123"))
            .await
            .unwrap_err();

        assert!(matches!(err, KapittelError::Generation(_)));
        assert_eq!(model.request_count(), 1);
    }

    #[tokio::test]
    async fn test_refinement_failure_returns_draft() {
        let model = Arc::new(ScriptedModel::new(vec![
            Ok(TWO_CHAPTERS.to_string()),
            Err(KapittelError::OpenAI("rate limited".to_string())),
        ]));
        let response = orchestrator(source(), model)
            .generate(&request("https://www.youtube.com/watch?v=abc123"))
            .await
            .unwrap();

        assert_eq!(response.chapters, response.initial_chapters);
    }

    #[tokio::test]
    async fn test_duration_covers_overlapping_captions() {
        let source = Arc::new(FakeSource::new(
            "abc123",
            vec![
                TranscriptSegment::new(0.0, 40.0, "Long opening caption"),
                TranscriptSegment::new(10.0, 5.0, "Overlapping line"),
                TranscriptSegment::new(15.0, 10.0, "Last line"),
            ],
        ));
        let model = Arc::new(ScriptedModel::new(vec![
            Ok(TWO_CHAPTERS.to_string()),
            Ok(TWO_CHAPTERS.to_string()),
        ]));
        let response = orchestrator(source, model)
            .generate(&request("https://www.youtube.com/watch?v=abc123"))
            .await
            .unwrap();

        assert_eq!(response.duration_seconds, 40.0);
        let body = serde_json::to_value(&response).unwrap();
        assert!(body.get("duration_seconds").is_none());
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(Stage::FetchingTranscript.to_string(), "fetching_transcript");
        assert_eq!(Stage::Errored.to_string(), "errored");
    }

    #[test]
    fn test_request_language_is_optional() {
        let req: ChapterRequest =
            serde_json::from_str(r#"{"url": "https://youtu.be/abc123"}"#).unwrap();
        assert!(req.language.is_none());
    }
}
