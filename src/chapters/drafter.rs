//! First pass: transcript to draft chapters.

use super::{force_first_to_zero, parse_chapters, Chapter, ChatModel, ChatRequest};
use crate::config::Prompts;
use crate::error::{KapittelError, Result};
use crate::transcript::{format_timestamp, Transcript};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Proposes an initial chapter list for a transcript.
pub struct ChapterDrafter {
    model: Arc<dyn ChatModel>,
    prompts: Prompts,
    temperature: f32,
}

impl ChapterDrafter {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self {
            model,
            prompts: Prompts::default(),
            temperature: 0.3,
        }
    }

    /// Set custom prompts (with user-defined variables).
    pub fn with_prompts(mut self, prompts: Prompts) -> Self {
        self.prompts = prompts;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Draft chapters for a transcript.
    ///
    /// The result is never empty and starts at `00:00`. Any model failure, or a
    /// response without a single usable chapter, is a `Generation` error.
    #[instrument(skip(self, transcript), fields(video_id = %transcript.video_id))]
    pub async fn draft(&self, transcript: &Transcript) -> Result<Vec<Chapter>> {
        if transcript.segments.is_empty() {
            return Err(KapittelError::Generation(
                "cannot draft chapters for an empty transcript".to_string(),
            ));
        }

        let mut vars = HashMap::new();
        vars.insert("transcript".to_string(), transcript.format_with_timestamps());
        vars.insert(
            "duration".to_string(),
            format_timestamp(transcript.end_seconds()),
        );

        let request = ChatRequest {
            system: self
                .prompts
                .render_with_custom(&self.prompts.drafting.system, &vars),
            user: self
                .prompts
                .render_with_custom(&self.prompts.drafting.user, &vars),
            temperature: self.temperature,
            json_output: true,
        };

        info!("Drafting chapters from {} segments", transcript.segments.len());
        let response = self
            .model
            .complete(request)
            .await
            .map_err(|e| KapittelError::Generation(format!("drafting request failed: {}", e)))?;

        let parsed = parse_chapters(&response)?;
        for reason in &parsed.rejected {
            warn!("Dropping malformed draft chapter: {}", reason);
        }

        let chapters = reconcile(parsed.chapters, transcript);
        if chapters.is_empty() {
            return Err(KapittelError::Generation(
                "model returned no usable chapters".to_string(),
            ));
        }

        debug!("Drafted {} chapters", chapters.len());
        Ok(chapters)
    }
}

/// Fit model-proposed chapters onto the real transcript.
///
/// Chapters past the end of the transcript are dropped, the rest snap back to
/// the start of the segment they fall in. The list is then sorted, the first
/// chapter moved to `00:00`, and repeated timestamps removed (first wins).
fn reconcile(chapters: Vec<Chapter>, transcript: &Transcript) -> Vec<Chapter> {
    let end = transcript.end_seconds();

    let mut fitted: Vec<Chapter> = chapters
        .into_iter()
        .filter(|c| {
            let keep = f64::from(c.start_seconds) <= end;
            if !keep {
                warn!("Dropping draft chapter past transcript end: {} {}", c.timestamp, c.title);
            }
            keep
        })
        .map(|mut c| {
            let snapped = transcript.segment_start_at(f64::from(c.start_seconds)).floor() as u32;
            if snapped != c.start_seconds {
                c.set_start(snapped);
            }
            c
        })
        .collect();

    fitted.sort_by_key(|c| c.start_seconds);
    force_first_to_zero(&mut fitted);
    fitted.dedup_by_key(|c| c.start_seconds);
    fitted
}
