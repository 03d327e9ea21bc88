//! Second pass: merge, rebalance, and retitle the draft chapters.
//!
//! A refinement is accepted as a whole or not at all. If the model call fails,
//! or any entry of its answer is malformed, past the end of the transcript, or
//! out of order, the draft is kept unchanged.

use super::{
    force_first_to_zero, format_chapter_list, parse_chapters, Chapter, ChatModel, ChatRequest,
};
use crate::config::Prompts;
use crate::error::{KapittelError, Result};
use crate::transcript::{format_timestamp, Transcript};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// What the refining pass produced.
#[derive(Debug, Clone, PartialEq)]
pub enum RefineOutcome {
    /// The model's chapter list passed validation.
    Refined(Vec<Chapter>),
    /// The draft was kept; `reason` says why.
    KeptDraft { chapters: Vec<Chapter>, reason: String },
}

impl RefineOutcome {
    pub fn chapters(&self) -> &[Chapter] {
        match self {
            RefineOutcome::Refined(chapters) => chapters,
            RefineOutcome::KeptDraft { chapters, .. } => chapters,
        }
    }

    pub fn into_chapters(self) -> Vec<Chapter> {
        match self {
            RefineOutcome::Refined(chapters) => chapters,
            RefineOutcome::KeptDraft { chapters, .. } => chapters,
        }
    }

    pub fn is_refined(&self) -> bool {
        matches!(self, RefineOutcome::Refined(_))
    }
}

/// Refines a draft chapter list with a second model call.
pub struct ChapterRefiner {
    model: Arc<dyn ChatModel>,
    prompts: Prompts,
    temperature: f32,
}

impl ChapterRefiner {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self {
            model,
            prompts: Prompts::default(),
            temperature: 0.1,
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

    /// Refine `draft`, returning an error for any call or validation failure.
    #[instrument(skip(self, transcript, draft), fields(video_id = %transcript.video_id))]
    pub async fn refine(&self, transcript: &Transcript, draft: &[Chapter]) -> Result<Vec<Chapter>> {
        let mut vars = HashMap::new();
        vars.insert("transcript".to_string(), transcript.format_with_timestamps());
        vars.insert("chapters".to_string(), format_chapter_list(draft));
        vars.insert(
            "duration".to_string(),
            format_timestamp(transcript.end_seconds()),
        );

        let request = ChatRequest {
            system: self
                .prompts
                .render_with_custom(&self.prompts.refining.system, &vars),
            user: self
                .prompts
                .render_with_custom(&self.prompts.refining.user, &vars),
            temperature: self.temperature,
            json_output: true,
        };

        info!("Refining {} draft chapters", draft.len());
        let response = self.model.complete(request).await?;
        let parsed = parse_chapters(&response)?;

        if let Some(reason) = parsed.rejected.first() {
            return Err(KapittelError::Generation(format!(
                "refined chapters contain a malformed entry ({})",
                reason
            )));
        }

        let mut chapters = parsed.chapters;
        validate_refined(&chapters, transcript)?;
        force_first_to_zero(&mut chapters);
        Ok(chapters)
    }

    /// Refine `draft`, keeping the draft if refinement fails for any reason.
    pub async fn refine_or_keep(&self, transcript: &Transcript, draft: &[Chapter]) -> RefineOutcome {
        match self.refine(transcript, draft).await {
            Ok(chapters) => {
                info!("Refined {} draft chapters into {}", draft.len(), chapters.len());
                RefineOutcome::Refined(chapters)
            }
            Err(e) => {
                warn!(video_id = %transcript.video_id, "Refinement discarded, keeping draft chapters: {}", e);
                RefineOutcome::KeptDraft {
                    chapters: draft.to_vec(),
                    reason: e.to_string(),
                }
            }
        }
    }
}

fn validate_refined(chapters: &[Chapter], transcript: &Transcript) -> Result<()> {
    if chapters.is_empty() {
        return Err(KapittelError::Generation(
            "refinement returned no chapters".to_string(),
        ));
    }

    let end = transcript.end_seconds();
    if let Some(late) = chapters
        .iter()
        .find(|c| f64::from(c.start_seconds) > end)
    {
        return Err(KapittelError::Generation(format!(
            "refined chapter '{}' at {} is past the end of the video ({})",
            late.title,
            late.timestamp,
            format_timestamp(end)
        )));
    }

    if let Some(pair) = chapters
        .windows(2)
        .find(|w| w[1].start_seconds <= w[0].start_seconds)
    {
        return Err(KapittelError::Generation(format!(
            "refined chapters are out of order ({} followed by {})",
            pair[0].timestamp, pair[1].timestamp
        )));
    }

    Ok(())
}
