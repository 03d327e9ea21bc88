//! Generate command: run the chapter pipeline once from the command line.

use crate::chapters::format_chapter_list;
use crate::cli::output::format_duration;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::openai::OpenAIChatModel;
use crate::orchestrator::{ChapterRequest, Orchestrator};
use crate::transcript::YtDlpTranscriptSource;
use anyhow::Result;
use std::sync::Arc;

/// Run the generate command.
pub async fn run_generate(
    url: &str,
    language: Option<String>,
    json: bool,
    settings: Settings,
) -> Result<()> {
    preflight::check(Operation::Generate, &settings)?;

    let model = Arc::new(OpenAIChatModel::from_settings(&settings.llm)?);
    let source = Arc::new(YtDlpTranscriptSource::new(&settings.transcript)?);
    let orchestrator = Orchestrator::new(&settings, source, model)?;

    let request = ChapterRequest {
        url: url.to_string(),
        language,
    };

    let spinner = (!json).then(|| Output::spinner("Fetching transcript and generating chapters..."));
    let result = orchestrator.generate(&request).await;
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }
    let response = result?;

    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    Output::header(&format!("Chapters for {}", response.video_id));
    Output::kv("Transcript language", &response.language);
    Output::kv("Duration", &format_duration(response.duration_seconds));
    Output::kv(
        "Chapters",
        &format!(
            "{} ({} drafted)",
            response.chapters.len(),
            response.initial_chapters.len()
        ),
    );
    if response.chapters == response.initial_chapters {
        Output::warning("Refinement did not change the draft (or was discarded, see logs with -v).");
    }
    println!();
    for chapter in &response.chapters {
        Output::chapter(chapter);
    }

    println!();
    Output::info("Paste into the video description:");
    println!("{}", format_chapter_list(&response.chapters));

    Ok(())
}
