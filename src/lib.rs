//! Kapittel - YouTube chapter generation
//!
//! Fetches the transcript of a YouTube video and turns it into a list of
//! chapter markers with two passes over a language model: a draft pass that
//! proposes chapters and a refine pass that tightens them.
//!
//! The name "Kapittel" is the Norwegian word for "chapter."
//!
//! # Architecture
//!
//! - `config` - Settings and prompt templates
//! - `transcript` - Video id extraction and caption retrieval
//! - `chapters` - Chapter model, response parsing, drafting and refining
//! - `openai` - Chat model backed by an OpenAI-compatible API
//! - `orchestrator` - Pipeline coordination
//! - `cli` - Command line and HTTP surface
//!
//! # Example
//!
//! ```rust,no_run
//! use kapittel::config::Settings;
//! use kapittel::openai::OpenAIChatModel;
//! use kapittel::orchestrator::{ChapterRequest, Orchestrator};
//! use kapittel::transcript::YtDlpTranscriptSource;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let model = Arc::new(OpenAIChatModel::from_settings(&settings.llm)?);
//!     let source = Arc::new(YtDlpTranscriptSource::new(&settings.transcript)?);
//!     let orchestrator = Orchestrator::new(&settings, source, model)?;
//!
//!     let request = ChapterRequest {
//!         url: "https://www.youtube.com/watch?v=dQw4w9WgXcQ".to_string(),
//!         language: None,
//!     };
//!     let response = orchestrator.generate(&request).await?;
//!     for chapter in &response.chapters {
//!         println!("{} - {}", chapter.timestamp, chapter.title);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod chapters;
pub mod cli;
pub mod config;
pub mod error;
pub mod openai;
pub mod orchestrator;
pub mod transcript;

pub use error::{KapittelError, Result};
