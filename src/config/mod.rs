//! Configuration module for Kapittel.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{DraftingPrompts, Prompts, RefiningPrompts};
pub use settings::{
    LlmSettings, PromptSettings, ServerSettings, Settings, TranscriptSettings,
};
