//! Error types for Kapittel.

use thiserror::Error;

/// Library-level error type for Kapittel operations.
#[derive(Error, Debug)]
pub enum KapittelError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid YouTube URL: {0}")]
    InvalidUrl(String),

    #[error("Transcript unavailable: {0}")]
    TranscriptNotFound(String),

    #[error("Video source error: {0}")]
    VideoSource(String),

    #[error("Error generating chapters: {0}")]
    Generation(String),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),
}

/// Result type alias for Kapittel operations.
pub type Result<T> = std::result::Result<T, KapittelError>;
