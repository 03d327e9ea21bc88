//! Configuration settings for Kapittel.

use crate::error::{KapittelError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub server: ServerSettings,
    pub llm: LlmSettings,
    pub transcript: TranscriptSettings,
    pub prompts: PromptSettings,
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Host to bind to.
    pub host: String,
    /// Port to bind to.
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

/// Language model settings shared by the drafting and refining passes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// Chat model name.
    pub model: String,
    /// Base URL of an OpenAI-compatible API. None = api.openai.com.
    pub api_base: Option<String>,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    /// Per-request timeout in seconds.
    pub timeout_seconds: u64,
    /// Sampling temperature for the drafting pass.
    pub draft_temperature: f32,
    /// Sampling temperature for the refining pass.
    pub refine_temperature: f32,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            api_base: None,
            api_key_env: "OPENAI_API_KEY".to_string(),
            timeout_seconds: 120,
            draft_temperature: 0.3,
            refine_temperature: 0.1,
        }
    }
}

impl LlmSettings {
    /// Read the API key from the configured environment variable.
    pub fn api_key(&self) -> Result<String> {
        match std::env::var(&self.api_key_env) {
            Ok(key) if !key.trim().is_empty() => Ok(key),
            Ok(_) => Err(KapittelError::Config(format!(
                "{} is empty. Set it with: export {}='...'",
                self.api_key_env, self.api_key_env
            ))),
            Err(_) => Err(KapittelError::Config(format!(
                "{} not set. Set it with: export {}='...'",
                self.api_key_env, self.api_key_env
            ))),
        }
    }
}

/// Transcript retrieval settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptSettings {
    /// yt-dlp executable name or path.
    pub ytdlp_path: String,
    /// Language preferred when the request gives no hint.
    pub preferred_language: String,
    /// Timeout in seconds for listing tracks and for downloading captions.
    pub timeout_seconds: u64,
}

impl Default for TranscriptSettings {
    fn default() -> Self {
        Self {
            ytdlp_path: "yt-dlp".to_string(),
            preferred_language: "en".to_string(),
            timeout_seconds: 60,
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> Result<Self> {
        let config_path = Self::resolve_config_path(path);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// The file that `load_from(path)` reads: the override, or the default.
    pub fn resolve_config_path(path: Option<&PathBuf>) -> PathBuf {
        match path {
            Some(p) => Self::expand_path(&p.to_string_lossy()),
            None => Self::default_config_path(),
        }
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("kapittel")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_resolve_config_path() {
        let custom = PathBuf::from("/etc/kapittel/custom.toml");
        assert_eq!(Settings::resolve_config_path(Some(&custom)), custom);
        assert_eq!(
            Settings::resolve_config_path(None),
            Settings::default_config_path()
        );
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.server.port, 8000);
        assert_eq!(settings.llm.api_key_env, "OPENAI_API_KEY");
        assert_eq!(settings.transcript.preferred_language, "en");
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[llm]\nmodel = \"gemini-2.0-flash\"\napi_key_env = \"GEMINI_API_KEY\"\n\n[server]\nport = 9100"
        )
        .unwrap();

        let settings = Settings::load_from(Some(&file.path().to_path_buf())).unwrap();
        assert_eq!(settings.llm.model, "gemini-2.0-flash");
        assert_eq!(settings.llm.api_key_env, "GEMINI_API_KEY");
        assert_eq!(settings.llm.timeout_seconds, 120);
        assert_eq!(settings.server.port, 9100);
        assert_eq!(settings.server.host, "127.0.0.1");
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let settings = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(settings.llm.model, "gpt-4o-mini");
    }

    #[test]
    fn test_invalid_file_is_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nport = \"not a number\"").unwrap();
        assert!(Settings::load_from(Some(&file.path().to_path_buf())).is_err());
    }
}
