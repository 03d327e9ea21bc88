//! Pre-flight checks before starting work.
//!
//! Validates that required tools and credentials are available so that a
//! misconfiguration stops the process at startup instead of failing requests.

use crate::config::Settings;
use crate::error::{KapittelError, Result};
use std::process::Command;

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Serving requires the API key; yt-dlp is checked per request.
    Serve,
    /// A one-off generation requires the API key and yt-dlp.
    Generate,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    match operation {
        Operation::Serve => {
            check_api_key(settings)?;
        }
        Operation::Generate => {
            check_api_key(settings)?;
            check_tool(&settings.transcript.ytdlp_path)?;
        }
    }
    Ok(())
}

/// Check that the model API key is configured.
pub fn check_api_key(settings: &Settings) -> Result<()> {
    settings.llm.api_key().map(|_| ())
}

/// Check if an external tool is available.
pub fn check_tool(name: &str) -> Result<()> {
    match Command::new(name).arg("--version").output() {
        Ok(output) if output.status.success() => Ok(()),
        Ok(_) => Err(KapittelError::ToolNotFound(format!(
            "{} is installed but not working correctly",
            name
        ))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(KapittelError::ToolNotFound(name.to_string()))
        }
        Err(e) => Err(KapittelError::ToolNotFound(format!("{}: {}", name, e))),
    }
}
