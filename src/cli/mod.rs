//! CLI module for Kapittel.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Kapittel - YouTube chapter generator
///
/// Fetches a video's transcript and turns it into a chapter list with two
/// passes over a language model. "Kapittel" is Norwegian for "chapter."
#[derive(Parser, Debug)]
#[command(name = "kapittel")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Generate chapters for one video and print them
    Generate {
        /// YouTube video URL
        url: String,

        /// Transcript language code (auto-detected by default)
        #[arg(short, long)]
        language: Option<String>,

        /// Print the full JSON response instead of the chapter list
        #[arg(long)]
        json: bool,
    },

    /// Check system requirements and configuration
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_generate() {
        let cli = Cli::parse_from([
            "kapittel",
            "-vv",
            "generate",
            "https://youtu.be/abc123",
            "--language",
            "de",
        ]);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Generate { url, language, json } => {
                assert_eq!(url, "https://youtu.be/abc123");
                assert_eq!(language.as_deref(), Some("de"));
                assert!(!json);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_serve_overrides() {
        let cli = Cli::parse_from(["kapittel", "serve", "--port", "9000"]);
        assert!(matches!(
            cli.command,
            Commands::Serve { host: None, port: Some(9000) }
        ));
    }
}
