//! Doctor command - verify system requirements and configuration.

use crate::cli::Output;
use crate::config::Settings;
use console::style;
use std::path::Path;
use std::process::Command;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Run all diagnostic checks.
pub fn run_doctor(settings: &Settings, config_path: &Path) -> anyhow::Result<()> {
    Output::header("Kapittel Doctor");
    println!();
    println!("Checking system requirements and configuration...\n");

    let sections = [
        ("Transcript Source", vec![check_ytdlp(&settings.transcript.ytdlp_path)]),
        ("Language Model", check_llm(settings)),
        ("Configuration", check_config(settings, config_path)),
    ];

    let mut errors = 0;
    let mut warnings = 0;
    for (title, checks) in &sections {
        println!("{}", style(title).bold());
        for check in checks {
            check.print();
            match check.status {
                CheckStatus::Error => errors += 1,
                CheckStatus::Warning => warnings += 1,
                CheckStatus::Ok => {}
            }
        }
        println!();
    }

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before using Kapittel.",
            errors
        ));
        std::process::exit(1);
    } else if warnings > 0 {
        Output::warning(&format!(
            "All checks passed with {} warning(s).",
            warnings
        ));
    } else {
        Output::success("All checks passed! Kapittel is ready to use.");
    }

    Ok(())
}

/// Check that yt-dlp runs and report its version.
fn check_ytdlp(path: &str) -> CheckResult {
    match Command::new(path).arg("--version").output() {
        Ok(output) if output.status.success() => {
            let version = String::from_utf8_lossy(&output.stdout)
                .lines()
                .next()
                .unwrap_or("installed")
                .trim()
                .to_string();
            CheckResult::ok("yt-dlp", &version)
        }
        Ok(_) => CheckResult::error("yt-dlp", "installed but not working", install_hint_ytdlp()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            CheckResult::error("yt-dlp", &format!("not found at '{}'", path), install_hint_ytdlp())
        }
        Err(e) => CheckResult::error("yt-dlp", &format!("error: {}", e), install_hint_ytdlp()),
    }
}

/// Check the API key and report which model and endpoint will be used.
fn check_llm(settings: &Settings) -> Vec<CheckResult> {
    let env = &settings.llm.api_key_env;
    let key_check = match settings.llm.api_key() {
        Ok(key) => CheckResult::ok(env, &format!("configured ({})", mask_key(&key))),
        Err(_) => CheckResult::error(
            env,
            "not set",
            &format!("Set with: export {}='...'", env),
        ),
    };

    let endpoint = settings
        .llm
        .api_base
        .as_deref()
        .unwrap_or("https://api.openai.com/v1");

    vec![
        key_check,
        CheckResult::ok("Model", &format!("{} via {}", settings.llm.model, endpoint)),
    ]
}

/// Check the config file and the custom prompt directory.
fn check_config(settings: &Settings, config_path: &Path) -> Vec<CheckResult> {
    let mut results = Vec::new();

    if config_path.exists() {
        results.push(CheckResult::ok("Config file", &config_path.display().to_string()));
    } else {
        results.push(CheckResult::warning(
            "Config file",
            "using defaults",
            &format!("Create {} to override defaults", config_path.display()),
        ));
    }

    if let Some(dir) = &settings.prompts.custom_dir {
        let path = Settings::expand_path(dir);
        if path.is_dir() {
            results.push(CheckResult::ok("Custom prompts", &path.display().to_string()));
        } else {
            results.push(CheckResult::warning(
                "Custom prompts",
                &format!("{} does not exist", path.display()),
                "Built-in prompts will be used",
            ));
        }
    }

    results
}

/// Show only the ends of a secret.
fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 12 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

/// Platform-specific install hint for yt-dlp.
fn install_hint_ytdlp() -> &'static str {
    if cfg!(target_os = "macos") {
        "Install with: brew install yt-dlp"
    } else if cfg!(target_os = "linux") {
        "Install with: pip install yt-dlp (or your package manager)"
    } else {
        "Install from: https://github.com/yt-dlp/yt-dlp"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_result_error() {
        let result = CheckResult::error("test", "failed", "fix it");
        assert_eq!(result.status, CheckStatus::Error);
        assert_eq!(result.hint, Some("fix it".to_string()));
    }

    #[test]
    fn test_mask_key() {
        assert_eq!(mask_key("short"), "*****");
        assert_eq!(mask_key("sk-abcdefghijklmnop1234"), "sk-a...1234");
    }

    #[test]
    fn test_missing_ytdlp_is_error() {
        let result = check_ytdlp("kapittel-definitely-not-installed");
        assert_eq!(result.status, CheckStatus::Error);
        assert!(result.message.contains("not found"));
    }

    #[test]
    fn test_missing_key_is_error() {
        let mut settings = Settings::default();
        settings.llm.api_key_env = "KAPITTEL_DOCTOR_UNSET_KEY".to_string();
        let results = check_llm(&settings);
        assert_eq!(results[0].status, CheckStatus::Error);
        assert_eq!(results[1].status, CheckStatus::Ok);
    }

    #[test]
    fn test_config_check_reports_loaded_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let results = check_config(&Settings::default(), file.path());
        assert_eq!(results[0].status, CheckStatus::Ok);
        assert_eq!(results[0].message, file.path().display().to_string());

        let missing = file.path().with_extension("missing.toml");
        let results = check_config(&Settings::default(), &missing);
        assert_eq!(results[0].status, CheckStatus::Warning);
        assert!(results[0].hint.as_deref().unwrap().contains("missing.toml"));
    }

    #[test]
    fn test_missing_prompt_dir_is_warning() {
        let mut settings = Settings::default();
        settings.prompts.custom_dir = Some("/nonexistent/kapittel/prompts".to_string());
        let results = check_config(&settings, &Settings::default_config_path());
        assert!(results
            .iter()
            .any(|r| r.name == "Custom prompts" && r.status == CheckStatus::Warning));
    }
}
