//! Prompt templates for Kapittel.
//!
//! Prompts can be customized by placing TOML files in the custom prompts directory.

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::LazyLock;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{(\w+)\}\}").expect("Invalid regex"));

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    /// First pass: transcript to draft chapters.
    pub drafting: DraftingPrompts,
    /// Second pass: draft chapters to final chapters.
    pub refining: RefiningPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}

const OUTPUT_FORMAT: &str = r#"Respond with a JSON object only, in this shape:
{"chapters": [
  {"timestamp": "00:00", "title": "Introduction"},
  {"timestamp": "MM:SS", "title": "Chapter Title"}
]}"#;

/// Prompts for the drafting pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DraftingPrompts {
    pub system: String,
    pub user: String,
}

impl Default for DraftingPrompts {
    fn default() -> Self {
        Self {
            system: r#"You are a video summarization assistant that generates clear and concise chapter timestamps for YouTube videos. You analyze a transcript and identify only the major segments of the video in a balanced way.

Chapter creation:
- Identify only significant topic shifts that represent a clear, substantial change in content
- Do not create chapters for minor transitions or repetitive content; group consecutive related content into one chapter
- Generate a balanced number of chapters relative to the video length (for a 20-minute video, 5 to 8 chapters)
- Distribute chapters across the whole video so that early, middle, and late segments are all represented
- Never produce a timestamp beyond the total video duration
- If the transcript is not in English, write the chapter titles in English

Each chapter has:
- "timestamp": the approximate start of the segment in MM:SS, taken from the transcript line where the topic begins
- "title": a brief, descriptive title summarizing the segment

The first chapter always starts at 00:00."#
                .to_string(),

            user: format!(
                r#"Total video duration: {{{{duration}}}}

Transcript with timestamps:
{{{{transcript}}}}

{OUTPUT_FORMAT}"#
            ),
        }
    }
}

/// Prompts for the refining pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RefiningPrompts {
    pub system: String,
    pub user: String,
}

impl Default for RefiningPrompts {
    fn default() -> Self {
        Self {
            system: r#"You are a video summarization assistant specializing in refining chapter timestamps for YouTube videos. You receive a preliminary chapter list generated by another assistant together with the full transcript, and you produce the final, optimized chapter list.

Refinement:
- Remove chapters that are unnecessary, redundant, or overly granular
- Merge chapters that cover similar or consecutive topics so that every chapter marks a significant topic shift
- Rebalance the list so chapters cover the whole video evenly (for a 20-minute video, 5 to 8 chapters)
- Make every title concise, descriptive, and clear
- Keep timestamps in MM:SS, in strictly increasing order, never beyond the total video duration
- The first chapter always starts at 00:00"#
                .to_string(),

            user: format!(
                r#"Total video duration: {{{{duration}}}}

Initial chapters:
{{{{chapters}}}}

Transcript with timestamps:
{{{{transcript}}}}

{OUTPUT_FORMAT}"#
            ),
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let drafting_path = custom_path.join("drafting.toml");
            if drafting_path.exists() {
                let content = std::fs::read_to_string(&drafting_path)?;
                prompts.drafting = toml::from_str(&content)?;
            }

            let refining_path = custom_path.join("refining.toml");
            if refining_path.exists() {
                let content = std::fs::read_to_string(&refining_path)?;
                prompts.refining = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    ///
    /// Placeholders are resolved in one pass over the template, so text that
    /// comes in through a variable is never substituted again. Unknown
    /// placeholders are left as they are.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        PLACEHOLDER
            .replace_all(template, |caps: &Captures| match vars.get(&caps[1]) {
                Some(value) => value.clone(),
                None => caps[0].to_string(),
            })
            .into_owned()
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(&self, template: &str, vars: &HashMap<String, String>) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_prompts() {
        let prompts = Prompts::default();
        assert!(!prompts.drafting.system.is_empty());
        assert!(prompts.drafting.user.contains("{{transcript}}"));
        assert!(prompts.refining.user.contains("{{chapters}}"));
        assert!(prompts.refining.user.contains("\"chapters\""));
    }

    #[test]
    fn test_render_template() {
        let template = "Hello {{name}}, you have {{count}} messages.";
        let mut vars = HashMap::new();
        vars.insert("name".to_string(), "Alice".to_string());
        vars.insert("count".to_string(), "5".to_string());

        let result = Prompts::render(template, &vars);
        assert_eq!(result, "Hello Alice, you have 5 messages.");
    }

    #[test]
    fn test_render_does_not_rescan_inserted_text() {
        let template = "{{duration}}\n{{transcript}}\n{{chapters}} {{unknown}}";
        let mut vars = HashMap::new();
        vars.insert("duration".to_string(), "05:00".to_string());
        vars.insert(
            "transcript".to_string(),
            "[00:01] say {{duration}} and {{chapters}}".to_string(),
        );
        vars.insert("chapters".to_string(), "00:00 - Intro".to_string());

        assert_eq!(
            Prompts::render(template, &vars),
            "05:00\n[00:01] say {{duration}} and {{chapters}}\n00:00 - Intro {{unknown}}"
        );
    }

    #[test]
    fn test_provided_vars_override_custom() {
        let mut prompts = Prompts::default();
        prompts
            .variables
            .insert("audience".to_string(), "beginners".to_string());
        prompts
            .variables
            .insert("duration".to_string(), "ignored".to_string());

        let mut vars = HashMap::new();
        vars.insert("duration".to_string(), "12:00".to_string());

        let rendered = prompts.render_with_custom("{{duration}} for {{audience}}", &vars);
        assert_eq!(rendered, "12:00 for beginners");
    }

    #[test]
    fn test_load_custom_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("refining.toml"),
            "system = \"custom system\"\nuser = \"{{chapters}}\"\n",
        )
        .unwrap();

        let prompts = Prompts::load(dir.path().to_str(), None).unwrap();
        assert_eq!(prompts.refining.system, "custom system");
        assert_eq!(prompts.drafting.system, DraftingPrompts::default().system);
    }
}
