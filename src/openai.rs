//! OpenAI-compatible chat client and the production [`ChatModel`].

use crate::chapters::{ChatModel, ChatRequest};
use crate::config::LlmSettings;
use crate::error::{KapittelError, Result};
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs, ResponseFormat,
};
use async_openai::Client;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument};

/// Create a chat client from the LLM settings.
///
/// The API key is read from the environment variable named by
/// `settings.api_key_env`; a missing or empty key is a configuration error.
pub fn create_client(settings: &LlmSettings) -> Result<Client<OpenAIConfig>> {
    let api_key = settings.api_key()?;

    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(settings.timeout_seconds))
        .build()?;

    let mut config = OpenAIConfig::new().with_api_key(api_key);
    if let Some(base) = settings.api_base.as_deref().filter(|b| !b.is_empty()) {
        config = config.with_api_base(base);
    }

    Ok(Client::with_config(config).with_http_client(http_client))
}

/// Chat model backed by an OpenAI-compatible chat completions endpoint.
pub struct OpenAIChatModel {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAIChatModel {
    pub fn new(client: Client<OpenAIConfig>, model: &str) -> Self {
        Self {
            client,
            model: model.to_string(),
        }
    }

    /// Build the client and model from settings in one step.
    pub fn from_settings(settings: &LlmSettings) -> Result<Self> {
        Ok(Self::new(create_client(settings)?, &settings.model))
    }
}

#[async_trait]
impl ChatModel for OpenAIChatModel {
    #[instrument(skip(self, request), fields(model = %self.model))]
    async fn complete(&self, request: ChatRequest) -> Result<String> {
        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(request.system)
                .build()
                .map_err(|e| KapittelError::OpenAI(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(request.user)
                .build()
                .map_err(|e| KapittelError::OpenAI(e.to_string()))?
                .into(),
        ];

        let mut builder = CreateChatCompletionRequestArgs::default();
        builder
            .model(&self.model)
            .messages(messages)
            .temperature(request.temperature);
        if request.json_output {
            builder.response_format(ResponseFormat::JsonObject);
        }
        let chat_request = builder
            .build()
            .map_err(|e| KapittelError::OpenAI(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(chat_request)
            .await
            .map_err(|e| KapittelError::OpenAI(e.to_string()))?;

        let content = response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .ok_or_else(|| KapittelError::OpenAI("Empty response from model".to_string()))?;

        debug!("Model response: {}", preview(&content, 500));
        Ok(content)
    }
}

/// First `max_chars` characters of `text`, for log lines.
pub(crate) fn preview(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_respects_char_boundaries() {
        assert_eq!(preview("héllo wörld", 4), "héll");
        assert_eq!(preview("short", 100), "short");
    }

    #[test]
    fn test_create_client_requires_key() {
        let settings = LlmSettings {
            api_key_env: "KAPITTEL_TEST_KEY_THAT_IS_NEVER_SET".to_string(),
            ..LlmSettings::default()
        };
        assert!(matches!(
            create_client(&settings),
            Err(KapittelError::Config(_))
        ));
    }
}
