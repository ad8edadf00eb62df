use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::LlmConfig;
use crate::prompt::{PromptSpec, Role};

/// Anything that can turn a prompt into generated text.
#[async_trait]
pub trait Completion: Send + Sync {
    async fn complete(&self, prompt: &PromptSpec) -> Result<String>;
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: Option<String>,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

pub fn to_messages(prompt: &PromptSpec) -> Vec<ChatMessage> {
    prompt
        .turns()
        .into_iter()
        .map(|turn| ChatMessage {
            role: turn.role,
            content: Some(turn.content.clone()),
        })
        .collect()
}

/// Client for an OpenAI-compatible `/chat/completions` endpoint.
pub struct LlmClient {
    client: reqwest::Client,
    config: LlmConfig,
}

impl LlmClient {
    pub fn new(config: LlmConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    pub async fn chat(&self, messages: Vec<ChatMessage>) -> Result<String> {
        let provider = self.config.provider;
        let request = ChatRequest {
            model: &self.config.model,
            messages,
            max_tokens: self.config.max_tokens,
        };

        let url = format!("{}/chat/completions", self.config.base_url);

        debug!("Sending request to {}: {}", provider, url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .with_context(|| format!("Failed to send request to {}", provider))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            anyhow::bail!("{} API error ({}): {}", provider, status, error_body);
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .with_context(|| format!("Failed to parse {} response", provider))?;

        chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .with_context(|| format!("No response from {}", provider))
    }
}

#[async_trait]
impl Completion for LlmClient {
    async fn complete(&self, prompt: &PromptSpec) -> Result<String> {
        self.chat(to_messages(prompt)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LlmProvider;
    use crate::prompt;

    #[test]
    fn test_prompt_converts_to_two_messages() {
        let messages = to_messages(&prompt::build("owls"));
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[1].content.as_deref(), Some("Generate a joke about owls."));
    }

    #[test]
    fn test_request_body_shape() {
        let request = ChatRequest {
            model: "gemma2-9b-it",
            messages: to_messages(&prompt::build("owls")),
            max_tokens: 64,
        };
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["model"], "gemma2-9b-it");
        assert_eq!(body["max_tokens"], 64);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["role"], "user");
    }

    #[test]
    fn test_response_parsing_tolerates_extra_fields() {
        let raw = r#"{
            "id": "chatcmpl-1",
            "choices": [{"index": 0, "message": {"role": "assistant", "content": " Why? "}, "finish_reason": "stop"}],
            "usage": {"total_tokens": 10}
        }"#;
        let parsed: ChatResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.choices[0].message.content.as_deref(), Some(" Why? "));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_an_error() {
        let client = LlmClient::new(LlmConfig {
            provider: LlmProvider::Groq,
            model: "m".to_string(),
            base_url: "http://127.0.0.1:9".to_string(),
            api_key: "k".to_string(),
            max_tokens: 8,
        });
        let err = client.complete(&prompt::build("x")).await.unwrap_err();
        assert!(err.to_string().contains("groq"));
    }
}
