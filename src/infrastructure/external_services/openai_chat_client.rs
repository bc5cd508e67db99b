use async_trait::async_trait;
use reqwest::{Client, Error as ReqwestError, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::application::ports::chat_completion::{
    ChatCompletionError, ChatCompletionProvider, ChatCompletionRequest, ChatCompletionResponse,
    ChatMessage,
};
use crate::config::LlmConfig;

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Client for any OpenAI-compatible `/chat/completions` endpoint (Gemini by default).
pub struct OpenAiChatClient {
    client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl OpenAiChatClient {
    pub fn new(config: &LlmConfig) -> Result<Self, ReqwestError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait]
impl ChatCompletionProvider for OpenAiChatClient {
    async fn complete(
        &self,
        request: ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, ChatCompletionError> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            ChatCompletionError::AuthenticationError("No API key configured".to_string())
        })?;

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(&CompletionRequest {
                model: &self.model,
                messages: &request.messages,
            })
            .send()
            .await
            .map_err(|e| ChatCompletionError::NetworkError(e.without_url().to_string()))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ChatCompletionError::AuthenticationError(format!(
                "Rejected with status {}",
                status
            )));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ChatCompletionError::ApiError(format!(
                "Completion endpoint returned {}: {}",
                status, body
            )));
        }

        let parsed = response
            .json::<CompletionResponse>()
            .await
            .map_err(|e| ChatCompletionError::ApiError(format!("Invalid response: {}", e)))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(ChatCompletionError::EmptyResponse)?;

        Ok(ChatCompletionResponse { content })
    }

    fn model_name(&self) -> String {
        self.model.clone()
    }
}
