use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug)]
pub enum ChatCompletionError {
    NetworkError(String),
    AuthenticationError(String),
    ApiError(String),
    EmptyResponse,
}

impl std::fmt::Display for ChatCompletionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChatCompletionError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            ChatCompletionError::AuthenticationError(msg) => {
                write!(f, "Authentication error: {}", msg)
            }
            ChatCompletionError::ApiError(msg) => write!(f, "API error: {}", msg),
            ChatCompletionError::EmptyResponse => write!(f, "Model returned no choices"),
        }
    }
}

impl std::error::Error for ChatCompletionError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChatCompletionRequest {
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Clone)]
pub struct ChatCompletionResponse {
    pub content: String,
}

#[async_trait]
pub trait ChatCompletionProvider: Send + Sync {
    async fn complete(
        &self,
        request: ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, ChatCompletionError>;

    fn model_name(&self) -> String;
}
