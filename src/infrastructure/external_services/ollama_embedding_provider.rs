use async_trait::async_trait;
use pgvector::Vector;
use reqwest::{Client, Error as ReqwestError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::application::ports::embedding_provider::{
    BatchEmbeddingRequest, BatchEmbeddingResponse, EmbeddingProvider, EmbeddingProviderError,
    EmbeddingRequest, EmbeddingResponse,
};
use crate::config::EmbeddingConfig;

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: TextInput,
}

#[derive(Serialize)]
#[serde(untagged)]
enum TextInput {
    Single(String),
    Multiple(Vec<String>),
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

/// Embeddings from an Ollama server's `/api/embed` endpoint.
#[derive(Debug, Clone)]
pub struct OllamaEmbeddingProvider {
    client: Client,
    base_url: String,
    model: String,
}

impl OllamaEmbeddingProvider {
    pub fn new(config: &EmbeddingConfig) -> Result<Self, ReqwestError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        })
    }

    async fn embed(&self, input: TextInput) -> Result<Vec<Vector>, EmbeddingProviderError> {
        let url = format!("{}/api/embed", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&EmbedRequest {
                model: &self.model,
                input,
            })
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    EmbeddingProviderError::ServiceUnavailable
                } else {
                    EmbeddingProviderError::NetworkError(e.without_url().to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingProviderError::ApiError(format!(
                "Ollama returned {}: {}",
                status, body
            )));
        }

        let parsed = response
            .json::<EmbedResponse>()
            .await
            .map_err(|e| EmbeddingProviderError::ApiError(format!("Invalid response: {}", e)))?;

        Ok(parsed.embeddings.into_iter().map(Vector::from).collect())
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbeddingProvider {
    async fn generate_embedding(
        &self,
        request: EmbeddingRequest,
    ) -> Result<EmbeddingResponse, EmbeddingProviderError> {
        if request.text.trim().is_empty() {
            return Err(EmbeddingProviderError::InvalidInput(
                "Text cannot be empty".to_string(),
            ));
        }

        let embedding = self
            .embed(TextInput::Single(request.text))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| EmbeddingProviderError::ApiError("No embeddings returned".to_string()))?;

        Ok(EmbeddingResponse { embedding })
    }

    async fn generate_embeddings(
        &self,
        request: BatchEmbeddingRequest,
    ) -> Result<BatchEmbeddingResponse, EmbeddingProviderError> {
        if request.texts.is_empty() {
            return Ok(BatchEmbeddingResponse {
                embeddings: Vec::new(),
            });
        }

        let expected = request.texts.len();
        let embeddings = self.embed(TextInput::Multiple(request.texts)).await?;

        if embeddings.len() != expected {
            return Err(EmbeddingProviderError::ApiError(format!(
                "Expected {} embeddings, got {}",
                expected,
                embeddings.len()
            )));
        }

        Ok(BatchEmbeddingResponse { embeddings })
    }

    fn model_name(&self) -> String {
        self.model.clone()
    }
}
