//! Deterministic stand-ins for the remote services, shared by unit tests.

use async_trait::async_trait;
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};
use pgvector::Vector;
use std::path::Path;
use std::sync::{Mutex, OnceLock};

use crate::application::ports::chat_completion::{
    ChatCompletionError, ChatCompletionProvider, ChatCompletionRequest, ChatCompletionResponse,
    ChatRole,
};
use crate::application::ports::document_extractor::{
    DocumentExtractionError, DocumentExtractor, ExtractedDocument,
};
use crate::application::ports::embedding_provider::{
    BatchEmbeddingRequest, BatchEmbeddingResponse, EmbeddingProvider, EmbeddingProviderError,
    EmbeddingRequest, EmbeddingResponse,
};
use crate::infrastructure::database::{DbPool, create_connection_pool, run_migrations};

/// Bag-of-words hashing embedder: texts sharing words land close together.
pub struct KeywordEmbeddingProvider {
    dimensions: usize,
}

impl Default for KeywordEmbeddingProvider {
    fn default() -> Self {
        Self { dimensions: 512 }
    }
}

impl KeywordEmbeddingProvider {
    pub fn embed(&self, text: &str) -> Vector {
        let mut values = vec![0.0f32; self.dimensions];

        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let word = word.to_lowercase();
            // FNV-1a
            let mut hash: u64 = 0xcbf29ce484222325;
            for byte in word.bytes() {
                hash ^= byte as u64;
                hash = hash.wrapping_mul(0x100000001b3);
            }
            values[(hash % self.dimensions as u64) as usize] += 1.0;
        }

        let norm = values.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            values.iter_mut().for_each(|v| *v /= norm);
        }
        Vector::from(values)
    }
}

#[async_trait]
impl EmbeddingProvider for KeywordEmbeddingProvider {
    async fn generate_embedding(
        &self,
        request: EmbeddingRequest,
    ) -> Result<EmbeddingResponse, EmbeddingProviderError> {
        Ok(EmbeddingResponse {
            embedding: self.embed(&request.text),
        })
    }

    async fn generate_embeddings(
        &self,
        request: BatchEmbeddingRequest,
    ) -> Result<BatchEmbeddingResponse, EmbeddingProviderError> {
        Ok(BatchEmbeddingResponse {
            embeddings: request.texts.iter().map(|t| self.embed(t)).collect(),
        })
    }

    fn model_name(&self) -> String {
        "keyword-hash".to_string()
    }
}

pub struct FailingEmbeddingProvider;

#[async_trait]
impl EmbeddingProvider for FailingEmbeddingProvider {
    async fn generate_embedding(
        &self,
        _request: EmbeddingRequest,
    ) -> Result<EmbeddingResponse, EmbeddingProviderError> {
        Err(EmbeddingProviderError::ServiceUnavailable)
    }

    async fn generate_embeddings(
        &self,
        _request: BatchEmbeddingRequest,
    ) -> Result<BatchEmbeddingResponse, EmbeddingProviderError> {
        Err(EmbeddingProviderError::ServiceUnavailable)
    }

    fn model_name(&self) -> String {
        "unavailable".to_string()
    }
}

/// Answers with the context it was given and remembers every request.
#[derive(Default)]
pub struct EchoChatProvider {
    requests: Mutex<Vec<ChatCompletionRequest>>,
}

impl EchoChatProvider {
    pub fn requests(&self) -> Vec<ChatCompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatCompletionProvider for EchoChatProvider {
    async fn complete(
        &self,
        request: ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, ChatCompletionError> {
        let context = request
            .messages
            .iter()
            .find(|m| m.role == ChatRole::System)
            .and_then(|m| m.content.split_once("Context:\n"))
            .map(|(_, context)| context.to_string())
            .unwrap_or_default();

        self.requests.lock().unwrap().push(request);

        Ok(ChatCompletionResponse {
            content: format!("From the document: {}", context),
        })
    }

    fn model_name(&self) -> String {
        "echo".to_string()
    }
}

pub struct FailingChatProvider;

#[async_trait]
impl ChatCompletionProvider for FailingChatProvider {
    async fn complete(
        &self,
        _request: ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, ChatCompletionError> {
        Err(ChatCompletionError::ApiError("model unavailable".to_string()))
    }

    fn model_name(&self) -> String {
        "unavailable".to_string()
    }
}

/// Returns the same document whatever it is asked to read.
pub struct StaticExtractor {
    document: ExtractedDocument,
}

impl StaticExtractor {
    pub fn new(document: ExtractedDocument) -> Self {
        Self { document }
    }
}

#[async_trait]
impl DocumentExtractor for StaticExtractor {
    async fn extract_pages(
        &self,
        _file_path: &Path,
    ) -> Result<ExtractedDocument, DocumentExtractionError> {
        Ok(self.document.clone())
    }

    async fn extract_pages_from_bytes(
        &self,
        _data: &[u8],
        _source: &str,
    ) -> Result<ExtractedDocument, DocumentExtractionError> {
        Ok(self.document.clone())
    }
}

/// Reports an unreadable page on every call.
pub struct FailingExtractor;

#[async_trait]
impl DocumentExtractor for FailingExtractor {
    async fn extract_pages(
        &self,
        _file_path: &Path,
    ) -> Result<ExtractedDocument, DocumentExtractionError> {
        Err(DocumentExtractionError::ExtractionFailed(
            "Failed to extract text from page 2".to_string(),
        ))
    }

    async fn extract_pages_from_bytes(
        &self,
        _data: &[u8],
        _source: &str,
    ) -> Result<ExtractedDocument, DocumentExtractionError> {
        Err(DocumentExtractionError::ExtractionFailed(
            "Failed to extract text from page 2".to_string(),
        ))
    }
}

/// Pool on the database named by `DATABASE_URL`, migrated once per test run.
/// `None` when the variable is unset so database tests can skip themselves.
pub fn test_pool() -> Option<DbPool> {
    static POOL: OnceLock<Option<DbPool>> = OnceLock::new();
    POOL.get_or_init(|| {
        let database_url = std::env::var("DATABASE_URL").ok()?;
        let pool = create_connection_pool(&database_url).expect("test database is reachable");
        run_migrations(&pool).expect("migrations apply");
        Some(pool)
    })
    .clone()
}

/// A minimal PDF with one Courier text line per page; `""` makes a blank page.
pub fn build_pdf(page_texts: &[&str]) -> Vec<u8> {
    build_pdf_with_page_labels(page_texts, None)
}

/// Same as `build_pdf`, with `page_labels` stored as the catalog's `/PageLabels`.
pub fn build_pdf_with_page_labels(page_texts: &[&str], page_labels: Option<Object>) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids: Vec<Object> = Vec::new();
    for text in page_texts {
        let operations = if text.is_empty() {
            Vec::new()
        } else {
            vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ]
        };
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().expect("content encodes"),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );
    let mut catalog = dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    };
    if let Some(page_labels) = page_labels {
        catalog.set("PageLabels", page_labels);
    }
    let catalog_id = doc.add_object(catalog);
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).expect("pdf saves");
    buffer
}
