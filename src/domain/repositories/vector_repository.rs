use async_trait::async_trait;
use pgvector::Vector;

use crate::domain::entities::DocumentChunk;

#[derive(Debug)]
pub enum VectorRepositoryError {
    DatabaseError(String),
    ValidationError(String),
    VectorError(String),
}

impl std::fmt::Display for VectorRepositoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VectorRepositoryError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            VectorRepositoryError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            VectorRepositoryError::VectorError(msg) => write!(f, "Vector error: {}", msg),
        }
    }
}

impl std::error::Error for VectorRepositoryError {}

/// A chunk paired with the embedding it is indexed under.
#[derive(Debug, Clone)]
pub struct EmbeddedChunk {
    pub chunk: DocumentChunk,
    pub embedding: Vector,
}

#[derive(Debug, Clone)]
pub struct SimilaritySearchResult {
    pub chunk: DocumentChunk,
    pub similarity_score: f32,
}

#[async_trait]
pub trait VectorRepository: Send + Sync {
    /// Append all documents in one batch; either every row lands or none does.
    async fn add_documents(&self, documents: &[EmbeddedChunk])
    -> Result<usize, VectorRepositoryError>;

    /// Remove what was previously ingested from `source` into `collection_name`
    /// and insert `documents`, atomically. Returns (deleted, inserted).
    async fn replace_source_documents(
        &self,
        collection_name: &str,
        source: &str,
        documents: &[EmbeddedChunk],
    ) -> Result<(usize, usize), VectorRepositoryError>;

    /// Top-`limit` chunks of the collection ordered by cosine similarity, best first.
    async fn similarity_search(
        &self,
        collection_name: &str,
        query_vector: &Vector,
        limit: usize,
    ) -> Result<Vec<SimilaritySearchResult>, VectorRepositoryError>;

    async fn count(&self, collection_name: &str) -> Result<i64, VectorRepositoryError>;
}

pub fn cosine_similarity(a: &Vector, b: &Vector) -> f32 {
    let a_slice = a.as_slice();
    let b_slice = b.as_slice();

    if a_slice.len() != b_slice.len() {
        return 0.0;
    }

    let dot_product: f32 = a_slice.iter().zip(b_slice.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a_slice.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b_slice.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}
