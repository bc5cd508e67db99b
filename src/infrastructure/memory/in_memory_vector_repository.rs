use async_trait::async_trait;
use pgvector::Vector;
use tokio::sync::RwLock;

use crate::domain::repositories::{
    VectorRepository,
    vector_repository::{
        EmbeddedChunk, SimilaritySearchResult, VectorRepositoryError, cosine_similarity,
    },
};

/// Process-local chunk index used when no database is configured.
#[derive(Default)]
pub struct InMemoryVectorRepository {
    documents: RwLock<Vec<EmbeddedChunk>>,
}

impl InMemoryVectorRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn check_dimensions(documents: &[EmbeddedChunk]) -> Result<(), VectorRepositoryError> {
    let Some(first) = documents.first() else {
        return Ok(());
    };
    let dimensions = first.embedding.as_slice().len();

    if dimensions == 0 {
        return Err(VectorRepositoryError::VectorError(
            "Embedding is empty".to_string(),
        ));
    }
    if documents
        .iter()
        .any(|d| d.embedding.as_slice().len() != dimensions)
    {
        return Err(VectorRepositoryError::VectorError(
            "Embeddings in one batch must share a dimension".to_string(),
        ));
    }
    Ok(())
}

#[async_trait]
impl VectorRepository for InMemoryVectorRepository {
    async fn add_documents(
        &self,
        documents: &[EmbeddedChunk],
    ) -> Result<usize, VectorRepositoryError> {
        check_dimensions(documents)?;

        let mut stored = self.documents.write().await;
        stored.extend_from_slice(documents);
        Ok(documents.len())
    }

    async fn replace_source_documents(
        &self,
        collection_name: &str,
        source: &str,
        documents: &[EmbeddedChunk],
    ) -> Result<(usize, usize), VectorRepositoryError> {
        check_dimensions(documents)?;

        let mut stored = self.documents.write().await;
        let before = stored.len();
        stored.retain(|d| {
            d.chunk.collection_name() != collection_name || d.chunk.source() != source
        });
        let deleted = before - stored.len();
        stored.extend_from_slice(documents);

        Ok((deleted, documents.len()))
    }

    async fn similarity_search(
        &self,
        collection_name: &str,
        query_vector: &Vector,
        limit: usize,
    ) -> Result<Vec<SimilaritySearchResult>, VectorRepositoryError> {
        if query_vector.as_slice().is_empty() {
            return Err(VectorRepositoryError::VectorError(
                "Query vector is empty".to_string(),
            ));
        }

        let stored = self.documents.read().await;
        let mut results: Vec<SimilaritySearchResult> = stored
            .iter()
            .filter(|d| d.chunk.collection_name() == collection_name)
            .map(|d| SimilaritySearchResult {
                chunk: d.chunk.clone(),
                similarity_score: cosine_similarity(query_vector, &d.embedding),
            })
            .collect();

        results.sort_by(|a, b| b.similarity_score.total_cmp(&a.similarity_score));
        results.truncate(limit);

        Ok(results)
    }

    async fn count(&self, collection_name: &str) -> Result<i64, VectorRepositoryError> {
        let stored = self.documents.read().await;
        Ok(stored
            .iter()
            .filter(|d| d.chunk.collection_name() == collection_name)
            .count() as i64)
    }
}
