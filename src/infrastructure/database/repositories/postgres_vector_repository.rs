use async_trait::async_trait;
use diesel::prelude::*;
use pgvector::{Vector, VectorExpressionMethods};

use crate::domain::repositories::{
    VectorRepository,
    vector_repository::{
        EmbeddedChunk, SimilaritySearchResult, VectorRepositoryError, cosine_similarity,
    },
};
use crate::infrastructure::database::connection::{DbConnection, DbPool};
use crate::infrastructure::database::models::{DocumentChunkModel, NewDocumentChunkModel};
use crate::infrastructure::database::schema::document_chunks;

/// Postgres rejects statements with more than this many bind parameters.
const MAX_BIND_PARAMETERS: usize = 65535;
/// Columns bound per row of `NewDocumentChunkModel`.
const COLUMNS_PER_CHUNK: usize = 8;
const INSERT_BATCH_SIZE: usize = MAX_BIND_PARAMETERS / COLUMNS_PER_CHUNK;

/// pgvector-backed chunk index. Collections are rows sharing a `collection_name`.
pub struct PostgresVectorRepository {
    pool: DbPool,
}

impl PostgresVectorRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn get_connection(&self) -> Result<DbConnection, VectorRepositoryError> {
        self.pool.get().map_err(|e| {
            VectorRepositoryError::DatabaseError(format!("Failed to get database connection: {}", e))
        })
    }
}

fn to_models(documents: &[EmbeddedChunk]) -> Vec<NewDocumentChunkModel> {
    documents.iter().map(NewDocumentChunkModel::from).collect()
}

// Callers run this inside a transaction so a large document lands all or nothing.
fn insert_in_batches(
    conn: &mut DbConnection,
    models: &[NewDocumentChunkModel],
) -> QueryResult<usize> {
    let mut inserted = 0;
    for batch in models.chunks(INSERT_BATCH_SIZE) {
        inserted += diesel::insert_into(document_chunks::table)
            .values(batch)
            .execute(conn)?;
    }
    Ok(inserted)
}

#[async_trait]
impl VectorRepository for PostgresVectorRepository {
    async fn add_documents(
        &self,
        documents: &[EmbeddedChunk],
    ) -> Result<usize, VectorRepositoryError> {
        if documents.is_empty() {
            return Ok(0);
        }

        let models = to_models(documents);
        let mut conn = self.get_connection()?;

        tokio::task::spawn_blocking(move || {
            conn.transaction::<_, diesel::result::Error, _>(|conn| {
                insert_in_batches(conn, &models)
            })
            .map_err(|e| VectorRepositoryError::DatabaseError(format!("Failed to insert chunks: {}", e)))
        })
        .await
        .map_err(|e| VectorRepositoryError::DatabaseError(format!("Task join error: {}", e)))?
    }

    async fn replace_source_documents(
        &self,
        collection_name: &str,
        source: &str,
        documents: &[EmbeddedChunk],
    ) -> Result<(usize, usize), VectorRepositoryError> {
        let models = to_models(documents);
        let collection = collection_name.to_string();
        let source = source.to_string();
        let mut conn = self.get_connection()?;

        tokio::task::spawn_blocking(move || {
            conn.transaction::<_, diesel::result::Error, _>(|conn| {
                let deleted = diesel::delete(
                    document_chunks::table
                        .filter(document_chunks::collection_name.eq(&collection))
                        .filter(document_chunks::source.eq(&source)),
                )
                .execute(conn)?;

                let inserted = insert_in_batches(conn, &models)?;

                Ok((deleted, inserted))
            })
            .map_err(|e| VectorRepositoryError::DatabaseError(format!("Failed to replace chunks: {}", e)))
        })
        .await
        .map_err(|e| VectorRepositoryError::DatabaseError(format!("Task join error: {}", e)))?
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

        let collection = collection_name.to_string();
        let query = query_vector.clone();
        let limit = i64::try_from(limit)
            .map_err(|e| VectorRepositoryError::ValidationError(e.to_string()))?;
        let mut conn = self.get_connection()?;

        let models = tokio::task::spawn_blocking(move || {
            document_chunks::table
                .filter(document_chunks::collection_name.eq(&collection))
                .order(document_chunks::embedding.cosine_distance(query))
                .limit(limit)
                .select(DocumentChunkModel::as_select())
                .load(&mut conn)
                .map_err(|e| VectorRepositoryError::DatabaseError(format!("Failed to search chunks: {}", e)))
        })
        .await
        .map_err(|e| VectorRepositoryError::DatabaseError(format!("Task join error: {}", e)))??;

        Ok(models
            .into_iter()
            .map(|model| {
                let (chunk, embedding) = model.into_parts();
                SimilaritySearchResult {
                    similarity_score: cosine_similarity(query_vector, &embedding),
                    chunk,
                }
            })
            .collect())
    }

    async fn count(&self, collection_name: &str) -> Result<i64, VectorRepositoryError> {
        let collection = collection_name.to_string();
        let mut conn = self.get_connection()?;

        tokio::task::spawn_blocking(move || {
            document_chunks::table
                .filter(document_chunks::collection_name.eq(&collection))
                .count()
                .get_result(&mut conn)
                .map_err(|e| VectorRepositoryError::DatabaseError(format!("Failed to count chunks: {}", e)))
        })
        .await
        .map_err(|e| VectorRepositoryError::DatabaseError(format!("Task join error: {}", e)))?
    }
}
