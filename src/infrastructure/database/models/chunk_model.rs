use chrono::{DateTime, Utc};
use diesel::prelude::*;
use pgvector::Vector;
use uuid::Uuid;

use crate::domain::entities::DocumentChunk;
use crate::domain::repositories::vector_repository::EmbeddedChunk;
use crate::infrastructure::database::schema::document_chunks;

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = document_chunks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct DocumentChunkModel {
    pub id: Uuid,
    pub collection_name: String,
    pub content: String,
    pub page_label: String,
    pub source: String,
    pub chunk_index: i32,
    pub embedding: Vector,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = document_chunks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewDocumentChunkModel {
    pub id: Uuid,
    pub collection_name: String,
    pub content: String,
    pub page_label: String,
    pub source: String,
    pub chunk_index: i32,
    pub embedding: Vector,
    pub created_at: DateTime<Utc>,
}

impl From<&EmbeddedChunk> for NewDocumentChunkModel {
    fn from(document: &EmbeddedChunk) -> Self {
        let chunk = &document.chunk;
        Self {
            id: chunk.id(),
            collection_name: chunk.collection_name().to_string(),
            content: chunk.content().to_string(),
            page_label: chunk.page_label().to_string(),
            source: chunk.source().to_string(),
            chunk_index: chunk.chunk_index(),
            embedding: document.embedding.clone(),
            created_at: chunk.created_at(),
        }
    }
}

impl DocumentChunkModel {
    /// Splits the row into the domain chunk and its stored embedding.
    pub fn into_parts(self) -> (DocumentChunk, Vector) {
        let chunk = DocumentChunk::from_database(
            self.id,
            self.collection_name,
            self.content,
            self.page_label,
            self.source,
            self.chunk_index,
            self.created_at,
        );
        (chunk, self.embedding)
    }
}
