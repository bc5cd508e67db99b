use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentChunk {
    id: Uuid,
    collection_name: String,
    content: String,
    page_label: String,
    source: String,
    chunk_index: i32,
    created_at: DateTime<Utc>,
}

impl DocumentChunk {
    pub fn new(
        collection_name: String,
        content: String,
        page_label: String,
        source: String,
        chunk_index: i32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            collection_name,
            content,
            page_label,
            source,
            chunk_index,
            created_at: Utc::now(),
        }
    }

    pub fn from_database(
        id: Uuid,
        collection_name: String,
        content: String,
        page_label: String,
        source: String,
        chunk_index: i32,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            collection_name,
            content,
            page_label,
            source,
            chunk_index,
            created_at,
        }
    }

    // Getters
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn collection_name(&self) -> &str {
        &self.collection_name
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn page_label(&self) -> &str {
        &self.page_label
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn chunk_index(&self) -> i32 {
        self.chunk_index
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn is_empty(&self) -> bool {
        self.content.trim().is_empty()
    }

    pub fn character_count(&self) -> usize {
        self.content.chars().count()
    }
}
