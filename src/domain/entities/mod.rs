pub mod document_chunk;
pub mod query_job;

pub use document_chunk::DocumentChunk;
pub use query_job::QueryJob;
