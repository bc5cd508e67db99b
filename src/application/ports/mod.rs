pub mod chat_completion;
pub mod document_extractor;
pub mod embedding_provider;
pub mod job_queue;
pub mod text_splitter;

pub use chat_completion::ChatCompletionProvider;
pub use document_extractor::DocumentExtractor;
pub use embedding_provider::EmbeddingProvider;
pub use job_queue::JobQueue;
pub use text_splitter::TextSplitter;
