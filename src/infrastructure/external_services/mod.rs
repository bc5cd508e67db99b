pub mod document_extractors;
pub mod ollama_embedding_provider;
pub mod openai_chat_client;
pub mod text_splitter;

pub use document_extractors::PdfExtractor;
pub use ollama_embedding_provider::OllamaEmbeddingProvider;
pub use openai_chat_client::OpenAiChatClient;
pub use text_splitter::RecursiveCharacterSplitter;
