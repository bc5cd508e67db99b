pub mod ingestion_service;
pub mod query_processor;
pub mod text_cleanup;

pub use ingestion_service::{IngestionMode, IngestionReport, IngestionService};
pub use query_processor::QueryProcessorService;
