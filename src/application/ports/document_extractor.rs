use async_trait::async_trait;
use std::path::Path;

#[derive(Debug)]
pub enum DocumentExtractionError {
    CorruptedFile(String),
    ExtractionFailed(String),
    IoError(String),
}

impl std::fmt::Display for DocumentExtractionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentExtractionError::CorruptedFile(msg) => write!(f, "Corrupted file: {}", msg),
            DocumentExtractionError::ExtractionFailed(msg) => {
                write!(f, "Extraction failed: {}", msg)
            }
            DocumentExtractionError::IoError(msg) => write!(f, "IO error: {}", msg),
        }
    }
}

impl std::error::Error for DocumentExtractionError {}

/// Text of a single page, labelled the way readers refer to it.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedPage {
    pub page_label: String,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct ExtractedDocument {
    pub source: String,
    pub pages: Vec<ExtractedPage>,
}

impl ExtractedDocument {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn text_length(&self) -> usize {
        self.pages.iter().map(|page| page.text.chars().count()).sum()
    }
}

/// A page that cannot be read fails the whole document.
#[async_trait]
pub trait DocumentExtractor: Send + Sync {
    async fn extract_pages(
        &self,
        file_path: &Path,
    ) -> Result<ExtractedDocument, DocumentExtractionError>;

    async fn extract_pages_from_bytes(
        &self,
        data: &[u8],
        source: &str,
    ) -> Result<ExtractedDocument, DocumentExtractionError>;
}
