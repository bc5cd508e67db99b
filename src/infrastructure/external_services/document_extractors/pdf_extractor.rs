use async_trait::async_trait;
use lopdf::{Document, Object, decode_text_string};
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use std::collections::BTreeMap;
use std::path::Path;

use crate::application::ports::document_extractor::{
    DocumentExtractionError, DocumentExtractor, ExtractedDocument, ExtractedPage,
};

// Deeper number trees than this are treated as malformed.
const MAX_LABEL_TREE_DEPTH: usize = 16;

/// Extracts text page by page. Pages are labelled from the document's
/// `/PageLabels` when it has them, otherwise with their 1-based number.
pub struct PdfExtractor {
    password: String,
}

impl PdfExtractor {
    pub fn new() -> Self {
        Self {
            password: String::new(),
        }
    }

    fn load(&self, data: &[u8]) -> Result<Document, DocumentExtractionError> {
        let mut doc = Document::load_mem(data)
            .map_err(|e| DocumentExtractionError::CorruptedFile(e.to_string()))?;

        if doc.is_encrypted() {
            doc.decrypt(&self.password).map_err(|_e| {
                DocumentExtractionError::ExtractionFailed(
                    "Failed to decrypt PDF - invalid password".to_string(),
                )
            })?;
        }

        Ok(doc)
    }

    fn extract_page_texts(
        &self,
        doc: &Document,
    ) -> Result<BTreeMap<u32, String>, DocumentExtractionError> {
        let extracted_pages: Vec<Result<(u32, String), String>> = doc
            .get_pages()
            .into_par_iter()
            .map(|(page_num, _): (u32, (u32, u16))| -> Result<(u32, String), String> {
                let text = doc.extract_text(&[page_num]).map_err(|e| {
                    format!("Failed to extract text from page {}: {}", page_num, e)
                })?;

                let lines: Vec<&str> = text
                    .split('\n')
                    .map(|s| s.trim_end())
                    .filter(|s| !s.is_empty())
                    .collect();

                Ok((page_num, lines.join("\n")))
            })
            .collect();

        collect_pages(extracted_pages)
    }
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Any page that failed to extract fails the whole document.
fn collect_pages(
    extracted_pages: Vec<Result<(u32, String), String>>,
) -> Result<BTreeMap<u32, String>, DocumentExtractionError> {
    let mut page_texts = BTreeMap::new();
    let mut errors = Vec::new();

    for page_result in extracted_pages {
        match page_result {
            Ok((page_num, text)) => {
                page_texts.insert(page_num, text);
            }
            Err(e) => errors.push(e),
        }
    }

    if !errors.is_empty() {
        return Err(DocumentExtractionError::ExtractionFailed(errors.join("; ")));
    }

    Ok(page_texts)
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum NumberingStyle {
    Decimal,
    UpperRoman,
    LowerRoman,
    UpperLetters,
    LowerLetters,
}

/// One entry of the `/PageLabels` number tree, covering pages from its start
/// index up to the next entry.
#[derive(Debug, Clone, PartialEq)]
struct LabelRange {
    style: Option<NumberingStyle>,
    prefix: String,
    first_number: i64,
}

impl LabelRange {
    fn parse(doc: &Document, object: &Object) -> Option<Self> {
        let (_, object) = doc.dereference(object).ok()?;
        let dict = object.as_dict().ok()?;

        let style = match dict.get(b"S").and_then(Object::as_name) {
            Ok(b"D") => Some(NumberingStyle::Decimal),
            Ok(b"R") => Some(NumberingStyle::UpperRoman),
            Ok(b"r") => Some(NumberingStyle::LowerRoman),
            Ok(b"A") => Some(NumberingStyle::UpperLetters),
            Ok(b"a") => Some(NumberingStyle::LowerLetters),
            _ => None,
        };
        let prefix = dict
            .get(b"P")
            .ok()
            .and_then(|p| decode_text_string(p).ok())
            .unwrap_or_default();
        let first_number = dict
            .get(b"St")
            .and_then(Object::as_i64)
            .unwrap_or(1)
            .max(1);

        Some(Self {
            style,
            prefix,
            first_number,
        })
    }

    fn label(&self, offset: i64) -> String {
        let number = self.first_number + offset;
        let numeral = match self.style {
            Some(NumberingStyle::Decimal) => number.to_string(),
            Some(NumberingStyle::UpperRoman) => to_roman(number),
            Some(NumberingStyle::LowerRoman) => to_roman(number).to_lowercase(),
            Some(NumberingStyle::UpperLetters) => to_letters(number),
            Some(NumberingStyle::LowerLetters) => to_letters(number).to_lowercase(),
            None => String::new(),
        };
        format!("{}{}", self.prefix, numeral)
    }
}

/// Labels for `page_count` pages, or `None` when the document has no usable
/// `/PageLabels` tree.
fn page_labels(doc: &Document, page_count: usize) -> Option<Vec<String>> {
    let root = doc.catalog().ok()?.get(b"PageLabels").ok()?;

    let mut ranges = Vec::new();
    collect_label_ranges(doc, root, 0, &mut ranges);
    ranges.sort_by_key(|(start, _)| *start);

    // The tree must cover the first page for every page to get a label
    if ranges.first().map(|(start, _)| *start) != Some(0) {
        return None;
    }

    let labels = (0..page_count as i64)
        .map(|index| {
            let (start, range) = ranges
                .iter()
                .rev()
                .find(|(start, _)| *start <= index)
                .unwrap_or(&ranges[0]);
            range.label(index - start)
        })
        .collect();

    Some(labels)
}

fn collect_label_ranges(
    doc: &Document,
    node: &Object,
    depth: usize,
    ranges: &mut Vec<(i64, LabelRange)>,
) {
    if depth > MAX_LABEL_TREE_DEPTH {
        return;
    }
    let Ok((_, node)) = doc.dereference(node) else {
        return;
    };
    let Ok(node) = node.as_dict() else {
        return;
    };

    if let Ok(nums) = node.get(b"Nums").and_then(Object::as_array) {
        for pair in nums.chunks_exact(2) {
            let start = pair[0].as_i64().unwrap_or(-1);
            if start < 0 {
                continue;
            }
            if let Some(range) = LabelRange::parse(doc, &pair[1]) {
                ranges.push((start, range));
            }
        }
    }

    if let Ok(kids) = node.get(b"Kids").and_then(Object::as_array) {
        for kid in kids {
            collect_label_ranges(doc, kid, depth + 1, ranges);
        }
    }
}

fn to_roman(mut number: i64) -> String {
    const NUMERALS: [(i64, &str); 13] = [
        (1000, "M"),
        (900, "CM"),
        (500, "D"),
        (400, "CD"),
        (100, "C"),
        (90, "XC"),
        (50, "L"),
        (40, "XL"),
        (10, "X"),
        (9, "IX"),
        (5, "V"),
        (4, "IV"),
        (1, "I"),
    ];

    let mut roman = String::new();
    for (value, numeral) in NUMERALS {
        while number >= value {
            roman.push_str(numeral);
            number -= value;
        }
    }
    roman
}

// A..Z, then AA..ZZ, then AAA..: the letter repeats once per pass through the alphabet.
fn to_letters(number: i64) -> String {
    if number < 1 {
        return String::new();
    }
    let letter = (b'A' + ((number - 1) % 26) as u8) as char;
    let repeat = ((number - 1) / 26 + 1) as usize;
    letter.to_string().repeat(repeat)
}

#[async_trait]
impl DocumentExtractor for PdfExtractor {
    async fn extract_pages(
        &self,
        file_path: &Path,
    ) -> Result<ExtractedDocument, DocumentExtractionError> {
        let data = tokio::fs::read(file_path).await.map_err(|e| {
            DocumentExtractionError::IoError(format!("{}: {}", file_path.display(), e))
        })?;

        self.extract_pages_from_bytes(&data, &file_path.to_string_lossy())
            .await
    }

    async fn extract_pages_from_bytes(
        &self,
        data: &[u8],
        source: &str,
    ) -> Result<ExtractedDocument, DocumentExtractionError> {
        let doc = self.load(data)?;
        let page_texts = self
            .extract_page_texts(&doc)
            .inspect_err(|e| tracing::error!("{}: {}", source, e))?;

        let labels = page_labels(&doc, page_texts.len());
        if labels.is_none() {
            tracing::debug!("{} has no page labels, using page numbers", source);
        }

        let pages = page_texts
            .into_iter()
            .enumerate()
            .map(|(index, (page_num, text))| ExtractedPage {
                page_label: labels
                    .as_ref()
                    .and_then(|labels| labels.get(index).cloned())
                    .unwrap_or_else(|| page_num.to_string()),
                text,
            })
            .collect();

        Ok(ExtractedDocument {
            source: source.to_string(),
            pages,
        })
    }
}
