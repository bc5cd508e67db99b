use std::collections::VecDeque;

use crate::application::ports::TextSplitter;
use crate::config::ChunkingConfig;

/// Recursive character splitter: tries paragraph breaks first, then lines, then
/// words, then single characters, and merges the pieces back into windows of at
/// most `chunk_size` characters that share up to `chunk_overlap` characters with
/// their predecessor.
#[derive(Debug, Clone)]
pub struct RecursiveCharacterSplitter {
    separators: Vec<&'static str>,
    chunk_size: usize,
    chunk_overlap: usize,
}

impl RecursiveCharacterSplitter {
    pub fn new(config: ChunkingConfig) -> Self {
        Self {
            separators: vec![
                "\n\n", // Double newline (paragraphs)
                "\n",   // Single newline
                " ",    // Space
                "",     // Character level
            ],
            chunk_size: config.chunk_size,
            chunk_overlap: config.chunk_overlap,
        }
    }

    fn recursive_split(&self, text: &str, separators: &[&'static str]) -> Vec<String> {
        let mut final_chunks = Vec::new();

        let mut separator = "";
        let mut remaining: &[&'static str] = &[];
        for (i, candidate) in separators.iter().enumerate() {
            if candidate.is_empty() {
                separator = candidate;
                break;
            }
            if text.contains(candidate) {
                separator = candidate;
                remaining = &separators[i + 1..];
                break;
            }
        }

        let splits: Vec<String> = if separator.is_empty() {
            text.chars().map(String::from).collect()
        } else {
            text.split(separator)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect()
        };

        let mut good_splits: Vec<String> = Vec::new();
        for split in splits {
            if char_len(&split) < self.chunk_size {
                good_splits.push(split);
                continue;
            }

            if !good_splits.is_empty() {
                final_chunks.extend(self.merge_splits(&good_splits, separator));
                good_splits.clear();
            }

            if remaining.is_empty() {
                final_chunks.push(split);
            } else {
                final_chunks.extend(self.recursive_split(&split, remaining));
            }
        }

        if !good_splits.is_empty() {
            final_chunks.extend(self.merge_splits(&good_splits, separator));
        }

        final_chunks
    }

    fn merge_splits(&self, splits: &[String], separator: &str) -> Vec<String> {
        let separator_len = char_len(separator);
        let mut docs = Vec::new();
        let mut current: VecDeque<&str> = VecDeque::new();
        let mut total = 0usize;

        for split in splits {
            let len = char_len(split);
            let joined_len = |current: &VecDeque<&str>| {
                if current.is_empty() { 0 } else { separator_len }
            };

            if total + len + joined_len(&current) > self.chunk_size {
                if !current.is_empty() {
                    if let Some(doc) = join_trimmed(&current, separator) {
                        docs.push(doc);
                    }

                    // Drop from the front until what is left fits in the overlap
                    // and leaves room for the next piece.
                    while total > self.chunk_overlap
                        || (total > 0 && total + len + joined_len(&current) > self.chunk_size)
                    {
                        let Some(front) = current.pop_front() else {
                            break;
                        };
                        total -= char_len(front);
                        if !current.is_empty() {
                            total -= separator_len;
                        }
                    }
                }
            }

            if !current.is_empty() {
                total += separator_len;
            }
            current.push_back(split);
            total += len;
        }

        if let Some(doc) = join_trimmed(&current, separator) {
            docs.push(doc);
        }

        docs
    }
}

impl Default for RecursiveCharacterSplitter {
    fn default() -> Self {
        Self::new(ChunkingConfig::default())
    }
}

impl TextSplitter for RecursiveCharacterSplitter {
    fn split_text(&self, text: &str) -> Vec<String> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        self.recursive_split(text, &self.separators)
            .into_iter()
            .map(|chunk| chunk.trim().to_string())
            .filter(|chunk| !chunk.is_empty())
            .collect()
    }

    fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn join_trimmed(parts: &VecDeque<&str>, separator: &str) -> Option<String> {
    let joined = parts.iter().copied().collect::<Vec<_>>().join(separator);
    let trimmed = joined.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
