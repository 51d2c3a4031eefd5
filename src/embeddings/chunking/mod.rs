
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::path::PathBuf;
use tracing::{debug, warn};

use crate::ingestion::Document;

/// Breakpoints tried in order; the trailing empty separator is a hard cut between characters
pub const DEFAULT_SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

/// Represents a chunk of document text ready for embedding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChunk {
    /// The chunk text
    pub content: String,
    /// Path of the file the chunk was cut from
    pub source: PathBuf,
    /// 0-based page number for paginated sources
    pub page: Option<u32>,
    /// Position of this chunk within the ingestion run
    pub chunk_index: usize,
}

/// Configuration for document chunking.
///
/// Sizes are measured in characters, not bytes or tokens.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Maximum chunk length
    pub chunk_size: usize,
    /// Length of the tail carried over into the next chunk
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    #[inline]
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

/// Chunk a set of documents, numbering chunks across the whole run
#[inline]
pub fn chunk_documents(documents: &[Document], config: &ChunkingConfig) -> Vec<TextChunk> {
    let mut chunks = Vec::new();

    for document in documents {
        for content in split_text(&document.content, config) {
            chunks.push(TextChunk {
                content,
                source: document.source.clone(),
                page: document.page,
                chunk_index: chunks.len(),
            });
        }
    }

    debug!(
        "Chunked {} documents into {} chunks (avg {} chars)",
        documents.len(),
        chunks.len(),
        chunks.iter().map(|c| char_len(&c.content)).sum::<usize>() / chunks.len().max(1)
    );

    chunks
}

/// Split a single text into overlapping chunks, preferring natural breakpoints
#[inline]
pub fn split_text(text: &str, config: &ChunkingConfig) -> Vec<String> {
    split_recursive(text, &DEFAULT_SEPARATORS, config)
}

fn split_recursive(text: &str, separators: &[&str], config: &ChunkingConfig) -> Vec<String> {
    let mut chunks = Vec::new();

    // The first separator present in the text wins
    let mut separator = separators.last().copied().unwrap_or_default();
    let mut remaining: &[&str] = &[];
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

    let mut good_splits: Vec<&str> = Vec::new();

    for piece in split_keeping_separator(text, separator) {
        if char_len(piece) < config.chunk_size {
            good_splits.push(piece);
            continue;
        }

        if !good_splits.is_empty() {
            chunks.extend(merge_splits(&good_splits, config));
            good_splits.clear();
        }

        if remaining.is_empty() {
            chunks.push(piece.to_string());
        } else {
            chunks.extend(split_recursive(piece, remaining, config));
        }
    }

    if !good_splits.is_empty() {
        chunks.extend(merge_splits(&good_splits, config));
    }

    chunks
}

/// Split on `separator`, attaching each separator to the start of the piece after it.
/// An empty separator splits between every character.
fn split_keeping_separator<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    if separator.is_empty() {
        return text
            .char_indices()
            .filter_map(|(i, c)| text.get(i..i + c.len_utf8()))
            .collect();
    }

    let mut boundaries: Vec<usize> = text.match_indices(separator).map(|(i, _)| i).collect();
    boundaries.push(text.len());

    let mut pieces = Vec::with_capacity(boundaries.len());
    let mut start = 0;
    for end in boundaries {
        if let Some(piece) = text.get(start..end).filter(|p| !p.is_empty()) {
            pieces.push(piece);
        }
        start = end;
    }

    pieces
}

/// Greedily merge small pieces into windows of at most `chunk_size` characters,
/// carrying up to `chunk_overlap` characters from the end of one window into the next
fn merge_splits(splits: &[&str], config: &ChunkingConfig) -> Vec<String> {
    let mut docs = Vec::new();
    let mut current: VecDeque<&str> = VecDeque::new();
    let mut total = 0;

    for split in splits {
        let len = char_len(split);

        if total + len > config.chunk_size {
            if total > config.chunk_size {
                warn!(
                    "Created a chunk of size {}, which is longer than the specified {}",
                    total, config.chunk_size
                );
            }

            if !current.is_empty() {
                if let Some(doc) = join_pieces(&current) {
                    docs.push(doc);
                }

                while total > config.chunk_overlap
                    || (total + len > config.chunk_size && total > 0)
                {
                    let Some(front) = current.pop_front() else {
                        break;
                    };
                    total -= char_len(front);
                }
            }
        }

        current.push_back(split);
        total += len;
    }

    if let Some(doc) = join_pieces(&current) {
        docs.push(doc);
    }

    docs
}

fn join_pieces(pieces: &VecDeque<&str>) -> Option<String> {
    let joined: String = pieces.iter().copied().collect();
    let trimmed = joined.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[inline]
fn char_len(text: &str) -> usize {
    text.chars().count()
}
