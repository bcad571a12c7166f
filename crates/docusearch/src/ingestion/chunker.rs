//! Recursive text chunking with page tracking
//!
//! Text is split at the highest-priority separator present (paragraph, line,
//! sentence, word, then single characters). Pieces shorter than the chunk size
//! are merged greedily; pieces that are still too long are split again with the
//! next separator. When a chunk is emitted, trailing pieces worth at most
//! `overlap` characters are carried into the next chunk.

use std::collections::VecDeque;

use crate::types::{Chunk, ChunkSource, Page};

/// Split points in priority order; the empty separator means "any character"
pub const DEFAULT_SEPARATORS: &[&str] = &["\n\n", "\n", ". ", " ", ""];

/// Text chunker with configurable size and overlap
#[derive(Debug, Clone)]
pub struct TextChunker {
    /// Maximum chunk size in characters
    chunk_size: usize,
    /// Overlap between adjacent chunks in characters
    overlap: usize,
    /// Separators in priority order, always ending with ""
    separators: Vec<&'static str>,
}

impl TextChunker {
    /// Create a new chunker
    ///
    /// A zero `chunk_size` is raised to 1 and `overlap` is clamped below it.
    pub fn new(chunk_size: usize, overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            chunk_size,
            overlap: overlap.min(chunk_size - 1),
            separators: DEFAULT_SEPARATORS.to_vec(),
        }
    }

    /// Maximum chunk size in characters
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Overlap in characters
    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Chunk every page of a document, numbering chunks across pages
    pub fn split_pages(&self, filename: &str, pages: &[Page]) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        let mut chunk_index = 0u32;

        for page in pages {
            for text in self.split_text(&page.text) {
                chunks.push(Chunk::new(
                    text,
                    ChunkSource::pdf(filename, page.number),
                    chunk_index,
                ));
                chunk_index += 1;
            }
        }

        chunks
    }

    /// Split raw text into trimmed, non-empty chunks
    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.split_recursive(text, &self.separators)
            .into_iter()
            .filter(|chunk| !chunk.trim().is_empty())
            .collect()
    }

    fn split_recursive(&self, text: &str, separators: &[&'static str]) -> Vec<String> {
        let mut final_chunks = Vec::new();

        // First separator that occurs in the text; "" always matches
        let mut separator = "";
        let mut remaining: &[&'static str] = &[];
        for (i, sep) in separators.iter().enumerate() {
            if sep.is_empty() {
                break;
            }
            if text.contains(sep) {
                separator = sep;
                remaining = &separators[i + 1..];
                break;
            }
        }

        let mut good_splits: Vec<(&str, usize)> = Vec::new();
        for piece in split_keeping_separator(text, separator) {
            let len = char_len(piece);
            if len < self.chunk_size {
                good_splits.push((piece, len));
                continue;
            }

            if !good_splits.is_empty() {
                final_chunks.extend(self.merge_splits(&good_splits));
                good_splits.clear();
            }

            if remaining.is_empty() {
                // Single character at the hard-cut level
                final_chunks.push(piece.to_string());
            } else {
                final_chunks.extend(self.split_recursive(piece, remaining));
            }
        }

        if !good_splits.is_empty() {
            final_chunks.extend(self.merge_splits(&good_splits));
        }

        final_chunks
    }

    /// Greedily merge short pieces into chunks of at most `chunk_size` characters
    fn merge_splits(&self, splits: &[(&str, usize)]) -> Vec<String> {
        let mut docs = Vec::new();
        let mut current: VecDeque<(&str, usize)> = VecDeque::new();
        let mut total = 0usize;

        for &(piece, len) in splits {
            if total + len > self.chunk_size && !current.is_empty() {
                if let Some(doc) = join_pieces(&current) {
                    docs.push(doc);
                }

                // Keep at most `overlap` characters, and make room for the next piece
                while total > self.overlap || (total + len > self.chunk_size && total > 0) {
                    match current.pop_front() {
                        Some((_, front_len)) => total -= front_len,
                        None => break,
                    }
                }
            }

            current.push_back((piece, len));
            total += len;
        }

        if let Some(doc) = join_pieces(&current) {
            docs.push(doc);
        }

        docs
    }
}

impl Default for TextChunker {
    fn default() -> Self {
        Self::new(1500, 300)
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

fn join_pieces(pieces: &VecDeque<(&str, usize)>) -> Option<String> {
    let joined: String = pieces.iter().map(|(piece, _)| *piece).collect();
    let trimmed = joined.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Split on `separator`, attaching each separator to the start of the piece after it
fn split_keeping_separator<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    if separator.is_empty() {
        return text
            .char_indices()
            .map(|(i, c)| &text[i..i + c.len_utf8()])
            .collect();
    }

    let mut splits = Vec::new();
    let mut last = 0;
    for (idx, _) in text.match_indices(separator) {
        if idx > last {
            splits.push(&text[last..idx]);
        }
        last = idx;
    }
    if last < text.len() {
        splits.push(&text[last..]);
    }

    splits
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// `count` words of "abcd" separated by single spaces
    fn words(count: usize) -> String {
        vec!["abcd"; count].join(" ")
    }

    #[test]
    fn test_short_page_is_one_chunk() {
        let chunker = TextChunker::new(1000, 200);
        let text = "A short page.";
        assert_eq!(chunker.split_text(text), vec![text.to_string()]);
    }

    #[test]
    fn test_empty_page_yields_nothing() {
        let chunker = TextChunker::new(1000, 200);
        assert!(chunker.split_text("").is_empty());
        assert!(chunker.split_text("  \n\n \t ").is_empty());
    }

    #[test]
    fn test_long_page_overlaps() {
        let chunker = TextChunker::new(1000, 200);
        let text = words(360); // 1799 characters

        let chunks = chunker.split_text(&text);
        assert_eq!(chunks.len(), 2);
        assert!(chunks.iter().all(|c| c.chars().count() <= 1000));

        // The second chunk starts with the last ~200 characters of the first
        let tail = &chunks[0][chunks[0].len() - 150..];
        assert!(chunks[1].starts_with(tail.trim_start()) || chunks[1].contains(tail));
        assert!(chunks[1].len() > 800);
    }

    #[test]
    fn test_paragraphs_preferred_over_words() {
        let chunker = TextChunker::new(60, 10);
        let first = "First paragraph talks about attention.";
        let second = "Second paragraph talks about memory.";
        let text = format!("{}\n\n{}", first, second);

        let chunks = chunker.split_text(&text);
        assert_eq!(chunks, vec![first.to_string(), second.to_string()]);
    }

    #[test]
    fn test_sentences_before_words() {
        let chunker = TextChunker::new(40, 0);
        let text = "Transformers use attention. Recurrent nets use state. Both learn.";

        // The separator travels with the piece that follows it
        let chunks = chunker.split_text(text);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0], "Transformers use attention");
        assert_eq!(chunks[1], ". Recurrent nets use state. Both learn.");
    }

    #[test]
    fn test_hard_cut_without_separators() {
        let chunker = TextChunker::new(10, 2);
        let text = "x".repeat(35);

        let chunks = chunker.split_text(&text);
        assert!(chunks.iter().all(|c| c.len() <= 10));
        assert!(chunks.len() >= 4);
    }

    #[test]
    fn test_split_keeping_separator() {
        assert_eq!(
            split_keeping_separator("a\n\nb\n\n\n\nc", "\n\n"),
            vec!["a", "\n\nb", "\n\n", "\n\nc"]
        );
        assert_eq!(split_keeping_separator("\n\nb", "\n\n"), vec!["\n\nb"]);
        assert_eq!(split_keeping_separator("aé", ""), vec!["a", "é"]);
    }

    #[test]
    fn test_split_pages_keeps_provenance() {
        let chunker = TextChunker::new(1000, 200);
        let pages = vec![
            Page::new(1, words(360)),
            Page::new(2, "x".repeat(400)),
            Page::new(3, ""),
        ];

        let chunks = chunker.split_pages("attention.pdf", &pages);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].source.page_number, 1);
        assert_eq!(chunks[1].source.page_number, 1);
        assert_eq!(chunks[2].source.page_number, 2);
        assert!(chunks.iter().all(|c| c.source.paper == "attention"));
        assert_eq!(
            chunks.iter().map(|c| c.chunk_index).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
    }

    proptest! {
        #[test]
        fn prop_chunks_never_exceed_size(
            text in "[a-zA-Z .\n]{0,600}",
            size in 5usize..200,
            overlap_ratio in 0.0f64..0.9,
        ) {
            let overlap = (size as f64 * overlap_ratio) as usize;
            let chunker = TextChunker::new(size, overlap);
            for chunk in chunker.split_text(&text) {
                prop_assert!(chunk.chars().count() <= size);
                prop_assert!(text.contains(&chunk));
            }
        }

        #[test]
        fn prop_every_word_is_covered(
            words in proptest::collection::vec("[a-z]{1,12}", 0..150),
            size in 20usize..300,
        ) {
            let text = words.join(" ");
            let chunker = TextChunker::new(size, size / 5);
            let chunks = chunker.split_text(&text);
            for word in &words {
                prop_assert!(
                    chunks.iter().any(|c| c.split(' ').any(|w| w == word)),
                    "word {} lost", word
                );
            }
        }
    }
}
