//! Word-bounded chunking.
//!
//! Text is split on Unicode whitespace and consecutive words are grouped into chunks of at most
//! `size` words. Words inside a chunk are joined by a single space, so the original layout
//! (line breaks, indentation, repeated spaces) is not preserved.

use std::str::SplitWhitespace;

use super::types::{Chunk, ChunkingError};

/// Lazy iterator over the chunks of a text.
///
/// The iterator borrows the source text and keeps no state beyond its own cursor; calling
/// [`chunk_text`] again (or cloning the iterator) rescans from the start.
#[derive(Debug, Clone)]
pub struct WordChunks<'a> {
    words: SplitWhitespace<'a>,
    size: usize,
    next_index: usize,
}

impl Iterator for WordChunks<'_> {
    type Item = Chunk;

    fn next(&mut self) -> Option<Self::Item> {
        let mut text = String::new();
        for word in self.words.by_ref().take(self.size) {
            if !text.is_empty() {
                text.push(' ');
            }
            text.push_str(word);
        }

        if text.is_empty() {
            return None;
        }

        let chunk = Chunk::new(self.next_index, text);
        self.next_index += 1;
        Some(chunk)
    }
}

impl std::iter::FusedIterator for WordChunks<'_> {}

/// Split `text` into chunks of at most `size` words.
///
/// Fails fast with [`ChunkingError::InvalidChunkSize`] when `size` is zero. Empty or
/// whitespace-only input yields no chunks.
pub fn chunk_text(text: &str, size: usize) -> Result<WordChunks<'_>, ChunkingError> {
    if size == 0 {
        return Err(ChunkingError::InvalidChunkSize);
    }

    Ok(WordChunks {
        words: text.split_whitespace(),
        size,
        next_index: 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::ChunkSet;
    use proptest::prelude::*;

    fn texts(text: &str, size: usize) -> Vec<String> {
        chunk_text(text, size)
            .expect("valid size")
            .map(Chunk::into_text)
            .collect()
    }

    #[test]
    fn groups_words_by_size() {
        assert_eq!(
            texts("one two three four five", 2),
            vec!["one two", "three four", "five"]
        );
    }

    #[test]
    fn empty_input_yields_nothing() {
        assert!(texts("", 4).is_empty());
        assert!(texts(" \n\t  ", 4).is_empty());
    }

    #[test]
    fn zero_size_is_rejected() {
        assert_eq!(
            chunk_text("anything", 0).expect_err("zero size"),
            ChunkingError::InvalidChunkSize
        );
    }

    #[test]
    fn collapses_whitespace_runs() {
        assert_eq!(
            texts("  alpha\n\nbeta \t gamma  delta\r\n", 3),
            vec!["alpha beta gamma", "delta"]
        );
    }

    #[test]
    fn indexes_follow_insertion_order() {
        let indexes: Vec<usize> = chunk_text("a b c d e", 2)
            .expect("valid size")
            .map(|chunk| chunk.index())
            .collect();
        assert_eq!(indexes, vec![0, 1, 2]);
    }

    #[test]
    fn iterator_is_restartable() {
        let chunks = chunk_text("a b c d e", 2).expect("valid size");
        let first: Vec<Chunk> = chunks.clone().collect();
        let second: Vec<Chunk> = chunks.collect();
        assert_eq!(first, second);
        assert_eq!(first, chunk_text("a b c d e", 2).expect("valid").collect::<Vec<_>>());
    }

    #[test]
    fn six_hundred_words_split_into_three_chunks() {
        let text = (0..600)
            .map(|n| format!("w{n}"))
            .collect::<Vec<_>>()
            .join(" ");
        let set = ChunkSet::from_text(&text, 256).expect("valid size");
        let counts: Vec<usize> = set.iter().map(Chunk::word_count).collect();
        assert_eq!(counts, vec![256, 256, 88]);
    }

    proptest! {
        #[test]
        fn rejoined_chunks_reproduce_words(
            words in proptest::collection::vec("[a-zA-Z0-9.,;!?'-]{1,12}", 0..200),
            separators in proptest::collection::vec("[ \t\n]{1,3}", 0..200),
            size in 1usize..50,
        ) {
            let mut text = String::new();
            for (i, word) in words.iter().enumerate() {
                text.push_str(word);
                text.push_str(separators.get(i).map(String::as_str).unwrap_or(" "));
            }

            let chunks: Vec<Chunk> = chunk_text(&text, size).expect("valid size").collect();
            let rejoined = chunks
                .iter()
                .map(Chunk::text)
                .collect::<Vec<_>>()
                .join(" ");
            prop_assert_eq!(rejoined, words.join(" "));
            for chunk in &chunks {
                prop_assert!(chunk.word_count() >= 1);
                prop_assert!(chunk.word_count() <= size);
            }
            if let Some((last, rest)) = chunks.split_last() {
                for chunk in rest {
                    prop_assert_eq!(chunk.word_count(), size);
                }
                prop_assert!(last.word_count() <= size);
            }
        }
    }
}
