use std::collections::VecDeque;

use crate::application::ports::{TextSplitter, TextSplitterError};
use crate::domain::{Chunk, DocumentId};

/// Splits on a literal separator, then greedily merges the pieces back into
/// chunks of at most `chunk_size` characters, carrying up to `chunk_overlap`
/// characters of trailing pieces into the next chunk.
///
/// A single piece longer than `chunk_size` becomes its own oversized chunk.
pub struct CharacterTextSplitter {
    separator: String,
    chunk_size: usize,
    chunk_overlap: usize,
}

impl CharacterTextSplitter {
    pub fn new(
        separator: impl Into<String>,
        chunk_size: usize,
        chunk_overlap: usize,
    ) -> Result<Self, TextSplitterError> {
        if chunk_size == 0 {
            return Err(TextSplitterError::InvalidConfiguration(
                "chunk_size must be greater than zero".to_string(),
            ));
        }
        if chunk_overlap > chunk_size {
            return Err(TextSplitterError::InvalidConfiguration(format!(
                "chunk_overlap ({}) exceeds chunk_size ({})",
                chunk_overlap, chunk_size
            )));
        }
        Ok(Self {
            separator: separator.into(),
            chunk_size,
            chunk_overlap,
        })
    }

    pub fn split_text(&self, text: &str) -> Vec<String> {
        // An empty separator splits between every character.
        let pieces: Vec<&str> = text
            .split(self.separator.as_str())
            .filter(|piece| !piece.is_empty())
            .collect();
        self.merge_pieces(&pieces)
    }

    fn merge_pieces(&self, pieces: &[&str]) -> Vec<String> {
        let separator_len = self.separator.chars().count();
        let joiner = |current: &VecDeque<&str>| if current.is_empty() { 0 } else { separator_len };

        let mut docs = Vec::new();
        let mut current: VecDeque<&str> = VecDeque::new();
        let mut total = 0usize;

        for &piece in pieces {
            let len = piece.chars().count();

            if total + len + joiner(&current) > self.chunk_size {
                if total > self.chunk_size {
                    tracing::warn!(
                        length = total,
                        chunk_size = self.chunk_size,
                        "Created a chunk longer than the configured size"
                    );
                }

                if !current.is_empty() {
                    if let Some(doc) = self.join(&current) {
                        docs.push(doc);
                    }

                    while total > self.chunk_overlap
                        || (total > 0 && total + len + joiner(&current) > self.chunk_size)
                    {
                        let trailing_separator = if current.len() > 1 { separator_len } else { 0 };
                        let Some(first) = current.pop_front() else {
                            break;
                        };
                        total -= first.chars().count() + trailing_separator;
                    }
                }
            }

            current.push_back(piece);
            total += len + if current.len() > 1 { separator_len } else { 0 };
        }

        if let Some(doc) = self.join(&current) {
            docs.push(doc);
        }

        docs
    }

    fn join(&self, pieces: &VecDeque<&str>) -> Option<String> {
        let joined = pieces
            .iter()
            .copied()
            .collect::<Vec<_>>()
            .join(&self.separator);
        let trimmed = joined.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }
}

impl TextSplitter for CharacterTextSplitter {
    fn split(&self, text: &str, document_id: DocumentId) -> Result<Vec<Chunk>, TextSplitterError> {
        Ok(self
            .split_text(text)
            .into_iter()
            .enumerate()
            .map(|(offset, chunk_text)| Chunk::new(chunk_text, document_id, offset))
            .collect())
    }
}
