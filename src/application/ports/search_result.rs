use crate::domain::Chunk;

/// A stored chunk and its similarity to the query embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub chunk: Chunk,
    pub score: f32,
}
