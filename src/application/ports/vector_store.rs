use async_trait::async_trait;

use super::{SearchResult, VectorStoreError};
use crate::domain::{Chunk, Embedding};

#[async_trait]
pub trait VectorStore: Send + Sync {
    async fn upsert(
        &self,
        chunks: &[Chunk],
        embeddings: &[Embedding],
    ) -> Result<(), VectorStoreError>;

    /// Nearest chunks to `embedding`, best match first.
    async fn search(
        &self,
        embedding: &Embedding,
        top_k: usize,
    ) -> Result<Vec<SearchResult>, VectorStoreError>;

    async fn count(&self) -> Result<usize, VectorStoreError>;

    async fn persist(&self) -> Result<(), VectorStoreError>;
}
