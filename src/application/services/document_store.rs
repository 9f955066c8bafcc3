use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::application::ports::{
    Embedder, EmbedderError, TextSplitter, TextSplitterError, VectorStore, VectorStoreError,
};
use crate::domain::{Chunk, DocumentId};

const EMBED_BATCH_SIZE: usize = 32;

/// Loads text documents into a vector store and answers similarity queries
/// against it.
pub struct DocumentStore<V>
where
    V: VectorStore,
{
    embedder: Arc<dyn Embedder>,
    vector_store: Arc<V>,
    text_splitter: Arc<dyn TextSplitter>,
}

impl<V> DocumentStore<V>
where
    V: VectorStore,
{
    pub fn new(
        embedder: Arc<dyn Embedder>,
        vector_store: Arc<V>,
        text_splitter: Arc<dyn TextSplitter>,
    ) -> Self {
        Self {
            embedder,
            vector_store,
            text_splitter,
        }
    }

    /// Reads a UTF-8 text file, splits it and indexes every chunk. Returns
    /// the number of chunks added.
    #[tracing::instrument(skip(self), fields(path = %path.display()))]
    pub async fn load_documents(&self, path: &Path) -> Result<usize, DocumentStoreError> {
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| DocumentStoreError::Load {
                path: path.to_path_buf(),
                source,
            })?;

        let chunks = self.text_splitter.split(&text, DocumentId::new())?;
        if chunks.is_empty() {
            tracing::warn!("Document produced no chunks");
            return Ok(0);
        }

        // Embed everything before touching the index so a failed batch leaves
        // no part of the document behind.
        let mut embeddings = Vec::with_capacity(chunks.len());
        for batch in chunks.chunks(EMBED_BATCH_SIZE) {
            let texts: Vec<&str> = batch.iter().map(|c| c.text.as_str()).collect();
            embeddings.extend(self.embedder.embed_batch(&texts).await?);
        }
        self.vector_store.upsert(&chunks, &embeddings).await?;

        tracing::info!(chunks = chunks.len(), "Document indexed");
        Ok(chunks.len())
    }

    /// Up to `k` chunks ordered from most to least similar. An empty store
    /// yields an empty result without touching the embedder.
    pub async fn similarity_search(
        &self,
        query: &str,
        k: usize,
    ) -> Result<Vec<Chunk>, DocumentStoreError> {
        if k == 0 || self.vector_store.count().await? == 0 {
            return Ok(Vec::new());
        }

        let embedding = self.embedder.embed(query).await?;
        let results = self.vector_store.search(&embedding, k).await?;

        tracing::debug!(
            results = results.len(),
            best_score = results.first().map(|r| r.score),
            "Similarity search completed"
        );

        Ok(results.into_iter().map(|r| r.chunk).collect())
    }

    pub async fn chunk_count(&self) -> Result<usize, DocumentStoreError> {
        Ok(self.vector_store.count().await?)
    }

    pub async fn persist(&self) -> Result<(), DocumentStoreError> {
        Ok(self.vector_store.persist().await?)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DocumentStoreError {
    #[error("failed to read {}: {source}", path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("splitting: {0}")]
    Splitting(#[from] TextSplitterError),
    #[error("embedding: {0}")]
    Embedding(#[from] EmbedderError),
    #[error("vector store: {0}")]
    VectorStore(#[from] VectorStoreError),
}
