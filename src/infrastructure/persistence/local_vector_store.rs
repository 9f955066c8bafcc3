use std::cmp::Ordering;
use std::collections::HashMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::application::ports::{SearchResult, VectorStore, VectorStoreError};
use crate::domain::{Chunk, ChunkId, Embedding};

pub const INDEX_FILE_NAME: &str = "index.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct IndexEntry {
    chunk: Chunk,
    embedding: Embedding,
}

#[derive(Deserialize)]
struct IndexFile {
    embedding_model: String,
    entries: Vec<IndexEntry>,
}

#[derive(Serialize)]
struct IndexFileRef<'a> {
    embedding_model: &'a str,
    entries: &'a [IndexEntry],
}

/// Entries in insertion order plus each chunk's position, so upserts replace
/// in place without scanning.
#[derive(Default)]
struct Index {
    entries: Vec<IndexEntry>,
    positions: HashMap<ChunkId, usize>,
}

impl Index {
    fn from_entries(entries: Vec<IndexEntry>) -> Self {
        let mut index = Self::default();
        for entry in entries {
            index.insert(entry);
        }
        index
    }

    fn dimensions(&self) -> Option<usize> {
        self.entries.first().map(|e| e.embedding.dimensions())
    }

    fn insert(&mut self, entry: IndexEntry) {
        match self.positions.get(&entry.chunk.id) {
            Some(&pos) => self.entries[pos] = entry,
            None => {
                self.positions.insert(entry.chunk.id, self.entries.len());
                self.entries.push(entry);
            }
        }
    }
}

/// Flat cosine-similarity index kept in memory and persisted as a single
/// JSON file inside `persist_directory`.
pub struct LocalVectorStore {
    persist_directory: PathBuf,
    embedding_model: String,
    index: RwLock<Index>,
}

impl LocalVectorStore {
    /// Loads the persisted index if one exists, otherwise starts empty.
    pub async fn open(
        persist_directory: impl Into<PathBuf>,
        embedding_model: impl Into<String>,
    ) -> Result<Self, VectorStoreError> {
        let persist_directory = persist_directory.into();
        let embedding_model = embedding_model.into();
        let index_path = persist_directory.join(INDEX_FILE_NAME);

        let entries = match tokio::fs::read(&index_path).await {
            Ok(bytes) => {
                let index: IndexFile = serde_json::from_slice(&bytes).map_err(|e| {
                    VectorStoreError::LoadFailed(format!("{}: {}", index_path.display(), e))
                })?;
                if index.embedding_model != embedding_model {
                    return Err(VectorStoreError::ModelMismatch {
                        expected: embedding_model,
                        found: index.embedding_model,
                    });
                }
                tracing::info!(
                    path = %index_path.display(),
                    chunks = index.entries.len(),
                    "Loaded persisted vector index"
                );
                index.entries
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::info!(
                    path = %persist_directory.display(),
                    "No persisted vector index, starting empty"
                );
                Vec::new()
            }
            Err(e) => {
                return Err(VectorStoreError::LoadFailed(format!(
                    "{}: {}",
                    index_path.display(),
                    e
                )));
            }
        };

        Ok(Self {
            persist_directory,
            embedding_model,
            index: RwLock::new(Index::from_entries(entries)),
        })
    }
}

#[async_trait]
impl VectorStore for LocalVectorStore {
    async fn upsert(
        &self,
        chunks: &[Chunk],
        embeddings: &[Embedding],
    ) -> Result<(), VectorStoreError> {
        if chunks.len() != embeddings.len() {
            return Err(VectorStoreError::UpsertFailed(format!(
                "{} chunks but {} embeddings",
                chunks.len(),
                embeddings.len()
            )));
        }

        let mut index = self.index.write().await;
        let expected_dims = index
            .dimensions()
            .or_else(|| embeddings.first().map(Embedding::dimensions));

        // Validate the whole batch first so a rejected call leaves the index untouched.
        if let Some(bad) = embeddings
            .iter()
            .find(|e| Some(e.dimensions()) != expected_dims)
        {
            return Err(VectorStoreError::UpsertFailed(format!(
                "embedding has {} dimensions, index uses {}",
                bad.dimensions(),
                expected_dims.unwrap_or_default()
            )));
        }

        for (chunk, embedding) in chunks.iter().zip(embeddings) {
            index.insert(IndexEntry {
                chunk: chunk.clone(),
                embedding: embedding.clone(),
            });
        }

        Ok(())
    }

    async fn search(
        &self,
        embedding: &Embedding,
        top_k: usize,
    ) -> Result<Vec<SearchResult>, VectorStoreError> {
        let index = self.index.read().await;

        let mut results: Vec<SearchResult> = index
            .entries
            .iter()
            .map(|entry| SearchResult {
                chunk: entry.chunk.clone(),
                score: entry.embedding.cosine_similarity(embedding),
            })
            .collect();

        // Stable sort: equal scores keep insertion order.
        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        results.truncate(top_k);

        Ok(results)
    }

    async fn count(&self) -> Result<usize, VectorStoreError> {
        Ok(self.index.read().await.entries.len())
    }

    async fn persist(&self) -> Result<(), VectorStoreError> {
        let bytes = {
            let index = self.index.read().await;
            serde_json::to_vec(&IndexFileRef {
                embedding_model: &self.embedding_model,
                entries: index.entries.as_slice(),
            })
            .map_err(|e| VectorStoreError::PersistFailed(e.to_string()))?
        };

        let directory = self.persist_directory.clone();
        tokio::task::spawn_blocking(move || write_index(&directory, &bytes))
            .await
            .map_err(|e| VectorStoreError::PersistFailed(e.to_string()))?
            .map_err(|e| VectorStoreError::PersistFailed(e.to_string()))?;

        tracing::info!(path = %self.persist_directory.display(), "Vector index persisted");
        Ok(())
    }
}

/// Writes through a sibling temp file and renames it into place so readers
/// never observe a partial index.
fn write_index(directory: &Path, bytes: &[u8]) -> io::Result<()> {
    std::fs::create_dir_all(directory)?;
    let mut tmp = tempfile::NamedTempFile::new_in(directory)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(directory.join(INDEX_FILE_NAME))
        .map_err(|e| e.error)?;
    Ok(())
}
