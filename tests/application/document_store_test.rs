use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use voxrag::application::ports::{Embedder, EmbedderError, VectorStore};
use voxrag::application::services::{DocumentStore, DocumentStoreError};
use voxrag::domain::Embedding;
use voxrag::infrastructure::persistence::LocalVectorStore;
use voxrag::infrastructure::text_processing::CharacterTextSplitter;

const KEYWORDS: [&str; 3] = ["cat", "dog", "fish"];

/// Embeds text as keyword presence so similarity is predictable.
#[derive(Default)]
struct KeywordEmbedder {
    calls: AtomicUsize,
}

impl KeywordEmbedder {
    fn vector(text: &str) -> Embedding {
        let lower = text.to_lowercase();
        let mut values: Vec<f32> = KEYWORDS
            .iter()
            .map(|k| if lower.contains(k) { 1.0 } else { 0.0 })
            .collect();
        values.push(0.01);
        Embedding::new(values)
    }
}

#[async_trait::async_trait]
impl Embedder for KeywordEmbedder {
    async fn embed(&self, text: &str) -> Result<Embedding, EmbedderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Self::vector(text))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>, EmbedderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts.iter().map(|t| Self::vector(t)).collect())
    }
}

async fn create_store(
    dir: &tempfile::TempDir,
) -> (Arc<KeywordEmbedder>, DocumentStore<LocalVectorStore>) {
    let embedder = Arc::new(KeywordEmbedder::default());
    let vector_store = LocalVectorStore::open(dir.path().join("db"), "keyword")
        .await
        .unwrap();
    let store = DocumentStore::new(
        embedder.clone(),
        Arc::new(vector_store),
        Arc::new(CharacterTextSplitter::new("\n", 60, 0).unwrap()),
    );
    (embedder, store)
}

fn write_document(dir: &tempfile::TempDir, name: &str, body: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, body).unwrap();
    path
}

#[tokio::test]
async fn given_text_file_when_loading_then_indexes_each_line_group() {
    let dir = tempfile::TempDir::new().unwrap();
    let (_, store) = create_store(&dir).await;
    let path = write_document(
        &dir,
        "pets.txt",
        "The cat sleeps on the warm windowsill all afternoon long\nA dog barks at the mail carrier every single morning\nThe fish circles its bowl slowly",
    );

    let added = store.load_documents(&path).await.unwrap();

    assert_eq!(added, 3);
    assert_eq!(store.chunk_count().await.unwrap(), 3);
}

#[tokio::test]
async fn given_indexed_documents_when_searching_then_best_match_comes_first() {
    let dir = tempfile::TempDir::new().unwrap();
    let (_, store) = create_store(&dir).await;
    let path = write_document(
        &dir,
        "pets.txt",
        "The cat sleeps on the warm windowsill all afternoon long\nA dog barks at the mail carrier every single morning\nThe fish circles its bowl slowly",
    );
    store.load_documents(&path).await.unwrap();

    let results = store.similarity_search("where is my dog?", 2).await.unwrap();

    assert_eq!(results.len(), 2);
    assert!(results[0].text.contains("dog"));
}

#[tokio::test]
async fn given_empty_store_when_searching_then_returns_nothing_without_embedding() {
    let dir = tempfile::TempDir::new().unwrap();
    let (embedder, store) = create_store(&dir).await;

    let results = store.similarity_search("cat", 3).await.unwrap();

    assert!(results.is_empty());
    assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn given_missing_file_when_loading_then_returns_load_error_with_path() {
    let dir = tempfile::TempDir::new().unwrap();
    let (_, store) = create_store(&dir).await;
    let missing = dir.path().join("absent.txt");

    let result = store.load_documents(&missing).await;

    match result {
        Err(DocumentStoreError::Load { path, .. }) => assert_eq!(path, missing),
        other => panic!("expected load error, got {:?}", other),
    }
}

#[tokio::test]
async fn given_loaded_documents_when_persisting_then_reopened_store_keeps_them() {
    let dir = tempfile::TempDir::new().unwrap();
    {
        let (_, store) = create_store(&dir).await;
        let path = write_document(&dir, "fish.txt", "A fish story");
        store.load_documents(&path).await.unwrap();
        store.persist().await.unwrap();
    }

    let reopened = LocalVectorStore::open(dir.path().join("db"), "keyword")
        .await
        .unwrap();

    assert_eq!(reopened.count().await.unwrap(), 1);
}

/// Embeds the first batch and fails on every batch after it.
#[derive(Default)]
struct FailsAfterFirstBatchEmbedder {
    batches: AtomicUsize,
}

#[async_trait::async_trait]
impl Embedder for FailsAfterFirstBatchEmbedder {
    async fn embed(&self, text: &str) -> Result<Embedding, EmbedderError> {
        Ok(KeywordEmbedder::vector(text))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>, EmbedderError> {
        if self.batches.fetch_add(1, Ordering::SeqCst) > 0 {
            return Err(EmbedderError::InferenceFailed("out of memory".to_string()));
        }
        Ok(texts.iter().map(|t| KeywordEmbedder::vector(t)).collect())
    }
}

#[tokio::test]
async fn given_embedding_fails_on_later_batch_when_loading_then_no_chunks_are_indexed() {
    let dir = tempfile::TempDir::new().unwrap();
    let embedder = Arc::new(FailsAfterFirstBatchEmbedder::default());
    let store = DocumentStore::new(
        embedder.clone(),
        Arc::new(
            LocalVectorStore::open(dir.path().join("db"), "keyword")
                .await
                .unwrap(),
        ),
        Arc::new(CharacterTextSplitter::new("\n", 60, 0).unwrap()),
    );
    let body = (0..40)
        .map(|i| format!("line {} about a cat that is long enough to stand alone", i))
        .collect::<Vec<_>>()
        .join("\n");
    let path = write_document(&dir, "cats.txt", &body);

    let result = store.load_documents(&path).await;

    assert!(matches!(result, Err(DocumentStoreError::Embedding(_))));
    assert!(embedder.batches.load(Ordering::SeqCst) >= 2);
    assert_eq!(store.chunk_count().await.unwrap(), 0);
}
