#[derive(Debug, thiserror::Error)]
pub enum VectorStoreError {
    #[error("failed to load index: {0}")]
    LoadFailed(String),
    #[error("index was built with embedding model {found}, expected {expected}")]
    ModelMismatch { expected: String, found: String },
    #[error("upsert failed: {0}")]
    UpsertFailed(String),
    #[error("persist failed: {0}")]
    PersistFailed(String),
}
