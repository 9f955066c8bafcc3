use crate::domain::{Chunk, DocumentId};

pub trait TextSplitter: Send + Sync {
    fn split(&self, text: &str, document_id: DocumentId) -> Result<Vec<Chunk>, TextSplitterError>;
}

#[derive(Debug, thiserror::Error)]
pub enum TextSplitterError {
    #[error("invalid splitter configuration: {0}")]
    InvalidConfiguration(String),
}
