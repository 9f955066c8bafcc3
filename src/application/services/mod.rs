mod document_store;
mod offload_pool;
mod transcription_service;

pub use document_store::{DocumentStore, DocumentStoreError};
pub use offload_pool::{OffloadError, OffloadPool};
pub use transcription_service::{TranscriptionService, TranscriptionServiceError};
