use std::path::Path;

use tokio_util::sync::CancellationToken;

/// Speech-to-text engine invoked synchronously on a worker thread.
///
/// Implementations may block for as long as inference takes. They should
/// return [`TranscriptionError::Cancelled`] promptly once `cancel` fires.
pub trait TranscriptionEngine: Send + Sync {
    fn transcribe(
        &self,
        audio_path: &Path,
        cancel: &CancellationToken,
    ) -> Result<String, TranscriptionError>;
}

#[derive(Debug, thiserror::Error)]
pub enum TranscriptionError {
    #[error("audio decoding failed: {0}")]
    DecodingFailed(String),
    #[error("transcription failed: {0}")]
    TranscriptionFailed(String),
    #[error("unsupported audio format: {0}")]
    UnsupportedFormat(String),
    #[error("model loading failed: {0}")]
    ModelLoadFailed(String),
    #[error("transcription cancelled")]
    Cancelled,
}
