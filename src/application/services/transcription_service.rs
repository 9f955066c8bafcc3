use std::sync::Arc;

use crate::application::ports::{
    AudioStaging, StagingError, TranscriptionEngine, TranscriptionError,
};
use crate::domain::Upload;

use super::offload_pool::{OffloadError, OffloadPool};

/// Stages an upload, runs the transcription engine on the offload pool and
/// removes the staged file whatever the outcome.
pub struct TranscriptionService {
    engine: Arc<dyn TranscriptionEngine>,
    staging: Arc<dyn AudioStaging>,
    offload_pool: OffloadPool,
}

impl TranscriptionService {
    pub fn new(
        engine: Arc<dyn TranscriptionEngine>,
        staging: Arc<dyn AudioStaging>,
        offload_pool: OffloadPool,
    ) -> Self {
        Self {
            engine,
            staging,
            offload_pool,
        }
    }

    #[tracing::instrument(
        skip(self, upload),
        fields(filename = %upload.filename, bytes = upload.len())
    )]
    pub async fn transcribe(&self, upload: Upload) -> Result<String, TranscriptionServiceError> {
        let staged = self.staging.stage(&upload).await?;
        drop(upload);

        tracing::debug!(path = %staged.path().display(), "Upload staged");

        // The staged file travels with the job so it outlives the engine call
        // even when the caller stops waiting.
        let engine = Arc::clone(&self.engine);
        let transcript = self
            .offload_pool
            .run(move |cancel| {
                let result = engine.transcribe(staged.path(), cancel);
                let path = staged.path().to_path_buf();
                if let Err(e) = staged.release() {
                    tracing::warn!(
                        error = %e,
                        path = %path.display(),
                        "Failed to remove staged audio file"
                    );
                }
                result
            })
            .await??;

        tracing::info!(chars = transcript.len(), "Transcription completed");

        Ok(transcript)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TranscriptionServiceError {
    #[error(transparent)]
    Staging(#[from] StagingError),
    #[error(transparent)]
    Offload(#[from] OffloadError),
    #[error(transparent)]
    Engine(#[from] TranscriptionError),
}
