use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio_util::sync::CancellationToken;

use voxrag::application::ports::{
    AudioStaging, StagedAudio, StagingError, TranscriptionEngine, TranscriptionError,
};
use voxrag::application::services::{OffloadPool, TranscriptionService, TranscriptionServiceError};
use voxrag::domain::Upload;
use voxrag::infrastructure::storage::TempAudioStaging;

#[derive(Default)]
struct InspectingEngine {
    fail: bool,
    calls: AtomicUsize,
    observed: Mutex<Option<(PathBuf, usize)>>,
}

impl TranscriptionEngine for InspectingEngine {
    fn transcribe(
        &self,
        audio_path: &Path,
        _cancel: &CancellationToken,
    ) -> Result<String, TranscriptionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let len = std::fs::metadata(audio_path)
            .map(|m| m.len() as usize)
            .map_err(|e| TranscriptionError::DecodingFailed(e.to_string()))?;
        *self.observed.lock().unwrap() = Some((audio_path.to_path_buf(), len));

        if self.fail {
            Err(TranscriptionError::DecodingFailed("corrupt stream".to_string()))
        } else {
            Ok(format!("{} bytes of speech", len))
        }
    }
}

struct BrokenStaging;

#[async_trait::async_trait]
impl AudioStaging for BrokenStaging {
    async fn stage(&self, _upload: &Upload) -> Result<StagedAudio, StagingError> {
        Err(StagingError::Io(std::io::Error::other("disk full")))
    }
}

fn service_with(
    engine: Arc<InspectingEngine>,
    staging: Arc<dyn AudioStaging>,
) -> TranscriptionService {
    TranscriptionService::new(engine, staging, OffloadPool::new(1, 1, None))
}

fn temp_staging() -> (tempfile::TempDir, Arc<dyn AudioStaging>) {
    let dir = tempfile::TempDir::new().unwrap();
    let staging = TempAudioStaging::new(Some(dir.path().to_path_buf())).unwrap();
    (dir, Arc::new(staging))
}

#[tokio::test]
async fn given_upload_when_transcribing_then_engine_reads_suffixed_copy_that_is_removed_afterwards() {
    let (dir, staging) = temp_staging();
    let engine = Arc::new(InspectingEngine::default());
    let service = service_with(Arc::clone(&engine), staging);

    let transcript = service
        .transcribe(Upload::new("lecture.m4a", vec![1u8; 321]))
        .await
        .unwrap();

    assert_eq!(transcript, "321 bytes of speech");
    let (path, len) = engine.observed.lock().unwrap().clone().unwrap();
    assert_eq!(len, 321);
    assert_eq!(path.extension().and_then(|e| e.to_str()), Some("m4a"));
    assert!(!path.exists());
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn given_filename_without_extension_when_transcribing_then_staged_path_has_no_extension() {
    let (_dir, staging) = temp_staging();
    let engine = Arc::new(InspectingEngine::default());
    let service = service_with(Arc::clone(&engine), staging);

    service
        .transcribe(Upload::new("recording", vec![0u8; 8]))
        .await
        .unwrap();

    let (path, _) = engine.observed.lock().unwrap().clone().unwrap();
    assert!(path.extension().is_none());
}

#[tokio::test]
async fn given_engine_failure_when_transcribing_then_error_propagates_and_file_is_removed() {
    let (dir, staging) = temp_staging();
    let engine = Arc::new(InspectingEngine {
        fail: true,
        ..Default::default()
    });
    let service = service_with(Arc::clone(&engine), staging);

    let result = service
        .transcribe(Upload::new("clip.ogg", b"OggS".to_vec()))
        .await;

    assert!(matches!(
        result,
        Err(TranscriptionServiceError::Engine(TranscriptionError::DecodingFailed(_)))
    ));
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn given_staging_failure_when_transcribing_then_engine_is_never_called() {
    let engine = Arc::new(InspectingEngine::default());
    let service = service_with(Arc::clone(&engine), Arc::new(BrokenStaging));

    let result = service
        .transcribe(Upload::new("clip.wav", b"RIFF".to_vec()))
        .await;

    assert!(matches!(result, Err(TranscriptionServiceError::Staging(_))));
    assert_eq!(engine.calls.load(Ordering::SeqCst), 0);
}
