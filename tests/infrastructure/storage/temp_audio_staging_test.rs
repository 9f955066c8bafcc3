use voxrag::application::ports::AudioStaging;
use voxrag::domain::Upload;
use voxrag::infrastructure::storage::TempAudioStaging;

fn create_test_staging() -> (tempfile::TempDir, TempAudioStaging) {
    let dir = tempfile::TempDir::new().unwrap();
    let staging = TempAudioStaging::new(Some(dir.path().to_path_buf())).unwrap();
    (dir, staging)
}

#[tokio::test]
async fn given_upload_when_staging_then_file_keeps_extension_and_bytes() {
    let (dir, staging) = create_test_staging();
    let upload = Upload::new("voice-note.mp3", b"ID3\x04\x00".to_vec());

    let staged = staging.stage(&upload).await.unwrap();

    assert!(staged.path().starts_with(dir.path()));
    assert_eq!(
        staged.path().extension().and_then(|e| e.to_str()),
        Some("mp3")
    );
    assert_eq!(std::fs::read(staged.path()).unwrap(), upload.data.to_vec());
}

#[tokio::test]
async fn given_two_uploads_with_same_name_when_staging_then_paths_differ() {
    let (_dir, staging) = create_test_staging();
    let upload = Upload::new("clip.wav", b"RIFF".to_vec());

    let first = staging.stage(&upload).await.unwrap();
    let second = staging.stage(&upload).await.unwrap();

    assert_ne!(first.path(), second.path());
}

#[tokio::test]
async fn given_staged_file_when_released_then_file_is_removed() {
    let (_dir, staging) = create_test_staging();
    let staged = staging
        .stage(&Upload::new("clip.wav", b"RIFF".to_vec()))
        .await
        .unwrap();
    let path = staged.path().to_path_buf();

    staged.release().unwrap();

    assert!(!path.exists());
}

#[tokio::test]
async fn given_staged_file_when_dropped_then_file_is_removed() {
    let (dir, staging) = create_test_staging();
    let staged = staging
        .stage(&Upload::new("clip.flac", b"fLaC".to_vec()))
        .await
        .unwrap();

    drop(staged);

    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn given_missing_staging_dir_when_creating_then_directory_is_created() {
    let root = tempfile::TempDir::new().unwrap();
    let nested = root.path().join("uploads").join("audio");

    TempAudioStaging::new(Some(nested.clone())).unwrap();

    assert!(nested.is_dir());
}
