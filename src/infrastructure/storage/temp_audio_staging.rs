use std::path::PathBuf;

use async_trait::async_trait;

use crate::application::ports::{AudioStaging, StagedAudio, StagingError};
use crate::domain::Upload;

const STAGED_FILE_PREFIX: &str = "voxrag-";

/// Stages uploads as uniquely named files in a local directory, or in the
/// system temp directory when none is configured.
pub struct TempAudioStaging {
    dir: Option<PathBuf>,
}

impl TempAudioStaging {
    pub fn new(dir: Option<PathBuf>) -> Result<Self, StagingError> {
        if let Some(dir) = &dir {
            std::fs::create_dir_all(dir)?;
        }
        Ok(Self { dir })
    }
}

#[async_trait]
impl AudioStaging for TempAudioStaging {
    async fn stage(&self, upload: &Upload) -> Result<StagedAudio, StagingError> {
        let suffix = upload.suffix();
        let mut builder = tempfile::Builder::new();
        builder.prefix(STAGED_FILE_PREFIX).suffix(&suffix);

        let file = match &self.dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        let path = file
            .into_temp_path()
            .keep()
            .map_err(|e| StagingError::Io(e.error))?;

        // From here on the guard removes the file if the write fails.
        let staged = StagedAudio::new(path);
        tokio::fs::write(staged.path(), &upload.data).await?;

        Ok(staged)
    }
}
