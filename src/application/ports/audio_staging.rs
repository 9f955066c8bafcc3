use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::domain::Upload;

#[async_trait]
pub trait AudioStaging: Send + Sync {
    /// Writes the upload to a uniquely named file that keeps its extension.
    async fn stage(&self, upload: &Upload) -> Result<StagedAudio, StagingError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StagingError {
    #[error("staging write failed: {0}")]
    Io(#[from] io::Error),
}

/// A staged upload on local disk. The file is removed exactly once: by
/// [`StagedAudio::release`], or on drop if it was never released.
#[derive(Debug)]
pub struct StagedAudio {
    path: PathBuf,
    released: bool,
}

impl StagedAudio {
    /// Takes ownership of an existing file at `path`.
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            released: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn release(mut self) -> io::Result<()> {
        self.released = true;
        std::fs::remove_file(&self.path)
    }
}

impl Drop for StagedAudio {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(e) = std::fs::remove_file(&self.path) {
            tracing::warn!(
                error = %e,
                path = %self.path.display(),
                "Failed to remove staged audio file"
            );
        }
    }
}
