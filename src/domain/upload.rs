use std::path::Path;

use bytes::Bytes;

/// An uploaded file held in memory for the lifetime of one request.
#[derive(Debug, Clone)]
pub struct Upload {
    pub filename: String,
    pub data: Bytes,
}

impl Upload {
    pub fn new(filename: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            filename: filename.into(),
            data: data.into(),
        }
    }

    /// Extension of the original filename including the leading dot, or an
    /// empty string when there is none. Dotfiles such as `.bashrc` have no
    /// extension.
    pub fn suffix(&self) -> String {
        Path::new(&self.filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| format!(".{}", ext))
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
