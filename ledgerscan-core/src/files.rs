use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A statement image the user picked, not yet read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagedFile {
    pub path: PathBuf,
    /// Declared media type; when absent the encoder derives one from the extension.
    pub media_type: Option<String>,
}

impl StagedFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            media_type: None,
        }
    }

    pub fn with_media_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = Some(media_type.into());
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name for display, falling back to the full path.
    pub fn display_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}
