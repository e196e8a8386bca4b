use std::path::{Path, PathBuf};

use super::{Frame, FrameSource};
use crate::error::{Error, Result};

/// Serves a previously stored image as the captured frame.
#[derive(Debug, Clone)]
pub struct ImageFileSource {
    path: PathBuf,
}

impl ImageFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FrameSource for ImageFileSource {
    fn grab(&mut self) -> Result<Frame> {
        if !self.path.is_file() {
            return Err(Error::FrameNotFound(self.path.clone()));
        }
        log::debug!("Reading frame from {}", self.path.display());
        Frame::from_file(&self.path)
    }

    fn source_id(&self) -> String {
        "file".to_string()
    }
}
