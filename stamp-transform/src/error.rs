//! Error types for stamp-transform.

use std::path::{Path, PathBuf};

use thiserror::Error;

use stamp_renderer::RenderError;

/// All errors a header stage can report.
///
/// A failed file is reported once and dropped; the stage keeps going with the
/// next file.
#[derive(Debug, Error)]
pub enum TransformError {
    /// The header could not be rendered for this file.
    #[error("failed to render header for {path}: {source}")]
    Render {
        path: PathBuf,
        #[source]
        source: RenderError,
    },

    /// The other side of a stage channel went away.
    #[error("channel closed: {0}")]
    ChannelClosed(&'static str),
}

impl TransformError {
    /// The file the error belongs to, when there is one.
    pub fn path(&self) -> Option<&Path> {
        match self {
            TransformError::Render { path, .. } => Some(path),
            TransformError::ChannelClosed(_) => None,
        }
    }

    /// True for malformed header templates.
    pub fn is_syntax(&self) -> bool {
        matches!(
            self,
            TransformError::Render {
                source: RenderError::Syntax(_),
                ..
            }
        )
    }
}

pub(crate) fn render_err(path: impl Into<PathBuf>, source: RenderError) -> TransformError {
    TransformError::Render {
        path: path.into(),
        source,
    }
}
