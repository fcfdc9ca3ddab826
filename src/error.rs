//! Error types for toolpath generation.
//!
//! Every failure is fatal for the export that hit it: nothing is retried and a
//! partially generated toolpath is never handed back to the caller.

use std::io;
use thiserror::Error;

/// Errors raised while building or walking toolpaths.
#[derive(Error, Debug)]
pub enum ToolpathError {
    /// The artwork source contains nothing the laser could draw.
    #[error("EMPTY: artwork contains no drawable path")]
    EmptyArtwork,

    /// The two reference points of a placement coincide.
    #[error("Degenerate transform: {0}")]
    DegenerateTransform(String),

    /// The artwork source could not be parsed or flattened.
    #[error("Malformed path{}: {reason}", image_suffix(.index))]
    MalformedPath {
        /// 1-based position of the artwork item in the export, when known.
        index: Option<usize>,
        reason: String,
    },

    /// An artwork item reached the walk without a placement.
    #[error("No placement{}", image_suffix(.index))]
    MissingPlacement { index: Option<usize> },

    /// Preview raster does not match its declared dimensions.
    #[error("Invalid preview: expected {expected} bytes, got {actual}")]
    InvalidPreview { expected: usize, actual: usize },

    /// Configuration could not be read or failed validation.
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Image encoding error: {0}")]
    Image(#[from] image::ImageError),
}

impl ToolpathError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        ToolpathError::MalformedPath {
            index: None,
            reason: reason.into(),
        }
    }

    /// Attach the 1-based artwork index to an error that lacks one.
    pub(crate) fn at_image(self, index: usize) -> Self {
        match self {
            ToolpathError::MalformedPath { index: None, reason } => ToolpathError::MalformedPath {
                index: Some(index),
                reason,
            },
            ToolpathError::MissingPlacement { index: None } => ToolpathError::MissingPlacement {
                index: Some(index),
            },
            other => other,
        }
    }
}

fn image_suffix(index: &Option<usize>) -> String {
    index.map(|i| format!(" in image {i}")).unwrap_or_default()
}

pub type Result<T> = std::result::Result<T, ToolpathError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_message_names_image() {
        let err = ToolpathError::malformed("bad token").at_image(3);
        assert_eq!(err.to_string(), "Malformed path in image 3: bad token");
    }

    #[test]
    fn test_index_is_not_overwritten() {
        let err = ToolpathError::MissingPlacement { index: None }
            .at_image(2)
            .at_image(5);
        assert_eq!(err.to_string(), "No placement in image 2");
    }

    #[test]
    fn test_malformed_message_without_index() {
        let err = ToolpathError::malformed("bad token");
        assert_eq!(err.to_string(), "Malformed path: bad token");
    }

    #[test]
    fn test_at_image_keeps_existing_index() {
        let err = ToolpathError::MalformedPath {
            index: Some(1),
            reason: "x".into(),
        }
        .at_image(5);
        assert!(matches!(err, ToolpathError::MalformedPath { index: Some(1), .. }));
    }
}
