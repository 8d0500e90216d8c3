//! Error types for photo ingestion.
//!
//! Every variant carries the client-declared file name so that batch
//! reports can show which upload it belongs to.

use std::path::PathBuf;
use thiserror::Error;

/// Coarse classification of an ingestion rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionKind {
    InvalidExtension,
    TooLarge,
    Decode,
    Normalize,
    FileSystem,
}

/// Why one uploaded file was not stored.
#[derive(Error, Debug)]
pub enum IngestError {
    /// Missing or disallowed extension. Nothing was written.
    #[error("Invalid file: {filename}")]
    InvalidExtension { filename: String },

    /// Rejected by the transport before reaching the pipeline.
    #[error("Invalid file: {filename} exceeds the {limit} byte limit")]
    TooLarge { filename: String, limit: u64 },

    /// The bytes are not a decodable image.
    #[error("Error processing {filename}: {source}")]
    Decode {
        filename: String,
        source: image::ImageError,
    },

    /// The image decoded but could not be re-encoded.
    #[error("Error processing {filename}: {source}")]
    Normalize {
        filename: String,
        source: image::ImageError,
    },

    /// Writing, reading back or creating the store failed.
    #[error("Error processing {filename}: {source}")]
    FileSystem {
        filename: String,
        path: PathBuf,
        source: std::io::Error,
    },

    /// The partial artifact could not be removed after another failure.
    #[error("{original} (cleanup of {} also failed: {source})", path.display())]
    CleanupFailed {
        original: Box<IngestError>,
        path: PathBuf,
        source: std::io::Error,
    },
}

impl IngestError {
    /// The kind of the original failure, looking through cleanup wrappers.
    pub fn kind(&self) -> RejectionKind {
        match self {
            IngestError::InvalidExtension { .. } => RejectionKind::InvalidExtension,
            IngestError::TooLarge { .. } => RejectionKind::TooLarge,
            IngestError::Decode { .. } => RejectionKind::Decode,
            IngestError::Normalize { .. } => RejectionKind::Normalize,
            IngestError::FileSystem { .. } => RejectionKind::FileSystem,
            IngestError::CleanupFailed { original, .. } => original.kind(),
        }
    }

    /// The client-declared name of the rejected file.
    pub fn filename(&self) -> &str {
        match self {
            IngestError::InvalidExtension { filename }
            | IngestError::TooLarge { filename, .. }
            | IngestError::Decode { filename, .. }
            | IngestError::Normalize { filename, .. }
            | IngestError::FileSystem { filename, .. } => filename,
            IngestError::CleanupFailed { original, .. } => original.filename(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cleanup_failure_keeps_original_kind_and_message() {
        let original = IngestError::Decode {
            filename: "broken.png".to_string(),
            source: image::ImageError::IoError(std::io::Error::other("truncated")),
        };
        let wrapped = IngestError::CleanupFailed {
            original: Box::new(original),
            path: PathBuf::from("/store/x.png"),
            source: std::io::Error::other("read-only"),
        };

        assert_eq!(wrapped.kind(), RejectionKind::Decode);
        assert_eq!(wrapped.filename(), "broken.png");
        let message = wrapped.to_string();
        assert!(message.starts_with("Error processing broken.png"));
        assert!(message.contains("cleanup of /store/x.png also failed"));
    }

    #[test]
    fn test_invalid_extension_message() {
        let err = IngestError::InvalidExtension {
            filename: "photo2.txt".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid file: photo2.txt");
    }
}
