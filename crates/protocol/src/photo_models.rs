//! Gallery and upload payloads.
//!
//! These are the JSON shapes exchanged between the web boundary and the
//! gallery front end. All of them derive `TS` so the front end can share
//! the definitions.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// One stored photo as the gallery lists it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
pub struct PhotoInfo {
    /// The stored identity (`<uuid>.<ext>`).
    pub filename: String,

    /// File size in bytes, read from the filesystem.
    #[ts(type = "number")]
    pub size: u64,

    /// Creation time formatted as `%Y-%m-%d %H:%M:%S` in local time.
    pub created: String,
}

/// Aggregate result of a multi-file upload.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BatchOutcome {
    /// The request carried no files at all.
    Empty,

    /// Every file was stored.
    AllStored,

    /// Some files were stored and some rejected.
    Partial,

    /// Files were submitted but none was stored.
    NoneStored,
}

impl BatchOutcome {
    /// Classify a batch from its success and rejection counts.
    pub fn from_counts(stored: usize, rejected: usize) -> Self {
        match (stored, rejected) {
            (0, 0) => BatchOutcome::Empty,
            (0, _) => BatchOutcome::NoneStored,
            (_, 0) => BatchOutcome::AllStored,
            _ => BatchOutcome::Partial,
        }
    }
}

/// Why a single uploaded file was not stored.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
pub struct UploadRejection {
    /// The name the client declared for the file.
    pub filename: String,

    /// Display reason, e.g. "Invalid file: notes.txt".
    pub reason: String,
}

/// Response body for `POST /upload_photo`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
pub struct UploadSummary {
    /// Identities of the stored files, in submission order.
    pub uploaded: Vec<String>,

    pub rejected: Vec<UploadRejection>,

    pub outcome: BatchOutcome,

    pub message: String,
}

/// Request body for `POST /delete_photo`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
pub struct DeleteRequest {
    #[serde(default)]
    pub filename: Option<String>,
}

/// Response body for `POST /delete_photo`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
pub struct DeleteResponse {
    pub success: bool,
    pub message: String,
}

impl DeleteResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_outcome_from_counts() {
        assert_eq!(BatchOutcome::from_counts(0, 0), BatchOutcome::Empty);
        assert_eq!(BatchOutcome::from_counts(0, 2), BatchOutcome::NoneStored);
        assert_eq!(BatchOutcome::from_counts(3, 0), BatchOutcome::AllStored);
        assert_eq!(BatchOutcome::from_counts(1, 1), BatchOutcome::Partial);
    }

    #[test]
    fn test_delete_request_tolerates_missing_filename() {
        let req: DeleteRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(req.filename, None);
    }
}
