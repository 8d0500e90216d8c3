//! Upload ingestion: validate, persist, normalize.
//!
//! Each file is handled on its own. A rejected file never leaves anything
//! behind in the store and never affects the other files of the batch.

pub mod error;
pub mod normalize;

pub use error::{IngestError, RejectionKind};
pub use normalize::{Normalization, sniff_content_type};

use crate::store::{PhotoEntry, PhotoStore, StoreError, allowed_extension};
use normalize::{NormalizeError, normalize_file};
use pf_protocol::config_models::NormalizeConfig;
use pf_protocol::photo_models::{BatchOutcome, UploadRejection, UploadSummary};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use uuid::Uuid;

/// One file as received from a client.
#[derive(Debug, Clone)]
pub struct UploadItem {
    /// Name declared by the client. Only its extension is trusted.
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl UploadItem {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            bytes,
        }
    }
}

/// Per-file results of one batch.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub stored: Vec<PhotoEntry>,
    pub rejected: Vec<IngestError>,
}

impl BatchReport {
    /// Fold one file's result into the report.
    pub fn record(&mut self, result: Result<PhotoEntry, IngestError>) {
        match result {
            Ok(entry) => self.stored.push(entry),
            Err(err) => self.rejected.push(err),
        }
    }

    pub fn outcome(&self) -> BatchOutcome {
        BatchOutcome::from_counts(self.stored.len(), self.rejected.len())
    }

    /// Human-readable summary line for the whole batch.
    pub fn message(&self) -> String {
        match self.outcome() {
            BatchOutcome::Empty => "No file selected".to_string(),
            BatchOutcome::NoneStored => "No valid photos were uploaded".to_string(),
            BatchOutcome::AllStored | BatchOutcome::Partial => {
                format!("Successfully uploaded {} photo(s)!", self.stored.len())
            }
        }
    }

    pub fn to_summary(&self) -> UploadSummary {
        UploadSummary {
            uploaded: self.stored.iter().map(|e| e.identity.clone()).collect(),
            rejected: self
                .rejected
                .iter()
                .map(|err| UploadRejection {
                    filename: err.filename().to_string(),
                    reason: err.to_string(),
                })
                .collect(),
            outcome: self.outcome(),
            message: self.message(),
        }
    }
}

/// Turns uploaded bytes into normalized photos in a [`PhotoStore`].
#[derive(Debug, Clone)]
pub struct IngestionPipeline {
    store: PhotoStore,
    normalize: NormalizeConfig,
}

impl IngestionPipeline {
    pub fn new(store: PhotoStore, normalize: NormalizeConfig) -> Self {
        Self { store, normalize }
    }

    pub fn store(&self) -> &PhotoStore {
        &self.store
    }

    /// Ingest a single file.
    ///
    /// On success the returned entry points at a fresh `<uuid>.<ext>` file
    /// whose extension is the lowercased declared one. On failure the store
    /// is left as it was.
    pub fn ingest(&self, bytes: &[u8], declared: &str) -> Result<PhotoEntry, IngestError> {
        let filename = declared.to_string();
        let ext = allowed_extension(declared_basename(declared))
            .ok_or_else(|| IngestError::InvalidExtension {
                filename: filename.clone(),
            })?;

        self.store.ensure_root().map_err(|e| match e {
            StoreError::FileSystem { path, source } => IngestError::FileSystem {
                filename: filename.clone(),
                path,
                source,
            },
            other => IngestError::FileSystem {
                filename: filename.clone(),
                path: self.store.root().to_path_buf(),
                source: std::io::Error::other(other.to_string()),
            },
        })?;

        let identity = format!("{}.{ext}", Uuid::new_v4());
        let path = self.store.root().join(&identity);

        // create_new so an existing photo is never overwritten
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|source| IngestError::FileSystem {
                filename: filename.clone(),
                path: path.clone(),
                source,
            })?;

        if let Err(source) = file.write_all(bytes).and_then(|()| file.sync_all()) {
            drop(file);
            return Err(discard(
                &path,
                IngestError::FileSystem {
                    filename,
                    path: path.clone(),
                    source,
                },
            ));
        }
        drop(file);

        let normalization = match normalize_file(&path, &self.normalize) {
            Ok(n) => n,
            Err(NormalizeError::Decode(source)) => {
                return Err(discard(&path, IngestError::Decode { filename, source }));
            }
            Err(NormalizeError::Encode(source)) => {
                return Err(discard(&path, IngestError::Normalize { filename, source }));
            }
        };

        let entry = match self.store.get(&identity) {
            Ok(entry) => entry,
            Err(e) => {
                let source = match e {
                    StoreError::FileSystem { source, .. } => source,
                    other => std::io::Error::other(other.to_string()),
                };
                return Err(discard(
                    &path,
                    IngestError::FileSystem {
                        filename,
                        path: path.clone(),
                        source,
                    },
                ));
            }
        };

        tracing::info!(
            declared,
            identity = %entry.identity,
            size = entry.size_bytes,
            ?normalization,
            "Stored photo"
        );
        Ok(entry)
    }

    /// Ingest every item independently and collect the results.
    pub fn ingest_batch<I>(&self, items: I) -> BatchReport
    where
        I: IntoIterator<Item = UploadItem>,
    {
        let mut report = BatchReport::default();
        for item in items {
            let result = self.ingest(&item.bytes, &item.filename);
            if let Err(err) = &result {
                tracing::warn!(filename = %item.filename, "Rejected upload: {err}");
            }
            report.record(result);
        }
        report
    }
}

/// Last path component of a client-declared name.
fn declared_basename(declared: &str) -> &str {
    declared.rsplit(['/', '\\']).next().unwrap_or(declared)
}

/// Remove a partial artifact, keeping `error` as the primary cause.
fn discard(path: &Path, error: IngestError) -> IngestError {
    match std::fs::remove_file(path) {
        Ok(()) => error,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => error,
        Err(source) => {
            tracing::error!("Failed to remove {} after rejection: {source}", path.display());
            IngestError::CleanupFailed {
                original: Box::new(error),
                path: path.to_path_buf(),
                source,
            }
        }
    }
}
