use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, WorklistError>;

/// Failures that can cross the data-source and host boundaries.
///
/// The engine itself degrades bad input to defaults; these only surface from
/// collaborators (data sources, config files, DICOM scans).
#[derive(Debug, Error)]
pub enum WorklistError {
    #[error("data source failure: {reason}")]
    DataSource { reason: String },

    #[error("study not found: {study_instance_uid}")]
    StudyNotFound { study_instance_uid: String },

    #[error("session payload could not be (de)serialized: {0}")]
    Session(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{}: failed to open DICOM file ({reason})", path.display())]
    Dicom { path: PathBuf, reason: String },
}

impl WorklistError {
    pub fn data_source(reason: impl Into<String>) -> Self {
        Self::DataSource {
            reason: reason.into(),
        }
    }
}
