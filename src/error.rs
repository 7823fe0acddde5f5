use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ArchiveError>;

/// Why a filename could not be read as `<region>_<YYYYMMDD>T<HHMM>Z<suffix>`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FilenameError {
    #[error("Filename '{0}' does not match <region>_<YYYYMMDD>T<HHMM>Z")]
    Pattern(String),

    #[error("Filename '{name}' carries an invalid date/time '{stamp}'")]
    InvalidInstant { name: String, stamp: String },
}

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("Could not parse dataset timestamp: {0}")]
    Parse(#[from] FilenameError),

    #[error("Failed to archive {path}: {source}")]
    ArchiveCopy {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to delete {path}: {source}")]
    FileDelete {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Database connection failed: {0}")]
    DbConnect(#[source] sqlx::Error),

    #[error("SQL execution aborted on table {table}: {source}")]
    DbQuery {
        table: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("Invalid SQL identifier: '{0}'")]
    InvalidIdentifier(String),

    #[error("Job is missing input #{0}")]
    MissingInput(usize),

    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ArchiveError {
    /// Errors that stop a job before any copy or cleanup runs.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ArchiveError::Parse(_) | ArchiveError::MissingInput(_))
    }
}
