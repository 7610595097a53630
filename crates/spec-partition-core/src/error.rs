//! Error types for spec selection and partitioning

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PartitionError {
    /// Explicit spec names must be separated with `;`, never `,`.
    #[error("Ambiguous delimiter in spec list '{0}': separate spec names with ';', not ','")]
    AmbiguousDelimiter(String),

    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Failed to write plan: {0}")]
    Output(#[source] std::io::Error),

    #[error("Invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

impl PartitionError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PartitionError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for selection and partitioning operations
pub type Result<T> = std::result::Result<T, PartitionError>;
