//! Error types for the segmentation engine

use std::path::PathBuf;

/// A candidate record violated one of the field constraints.
///
/// Only the first violated constraint is reported, checked in field order.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("customer ID cannot be empty")]
    EmptyCustomerId,

    #[error("age must be between 0 and 120, got {age}")]
    AgeOutOfRange { age: i64 },

    #[error("annual income must be a finite non-negative number, got {income}")]
    InvalidAnnualIncome { income: f64 },

    #[error("spending score must be between 0 and 100, got {score}")]
    SpendingScoreOutOfRange { score: f64 },
}

/// Errors returned by the record store, clustering engine and import/export.
#[derive(Debug, thiserror::Error)]
pub enum SegmentError {
    #[error("invalid customer record: {0}")]
    Validation(#[from] ValidationError),

    #[error("label count {labels} does not match record count {records}")]
    ShapeMismatch { records: usize, labels: usize },

    #[error("number of clusters k={k} is invalid for {records} records (need 2 <= k <= {records})")]
    InvalidK { k: usize, records: usize },

    #[error("no customer data to cluster")]
    EmptyDataset,

    #[error(
        "silhouette needs at least 2 clusters and more records than clusters \
         (got {distinct} clusters over {records} records)"
    )]
    InsufficientClusters { distinct: usize, records: usize },

    #[error("no clustering model has been fitted yet")]
    NotFitted,

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("durable storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("failed to parse {}: {reason}", .path.display())]
    Parse { path: PathBuf, reason: String },
}

impl SegmentError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn parse(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Common result type used throughout the library
pub type Result<T> = std::result::Result<T, SegmentError>;
