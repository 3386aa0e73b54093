//! custseg: customer segmentation engine
//!
//! Keeps a validated, SQLite-backed table of customer records and partitions it
//! into behavioral segments with K-Means on (age, annual income, spending score),
//! scored by the silhouette coefficient. Records can be merged in from and exported
//! to CSV.

pub mod cli;
pub mod config;
pub mod data;
pub mod engine;
pub mod error;
pub mod features;
pub mod metrics;
pub mod model;
pub mod record;
pub mod storage;
pub mod store;

// Re-export public items for easier access
pub use cli::Args;
pub use config::KMeansParams;
pub use engine::{ClusterSummary, Segmenter};
pub use error::{Result, SegmentError, ValidationError};
pub use features::FeatureScaling;
pub use metrics::silhouette_score;
pub use model::{fit_kmeans, KMeansModel};
pub use record::{validate, CustomerRecord};
pub use storage::{CustomerLog, SqliteLog};
pub use store::RecordStore;
