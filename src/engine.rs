//! The segmentation engine: the operations a front-end calls.

use std::path::Path;

use ndarray::Array2;

use crate::config::KMeansParams;
use crate::data::{read_customers_csv, write_customers_csv};
use crate::error::{Result, SegmentError};
use crate::features::{FeatureScaling, Features, StandardScaler};
use crate::metrics::silhouette_score;
use crate::model::{fit_kmeans, KMeansModel};
use crate::record::CustomerRecord;
use crate::storage::{CustomerLog, SqliteLog};
use crate::store::RecordStore;

/// Statistics for the most recent clustering run.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterSummary {
    pub k: usize,
    /// Members per cluster, indexed by label
    pub sizes: Vec<usize>,
    /// Centroids in raw feature units (age, annual income, spending score)
    pub centroids: Array2<f64>,
    /// Within-cluster sum of squares in the clustering feature space
    pub inertia: f64,
    pub iterations: usize,
    pub converged: bool,
}

/// A fitted model together with the scaler that produced its feature space.
struct Fitted {
    model: KMeansModel,
    scaler: StandardScaler,
    scaling: FeatureScaling,
}

/// Owns the record store and the last fitted model.
pub struct Segmenter<L: CustomerLog = SqliteLog> {
    store: RecordStore<L>,
    params: KMeansParams,
    fitted: Option<Fitted>,
}

impl Segmenter<SqliteLog> {
    /// Open a segmenter over a SQLite database file.
    pub fn open(db_path: &Path, params: KMeansParams) -> Result<Self> {
        Self::with_log(SqliteLog::open(db_path)?, params)
    }

    /// Segmenter over a private in-memory database.
    pub fn in_memory(params: KMeansParams) -> Result<Self> {
        Self::with_log(SqliteLog::open_in_memory()?, params)
    }
}

impl<L: CustomerLog> Segmenter<L> {
    pub fn with_log(log: L, params: KMeansParams) -> Result<Self> {
        let store = RecordStore::open(log)?;
        tracing::info!(records = store.len(), "segmenter ready");
        Ok(Self {
            store,
            params,
            fitted: None,
        })
    }

    pub fn params(&self) -> &KMeansParams {
        &self.params
    }

    pub fn params_mut(&mut self) -> &mut KMeansParams {
        &mut self.params
    }

    pub fn store(&self) -> &RecordStore<L> {
        &self.store
    }

    /// Validate and persist a new customer. Invalidates any current segmentation.
    pub fn add_record(
        &mut self,
        customer_id: &str,
        age: i64,
        annual_income: f64,
        spending_score: f64,
    ) -> Result<()> {
        self.store.insert(CustomerRecord::new(
            customer_id,
            age,
            annual_income,
            spending_score,
        ))?;
        self.fitted = None;
        Ok(())
    }

    /// Cluster the whole store into `k` segments and return the silhouette score.
    ///
    /// Labels are written to the store before scoring, so a scoring failure
    /// (`InsufficientClusters`) still leaves a complete assignment in place.
    pub fn run_clustering(&mut self, k: usize) -> Result<f64> {
        if self.store.is_empty() {
            return Err(SegmentError::EmptyDataset);
        }

        let params = self.params.clone().with_clusters(k);
        let features = Features::from_records(self.store.all(), params.scaling);
        let model = fit_kmeans(&features.scaled, &params)?;

        self.store.set_clusters(&model.labels)?;
        let labels = model.labels.clone();
        self.fitted = Some(Fitted {
            model,
            scaler: features.scaler,
            scaling: params.scaling,
        });

        let score = silhouette_score(&features.scaled, &labels)?;
        tracing::info!(k, records = labels.len(), score, "clustering evaluated");
        Ok(score)
    }

    /// Silhouette score of the labels currently in the store.
    ///
    /// Scored in the feature space of the last fit, or the configured scaling when
    /// labels were set without a fit.
    pub fn evaluate(&self) -> Result<f64> {
        let records = self.store.all();
        let Some(labels) = self.store.labels().filter(|l| !l.is_empty()) else {
            return Err(SegmentError::InsufficientClusters {
                distinct: 0,
                records: records.len(),
            });
        };

        let scaling = self
            .fitted
            .as_ref()
            .map_or(self.params.scaling, |f| f.scaling);
        let features = Features::from_records(records, scaling);
        silhouette_score(&features.scaled, &labels)
    }

    /// Overwrite the store's labels directly, e.g. with an externally computed
    /// assignment. Drops the fitted model since it no longer matches.
    pub fn set_clusters(&mut self, labels: &[usize]) -> Result<()> {
        self.store.set_clusters(labels)?;
        self.fitted = None;
        Ok(())
    }

    /// Export the current in-memory table (including labels if set) as CSV.
    pub fn save(&self, path: &Path) -> Result<()> {
        write_customers_csv(path, self.store.all())?;
        tracing::info!(path = %path.display(), records = self.store.len(), "data saved");
        Ok(())
    }

    /// Merge a CSV file into durable storage and refresh the table from it.
    ///
    /// All rows are validated and appended in one transaction; on any error
    /// nothing is appended. Returns the number of rows imported.
    pub fn load(&mut self, path: &Path) -> Result<usize> {
        let records = read_customers_csv(path)?;
        let imported = self.store.append_batch(&records)?;
        self.fitted = None;
        tracing::info!(
            path = %path.display(),
            imported,
            total = self.store.len(),
            "data loaded"
        );
        Ok(imported)
    }

    pub fn current_records(&self) -> &[CustomerRecord] {
        self.store.all()
    }

    /// Assign a new (unstored) customer to a segment of the last fitted model.
    pub fn predict(&self, age: i64, annual_income: f64, spending_score: f64) -> Result<usize> {
        let fitted = self.fitted.as_ref().ok_or(SegmentError::NotFitted)?;
        let point = fitted
            .scaler
            .transform_point(&[age as f64, annual_income, spending_score]);
        Ok(fitted.model.predict(&point.view()))
    }

    /// Sizes, raw-unit centroids and fit statistics of the last clustering run.
    pub fn cluster_summary(&self) -> Option<ClusterSummary> {
        self.fitted.as_ref().map(|f| ClusterSummary {
            k: f.model.n_clusters,
            sizes: f.model.cluster_sizes(),
            centroids: f.scaler.inverse_transform(&f.model.centroids),
            inertia: f.model.inertia,
            iterations: f.model.iterations,
            converged: f.model.converged,
        })
    }
}
