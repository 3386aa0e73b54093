//! Tunable parameters for the segmentation engine

use crate::features::FeatureScaling;

/// K-Means parameters. The defaults match the CLI defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct KMeansParams {
    /// Number of clusters
    pub n_clusters: usize,
    /// Upper bound on Lloyd iterations
    pub max_iters: usize,
    /// Stop once total centroid movement drops to this value
    pub tolerance: f64,
    /// Seed for centroid initialization; equal seeds give equal labels
    pub seed: u64,
    pub scaling: FeatureScaling,
}

impl Default for KMeansParams {
    fn default() -> Self {
        Self {
            n_clusters: 3,
            max_iters: 300,
            tolerance: 1e-4,
            seed: 42,
            scaling: FeatureScaling::Standard,
        }
    }
}

impl KMeansParams {
    pub fn with_clusters(mut self, n_clusters: usize) -> Self {
        self.n_clusters = n_clusters;
        self
    }
}
