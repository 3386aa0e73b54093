//! K-Means clustering model implementation

use ndarray::{Array1, Array2, ArrayView1, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::KMeansParams;
use crate::error::{Result, SegmentError};

/// Fitted K-Means model
#[derive(Debug, Clone)]
pub struct KMeansModel {
    /// Number of clusters
    pub n_clusters: usize,
    /// Cluster assignment for every training row, in input order
    pub labels: Vec<usize>,
    /// Cluster centroids in the (possibly scaled) feature space
    pub centroids: Array2<f64>,
    /// Within-cluster sum of squares (inertia)
    pub inertia: f64,
    /// Lloyd iterations performed
    pub iterations: usize,
    /// Whether the loop stopped before hitting `max_iters`
    pub converged: bool,
}

impl KMeansModel {
    /// Predict the cluster for a point in the same feature space as the centroids.
    pub fn predict(&self, point: &ArrayView1<f64>) -> usize {
        nearest_centroid(point, &self.centroids)
    }

    /// Get cluster sizes
    pub fn cluster_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.n_clusters];
        for &label in &self.labels {
            sizes[label] += 1;
        }
        sizes
    }
}

/// Fit K-Means (Lloyd's algorithm with k-means++ seeding) on an `(n, d)` matrix.
///
/// Ties between equidistant centroids go to the lowest index. A cluster that ends
/// an iteration with no members keeps its previous centroid.
pub fn fit_kmeans(features: &Array2<f64>, params: &KMeansParams) -> Result<KMeansModel> {
    let n_samples = features.nrows();
    let k = params.n_clusters;

    if n_samples == 0 {
        return Err(SegmentError::EmptyDataset);
    }
    if k < 2 || k > n_samples {
        return Err(SegmentError::InvalidK {
            k,
            records: n_samples,
        });
    }

    let mut rng = StdRng::seed_from_u64(params.seed);
    let mut centroids = init_centroids(features, k, &mut rng);
    let mut labels = assign(features, &centroids);
    let mut iterations = 0;
    let mut converged = false;

    while iterations < params.max_iters {
        iterations += 1;

        let (updated, empty) = update_centroids(features, &labels, &centroids);
        if empty > 0 {
            tracing::warn!(iteration = iterations, empty, "k-means produced empty clusters");
        }
        let shift = (&updated - &centroids).mapv(|v| v * v).sum().sqrt();
        centroids = updated;

        let next = assign(features, &centroids);
        let changed = next.iter().zip(&labels).filter(|(a, b)| a != b).count();
        labels = next;

        tracing::debug!(iteration = iterations, changed, shift, "k-means iteration");

        if changed == 0 || shift <= params.tolerance {
            converged = true;
            break;
        }
    }

    let inertia = compute_inertia(features, &labels, &centroids);
    tracing::info!(
        k,
        records = n_samples,
        iterations,
        converged,
        inertia,
        "k-means fitted"
    );

    Ok(KMeansModel {
        n_clusters: k,
        labels,
        centroids,
        inertia,
        iterations,
        converged,
    })
}

/// k-means++ seeding. Falls back to a uniform pick when every remaining point
/// coincides with a chosen centroid.
fn init_centroids(features: &Array2<f64>, k: usize, rng: &mut StdRng) -> Array2<f64> {
    let n_samples = features.nrows();
    let mut centroids = Array2::zeros((k, features.ncols()));

    let first = rng.gen_range(0..n_samples);
    centroids.row_mut(0).assign(&features.row(first));

    let mut min_dist: Array1<f64> = features
        .outer_iter()
        .map(|p| squared_distance(&p, &features.row(first)))
        .collect();

    for c in 1..k {
        let total: f64 = min_dist.sum();
        let chosen = if total > 0.0 {
            let mut target = rng.gen::<f64>() * total;
            let mut pick = min_dist
                .iter()
                .rposition(|&d| d > 0.0)
                .unwrap_or(n_samples - 1);
            for (i, &d) in min_dist.iter().enumerate() {
                if d > 0.0 && target < d {
                    pick = i;
                    break;
                }
                target -= d;
            }
            pick
        } else {
            rng.gen_range(0..n_samples)
        };

        centroids.row_mut(c).assign(&features.row(chosen));
        for (i, p) in features.outer_iter().enumerate() {
            let d = squared_distance(&p, &features.row(chosen));
            if d < min_dist[i] {
                min_dist[i] = d;
            }
        }
    }

    centroids
}

fn assign(features: &Array2<f64>, centroids: &Array2<f64>) -> Vec<usize> {
    features
        .outer_iter()
        .map(|p| nearest_centroid(&p, centroids))
        .collect()
}

/// Mean of each cluster's members. Returns the new centroids and how many
/// clusters were empty (those keep their old centroid).
fn update_centroids(
    features: &Array2<f64>,
    labels: &[usize],
    centroids: &Array2<f64>,
) -> (Array2<f64>, usize) {
    let k = centroids.nrows();
    let mut sums = Array2::<f64>::zeros(centroids.raw_dim());
    let mut counts = vec![0usize; k];

    for (point, &label) in features.outer_iter().zip(labels) {
        let mut row = sums.row_mut(label);
        row += &point;
        counts[label] += 1;
    }

    let mut empty = 0;
    for (c, &count) in counts.iter().enumerate() {
        if count == 0 {
            empty += 1;
            sums.row_mut(c).assign(&centroids.row(c));
        } else {
            sums.row_mut(c).mapv_inplace(|v| v / count as f64);
        }
    }

    (sums, empty)
}

/// Index of the closest centroid; strict comparison keeps the lowest index on ties.
fn nearest_centroid(point: &ArrayView1<f64>, centroids: &Array2<f64>) -> usize {
    let mut min_distance = f64::INFINITY;
    let mut closest = 0;

    for (idx, centroid) in centroids.axis_iter(Axis(0)).enumerate() {
        let distance = squared_distance(point, &centroid);
        if distance < min_distance {
            min_distance = distance;
            closest = idx;
        }
    }

    closest
}

/// Compute within-cluster sum of squares (inertia)
fn compute_inertia(features: &Array2<f64>, labels: &[usize], centroids: &Array2<f64>) -> f64 {
    features
        .outer_iter()
        .zip(labels)
        .map(|(point, &label)| squared_distance(&point, &centroids.row(label)))
        .sum()
}

fn squared_distance(a: &ArrayView1<f64>, b: &ArrayView1<f64>) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum()
}

/// Calculate Euclidean distance between two points
pub(crate) fn euclidean_distance(a: &ArrayView1<f64>, b: &ArrayView1<f64>) -> f64 {
    squared_distance(a, b).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use proptest::prelude::*;

    fn params(k: usize) -> KMeansParams {
        KMeansParams {
            n_clusters: k,
            ..KMeansParams::default()
        }
    }

    fn two_blobs() -> Array2<f64> {
        array![
            [0.0, 0.0, 0.0],
            [0.1, 0.2, 0.0],
            [0.2, 0.1, 0.1],
            [10.0, 10.0, 10.0],
            [10.1, 9.9, 10.2],
            [9.8, 10.2, 10.0],
        ]
    }

    #[test]
    fn test_fit_kmeans_separates_blobs() {
        let model = fit_kmeans(&two_blobs(), &params(2)).unwrap();

        assert_eq!(model.n_clusters, 2);
        assert_eq!(model.labels.len(), 6);
        assert_eq!(model.centroids.shape(), &[2, 3]);
        assert!(model.converged);

        let first = model.labels[0];
        assert!(model.labels[..3].iter().all(|&l| l == first));
        assert!(model.labels[3..].iter().all(|&l| l != first));
        assert_eq!(model.cluster_sizes(), {
            let mut sizes = vec![0, 0];
            sizes[first] = 3;
            sizes[1 - first] = 3;
            sizes
        });
    }

    #[test]
    fn test_same_seed_same_labels() {
        let data = two_blobs();
        let a = fit_kmeans(&data, &params(3)).unwrap();
        let b = fit_kmeans(&data, &params(3)).unwrap();
        assert_eq!(a.labels, b.labels);
        assert_eq!(a.centroids, b.centroids);
    }

    #[test]
    fn test_invalid_cluster_count() {
        let data = two_blobs();
        assert!(matches!(
            fit_kmeans(&data, &params(1)),
            Err(SegmentError::InvalidK { k: 1, records: 6 })
        ));
        assert!(matches!(
            fit_kmeans(&data, &params(7)),
            Err(SegmentError::InvalidK { k: 7, records: 6 })
        ));
    }

    #[test]
    fn test_empty_dataset() {
        let data = Array2::<f64>::zeros((0, 3));
        assert!(matches!(
            fit_kmeans(&data, &params(2)),
            Err(SegmentError::EmptyDataset)
        ));
    }

    #[test]
    fn test_identical_points_do_not_crash() {
        let data = array![[1.0, 1.0, 1.0], [1.0, 1.0, 1.0], [1.0, 1.0, 1.0]];
        let model = fit_kmeans(&data, &params(2)).unwrap();

        // every point ties at distance 0, so all go to centroid 0
        assert_eq!(model.labels, vec![0, 0, 0]);
        assert_eq!(model.cluster_sizes(), vec![3, 0]);
        assert_eq!(model.inertia, 0.0);
    }

    #[test]
    fn test_nearest_centroid_tie_breaks_low() {
        let centroids = array![[1.0, 0.0, 0.0], [-1.0, 0.0, 0.0]];
        let origin = array![0.0, 0.0, 0.0];
        assert_eq!(nearest_centroid(&origin.view(), &centroids), 0);
    }

    #[test]
    fn test_empty_cluster_keeps_centroid() {
        let data = array![[0.0, 0.0, 0.0], [1.0, 1.0, 1.0]];
        let centroids = array![[0.5, 0.5, 0.5], [9.0, 9.0, 9.0]];
        let (updated, empty) = update_centroids(&data, &[0, 0], &centroids);

        assert_eq!(empty, 1);
        assert_eq!(updated.row(0).to_vec(), vec![0.5, 0.5, 0.5]);
        assert_eq!(updated.row(1).to_vec(), vec![9.0, 9.0, 9.0]);
    }

    #[test]
    fn test_predict_uses_nearest_centroid() {
        let model = fit_kmeans(&two_blobs(), &params(2)).unwrap();
        let near_high = array![9.0, 9.0, 9.0];
        assert_eq!(model.predict(&near_high.view()), model.labels[3]);
    }

    #[test]
    fn test_model_inertia() {
        let model = fit_kmeans(&two_blobs(), &params(2)).unwrap();
        assert!(model.inertia >= 0.0);
        assert!(model.inertia.is_finite());
        assert!(model.inertia < 1.0);
    }

    proptest! {
        #[test]
        fn prop_labels_in_range(
            values in proptest::collection::vec(0.0f64..100.0, 6..60),
            k in 2usize..5,
            seed in any::<u64>(),
        ) {
            let n = values.len() / 3;
            prop_assume!(k <= n);
            let data = Array2::from_shape_vec((n, 3), values[..n * 3].to_vec()).unwrap();
            let params = KMeansParams { n_clusters: k, seed, ..KMeansParams::default() };

            let model = fit_kmeans(&data, &params).unwrap();
            prop_assert_eq!(model.labels.len(), n);
            prop_assert!(model.labels.iter().all(|&l| l < k));
            prop_assert_eq!(model.cluster_sizes().iter().sum::<usize>(), n);
        }
    }
}
