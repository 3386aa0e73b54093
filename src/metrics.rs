//! Clustering quality metrics

use std::collections::BTreeMap;

use ndarray::Array2;

use crate::error::{Result, SegmentError};
use crate::model::euclidean_distance;

/// Mean silhouette coefficient over every point.
///
/// For point `i`, `a` is the mean distance to the other members of its cluster and
/// `b` the smallest mean distance to the members of any other cluster; the point
/// scores `(b - a) / max(a, b)`. Points alone in their cluster score 0.
///
/// Needs at least two distinct labels and more points than distinct labels.
pub fn silhouette_score(features: &Array2<f64>, labels: &[usize]) -> Result<f64> {
    let n_samples = features.nrows();
    if labels.len() != n_samples {
        return Err(SegmentError::ShapeMismatch {
            records: n_samples,
            labels: labels.len(),
        });
    }

    // Dense re-indexing so sparse labels (e.g. {0, 4}) work.
    let mut index: BTreeMap<usize, usize> = BTreeMap::new();
    for &label in labels {
        let next = index.len();
        index.entry(label).or_insert(next);
    }
    let distinct = index.len();
    if distinct < 2 || n_samples < distinct + 1 {
        return Err(SegmentError::InsufficientClusters {
            distinct,
            records: n_samples,
        });
    }

    let dense: Vec<usize> = labels.iter().map(|l| index[l]).collect();
    let mut sizes = vec![0usize; distinct];
    for &c in &dense {
        sizes[c] += 1;
    }

    let mut silhouette_sum = 0.0;
    let mut distance_sums = vec![0.0; distinct];

    for i in 0..n_samples {
        let own = dense[i];
        if sizes[own] == 1 {
            continue;
        }

        distance_sums.iter_mut().for_each(|d| *d = 0.0);
        let point = features.row(i);
        for (j, other) in features.outer_iter().enumerate() {
            if i != j {
                distance_sums[dense[j]] += euclidean_distance(&point, &other);
            }
        }

        let a_i = distance_sums[own] / (sizes[own] - 1) as f64;
        let b_i = (0..distinct)
            .filter(|&c| c != own)
            .map(|c| distance_sums[c] / sizes[c] as f64)
            .fold(f64::INFINITY, f64::min);

        let denom = a_i.max(b_i);
        if denom > 0.0 {
            silhouette_sum += (b_i - a_i) / denom;
        }
    }

    Ok(silhouette_sum / n_samples as f64)
}
