//! Feature extraction and normalization for the clustering input

use ndarray::{Array1, Array2, ArrayView1, Axis};

use crate::record::CustomerRecord;

/// Number of numeric features per customer (age, annual income, spending score).
pub const N_FEATURES: usize = 3;

/// How raw features are transformed before clustering and scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeatureScaling {
    /// Z-score each column so income does not dominate the distance.
    #[default]
    Standard,
    /// Use the raw values.
    Raw,
}

/// Project records onto the `(n, 3)` raw feature matrix, in record order.
pub fn feature_matrix(records: &[CustomerRecord]) -> Array2<f64> {
    let mut matrix = Array2::zeros((records.len(), N_FEATURES));
    for (mut row, record) in matrix.outer_iter_mut().zip(records) {
        row.assign(&ArrayView1::from(&record.features()));
    }
    matrix
}

/// Column-wise z-score scaler.
#[derive(Debug, Clone, PartialEq)]
pub struct StandardScaler {
    pub mean: Array1<f64>,
    pub scale: Array1<f64>,
}

impl StandardScaler {
    /// Fit on `data`. Columns with zero variance get a unit scale.
    pub fn fit(data: &Array2<f64>) -> Self {
        let n_features = data.ncols();
        if data.nrows() == 0 {
            return Self::identity(n_features);
        }

        let mean = data
            .mean_axis(Axis(0))
            .unwrap_or_else(|| Array1::zeros(n_features));
        let scale = data
            .std_axis(Axis(0), 0.0)
            .mapv(|s| if s > f64::EPSILON { s } else { 1.0 });

        Self { mean, scale }
    }

    /// Scaler that leaves data unchanged.
    pub fn identity(n_features: usize) -> Self {
        Self {
            mean: Array1::zeros(n_features),
            scale: Array1::ones(n_features),
        }
    }

    pub fn transform(&self, data: &Array2<f64>) -> Array2<f64> {
        (data - &self.mean) / &self.scale
    }

    pub fn transform_point(&self, point: &[f64; N_FEATURES]) -> Array1<f64> {
        (&ArrayView1::from(point) - &self.mean) / &self.scale
    }

    /// Map scaled values back to raw feature units.
    pub fn inverse_transform(&self, data: &Array2<f64>) -> Array2<f64> {
        data * &self.scale + &self.mean
    }
}

/// Raw and scaled features for a record slice, plus the fitted scaler.
#[derive(Debug, Clone)]
pub struct Features {
    pub raw: Array2<f64>,
    pub scaled: Array2<f64>,
    pub scaler: StandardScaler,
}

impl Features {
    pub fn from_records(records: &[CustomerRecord], scaling: FeatureScaling) -> Self {
        let raw = feature_matrix(records);
        let scaler = match scaling {
            FeatureScaling::Standard => StandardScaler::fit(&raw),
            FeatureScaling::Raw => StandardScaler::identity(N_FEATURES),
        };
        let scaled = scaler.transform(&raw);
        Self {
            raw,
            scaled,
            scaler,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn records() -> Vec<CustomerRecord> {
        vec![
            CustomerRecord::new("A", 25, 30_000.0, 40.0),
            CustomerRecord::new("B", 40, 80_000.0, 70.0),
            CustomerRecord::new("C", 22, 25_000.0, 35.0),
        ]
    }

    #[test]
    fn test_feature_matrix_order() {
        let matrix = feature_matrix(&records());
        assert_eq!(matrix.shape(), &[3, 3]);
        assert_eq!(matrix.row(1).to_vec(), vec![40.0, 80_000.0, 70.0]);
    }

    #[test]
    fn test_standard_scaler_centers_and_scales() {
        let features = Features::from_records(&records(), FeatureScaling::Standard);
        let means = features.scaled.mean_axis(Axis(0)).unwrap();
        let stds = features.scaled.std_axis(Axis(0), 0.0);

        for (&m, &s) in means.iter().zip(stds.iter()) {
            assert!(m.abs() < 1e-9, "mean {m} should be ~0");
            assert!((s - 1.0).abs() < 1e-9, "std {s} should be ~1");
        }
    }

    #[test]
    fn test_constant_column_does_not_divide_by_zero() {
        let data = array![[30.0, 1.0, 5.0], [30.0, 2.0, 6.0]];
        let scaler = StandardScaler::fit(&data);
        assert_eq!(scaler.scale[0], 1.0);
        assert!(scaler.transform(&data).iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_raw_scaling_is_identity() {
        let features = Features::from_records(&records(), FeatureScaling::Raw);
        assert_eq!(features.raw, features.scaled);
    }

    #[test]
    fn test_inverse_transform_recovers_raw() {
        let features = Features::from_records(&records(), FeatureScaling::Standard);
        let restored = features.scaler.inverse_transform(&features.scaled);
        for (a, b) in restored.iter().zip(features.raw.iter()) {
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn test_transform_point_matches_matrix_transform() {
        let features = Features::from_records(&records(), FeatureScaling::Standard);
        let point = features.scaler.transform_point(&[40.0, 80_000.0, 70.0]);
        for (a, b) in point.iter().zip(features.scaled.row(1).iter()) {
            assert!((a - b).abs() < 1e-12);
        }
    }
}
