//! Customer records and field validation

use crate::error::ValidationError;

/// Oldest age accepted for a customer.
pub const MAX_AGE: i64 = 120;
/// Upper bound of the spending score scale.
pub const MAX_SPENDING_SCORE: f64 = 100.0;

/// A single customer row.
///
/// `cluster` is session-local: it is never persisted and is only ever written by a
/// clustering run over the whole store.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomerRecord {
    pub customer_id: String,
    pub age: i64,
    pub annual_income: f64,
    pub spending_score: f64,
    pub cluster: Option<usize>,
}

impl CustomerRecord {
    /// Build an unlabelled record. No validation happens here, see [`validate`].
    pub fn new(
        customer_id: impl Into<String>,
        age: i64,
        annual_income: f64,
        spending_score: f64,
    ) -> Self {
        Self {
            customer_id: customer_id.into(),
            age,
            annual_income,
            spending_score,
            cluster: None,
        }
    }

    /// The clustering features in fixed order: age, annual income, spending score.
    pub fn features(&self) -> [f64; 3] {
        [self.age as f64, self.annual_income, self.spending_score]
    }

    /// Same record with the cluster label dropped.
    pub fn without_cluster(&self) -> Self {
        Self {
            cluster: None,
            ..self.clone()
        }
    }
}

/// Check a candidate record against the domain constraints.
///
/// Constraints are checked in order (id, age, income, spending score) and the first
/// failure is returned.
pub fn validate(record: &CustomerRecord) -> Result<(), ValidationError> {
    if record.customer_id.is_empty() {
        return Err(ValidationError::EmptyCustomerId);
    }
    if !(0..=MAX_AGE).contains(&record.age) {
        return Err(ValidationError::AgeOutOfRange { age: record.age });
    }
    // NaN fails both comparisons
    if !(record.annual_income >= 0.0 && record.annual_income.is_finite()) {
        return Err(ValidationError::InvalidAnnualIncome {
            income: record.annual_income,
        });
    }
    if !(0.0..=MAX_SPENDING_SCORE).contains(&record.spending_score) {
        return Err(ValidationError::SpendingScoreOutOfRange {
            score: record.spending_score,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_valid_record_passes() {
        assert!(validate(&CustomerRecord::new("C001", 35, 52_000.0, 61.5)).is_ok());
        assert!(validate(&CustomerRecord::new("edge", 0, 0.0, 0.0)).is_ok());
        assert!(validate(&CustomerRecord::new("edge", 120, 0.0, 100.0)).is_ok());
    }

    #[test]
    fn test_boundary_violations() {
        let cases = [
            (CustomerRecord::new("", 30, 1000.0, 50.0), ValidationError::EmptyCustomerId),
            (
                CustomerRecord::new("a", -1, 1000.0, 50.0),
                ValidationError::AgeOutOfRange { age: -1 },
            ),
            (
                CustomerRecord::new("a", 121, 1000.0, 50.0),
                ValidationError::AgeOutOfRange { age: 121 },
            ),
            (
                CustomerRecord::new("a", 30, -0.01, 50.0),
                ValidationError::InvalidAnnualIncome { income: -0.01 },
            ),
            (
                CustomerRecord::new("a", 30, 1000.0, -1.0),
                ValidationError::SpendingScoreOutOfRange { score: -1.0 },
            ),
            (
                CustomerRecord::new("a", 30, 1000.0, 101.0),
                ValidationError::SpendingScoreOutOfRange { score: 101.0 },
            ),
        ];

        for (record, expected) in cases {
            assert_eq!(validate(&record), Err(expected), "record: {record:?}");
        }
    }

    #[test]
    fn test_first_violation_wins() {
        let record = CustomerRecord::new("", 500, -3.0, 900.0);
        assert_eq!(validate(&record), Err(ValidationError::EmptyCustomerId));

        let record = CustomerRecord::new("x", 500, -3.0, 900.0);
        assert_eq!(
            validate(&record),
            Err(ValidationError::AgeOutOfRange { age: 500 })
        );
    }

    #[test]
    fn test_non_finite_values_rejected() {
        let nan_income = CustomerRecord::new("x", 30, f64::NAN, 50.0);
        assert!(matches!(
            validate(&nan_income),
            Err(ValidationError::InvalidAnnualIncome { .. })
        ));

        let inf_income = CustomerRecord::new("x", 30, f64::INFINITY, 50.0);
        assert!(validate(&inf_income).is_err());

        let nan_score = CustomerRecord::new("x", 30, 10.0, f64::NAN);
        assert!(matches!(
            validate(&nan_score),
            Err(ValidationError::SpendingScoreOutOfRange { .. })
        ));
    }

    proptest! {
        #[test]
        fn prop_validate_accepts_iff_constraints_hold(
            id in "[A-Za-z0-9]{0,6}",
            age in -20i64..150,
            income in -1000.0f64..200_000.0,
            score in -20.0f64..120.0,
        ) {
            let record = CustomerRecord::new(id.clone(), age, income, score);
            let expected = !id.is_empty()
                && (0..=120).contains(&age)
                && income >= 0.0
                && (0.0..=100.0).contains(&score);
            prop_assert_eq!(validate(&record).is_ok(), expected);
        }
    }
}
