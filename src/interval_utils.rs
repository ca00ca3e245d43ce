// interval_utils.rs
use crate::error_utils::SimError;
use crate::experiment_utils::ResultCollection;
use crate::table_utils::TableBuilder;
use serde::{Deserialize, Serialize};

/// Represents a symmetric interval estimate of a true mean, built from one Experiment Run's
/// summary statistics under the normal approximation. Purely deterministic arithmetic; no
/// distributional assumption is enforced beyond what the caller supplies via the
/// z-multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntervalEstimate {
    pub lower: f64,
    pub upper: f64,
}

impl IntervalEstimate {
    /// Builds the interval `mean ± z * sqrt(variance / n)`.
    ///
    /// ```
    /// use statsim::interval_utils::IntervalEstimate;
    ///
    /// // mean 0.5, variance 0.09, n = 36 => se = 0.05; z = 2 => ±0.1
    /// let ci = IntervalEstimate::from_stats(0.5, 0.09, 36, 2.0).unwrap();
    /// assert!((ci.lower - 0.4).abs() < 1e-12);
    /// assert!((ci.upper - 0.6).abs() < 1e-12);
    ///
    /// assert!(IntervalEstimate::from_stats(0.5, -0.1, 36, 2.0).is_err());
    /// assert!(IntervalEstimate::from_stats(0.5, 0.09, 0, 2.0).is_err());
    /// ```
    pub fn from_stats(mean: f64, variance: f64, n: usize, z: f64) -> Result<Self, SimError> {
        if n == 0 {
            return Err(SimError::InvalidParameter(
                "interval estimation requires a positive sample size".to_string(),
            ));
        }
        if !mean.is_finite() || !variance.is_finite() || !z.is_finite() {
            return Err(SimError::InvalidParameter(
                "interval estimation requires finite mean, variance, and z-multiplier"
                    .to_string(),
            ));
        }
        if variance < 0.0 {
            return Err(SimError::InvalidParameter(format!(
                "variance must be non-negative, got {}",
                variance
            )));
        }

        let half_width = z * (variance / n as f64).sqrt();
        Ok(IntervalEstimate {
            lower: mean - half_width,
            upper: mean + half_width,
        })
    }

    /// Returns true when `value` lies within the interval, bounds included.
    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value <= self.upper
    }

    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }
}

/// Builds one interval estimate per Experiment Run of a Result Collection, pairing each
/// run's mean with its tracked variance. The collection must have been run with variance
/// tracking on.
pub fn intervals_from_collection(
    collection: &ResultCollection,
    z: f64,
) -> Result<Vec<IntervalEstimate>, SimError> {
    let variances = collection.variances().ok_or_else(|| {
        SimError::InvalidParameter(
            "interval construction requires variance tracking; configure the experiment with track_variance"
                .to_string(),
        )
    })?;

    collection
        .means()
        .iter()
        .zip(variances.iter())
        .map(|(&mean, &variance)| {
            IntervalEstimate::from_stats(mean, variance, collection.sample_size(), z)
        })
        .collect()
}

/// Computes the coverage rate: the fraction of intervals that contain the true parameter
/// value. For nominal 95% intervals over repeated runs of a known distribution, this should
/// come out near 0.95.
///
/// ```
/// use statsim::interval_utils::{coverage_rate, IntervalEstimate};
///
/// let intervals = vec![
///     IntervalEstimate { lower: 0.4, upper: 0.6 },
///     IntervalEstimate { lower: 0.55, upper: 0.8 },
/// ];
/// assert_eq!(coverage_rate(&intervals, 0.5).unwrap(), 0.5);
/// assert!(coverage_rate(&[], 0.5).is_err());
/// ```
pub fn coverage_rate(intervals: &[IntervalEstimate], true_value: f64) -> Result<f64, SimError> {
    if intervals.is_empty() {
        return Err(SimError::InvalidParameter(
            "coverage rate requires at least one interval".to_string(),
        ));
    }
    let covering = intervals.iter().filter(|ci| ci.contains(true_value)).count();
    Ok(covering as f64 / intervals.len() as f64)
}

/// Lays out per-run interval estimates as a table with `experiment_id`, `sample_mean`,
/// `sample_se`, `ci_lower`, `ci_upper`, and `covers_true_mean` columns, ready for an
/// external plotting collaborator (the classic error-bar chart of repeated confidence
/// intervals around a known true mean).
pub fn interval_table(
    collection: &ResultCollection,
    z: f64,
    true_value: f64,
) -> Result<TableBuilder, SimError> {
    let intervals = intervals_from_collection(collection, z)?;
    let variances = collection.variances().unwrap();
    let n = collection.sample_size();

    let mut table = TableBuilder::new();
    table.set_header(vec![
        "experiment_id",
        "sample_mean",
        "sample_se",
        "ci_lower",
        "ci_upper",
        "covers_true_mean",
    ]);

    for (i, (ci, (&mean, &variance))) in intervals
        .iter()
        .zip(collection.means().iter().zip(variances.iter()))
        .enumerate()
    {
        let se = (variance / n as f64).sqrt();
        table.add_row(vec![
            &(i + 1).to_string(),
            &format!("{:.6}", mean),
            &format!("{:.6}", se),
            &format!("{:.6}", ci.lower),
            &format!("{:.6}", ci.upper),
            if ci.contains(true_value) { "true" } else { "false" },
        ]);
    }

    Ok(table)
}
