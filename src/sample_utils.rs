// sample_utils.rs
use crate::dist_utils::DistSpec;
use crate::error_utils::SimError;
use crate::table_utils::TableBuilder;
use rand::distributions::{Bernoulli, Distribution, Uniform};
use rand::seq::SliceRandom;
use rand::Rng;
use rand_distr::Normal;

/// Produces one Sample: an ordered sequence of exactly `n` independent draws from the given
/// Distribution Specification. Draws are i.i.d.; no draw depends on any other draw in this or
/// any other sample. The only shared mutable resource is the supplied generator, whose state
/// advances with each draw.
///
/// The underlying sampler is validated and constructed once for all `n` draws.
///
/// ```
/// use rand::rngs::StdRng;
/// use rand::SeedableRng;
/// use statsim::dist_utils::DistSpec;
/// use statsim::sample_utils::generate_sample;
///
/// let spec = DistSpec::Uniform { low: 0.0, high: 1.0 };
/// let mut rng = StdRng::seed_from_u64(42);
///
/// let sample = generate_sample(&spec, 5, &mut rng).unwrap();
/// assert_eq!(sample.len(), 5);
/// assert!(sample.iter().all(|&x| spec.supports(x)));
///
/// // n = 0 is a configuration mistake, not an empty sample
/// assert!(generate_sample(&spec, 0, &mut rng).is_err());
/// ```
pub fn generate_sample<R: Rng>(
    spec: &DistSpec,
    n: usize,
    rng: &mut R,
) -> Result<Vec<f64>, SimError> {
    if n == 0 {
        return Err(SimError::InvalidParameter(
            "sample size must be a positive integer".to_string(),
        ));
    }
    spec.validate()?;

    let mut draws = Vec::with_capacity(n);
    match spec {
        DistSpec::Uniform { low, high } => {
            let sampler = Uniform::new(*low, *high);
            for _ in 0..n {
                draws.push(sampler.sample(rng));
            }
        }
        DistSpec::Bernoulli { p } => {
            let sampler =
                Bernoulli::new(*p).map_err(|e| SimError::InvalidParameter(e.to_string()))?;
            for _ in 0..n {
                draws.push(if sampler.sample(rng) { 1.0 } else { 0.0 });
            }
        }
        DistSpec::Categorical { values } => {
            for _ in 0..n {
                draws.push(*values.choose(rng).unwrap());
            }
        }
        DistSpec::Normal { mean, std_dev } => {
            let sampler = Normal::new(*mean, *std_dev)
                .map_err(|e| SimError::InvalidParameter(e.to_string()))?;
            for _ in 0..n {
                draws.push(sampler.sample(rng));
            }
        }
    }

    Ok(draws)
}

/// Reduces a Sample to its arithmetic mean. Deterministic given the sample; defined for one
/// or more observations.
///
/// ```
/// use statsim::sample_utils::sample_mean;
///
/// assert_eq!(sample_mean(&[1.0, 2.0, 3.0]).unwrap(), 2.0);
/// assert_eq!(sample_mean(&[0.5]).unwrap(), 0.5);
/// assert!(sample_mean(&[]).is_err());
/// ```
pub fn sample_mean(values: &[f64]) -> Result<f64, SimError> {
    if values.is_empty() {
        return Err(SimError::InsufficientSampleSize {
            required: 1,
            actual: 0,
        });
    }
    Ok(values.iter().sum::<f64>() / values.len() as f64)
}

/// Reduces a Sample to its unbiased variance: the sum of squared deviations from the mean
/// divided by `n - 1`. Undefined for fewer than 2 observations.
///
/// ```
/// use statsim::error_utils::SimError;
/// use statsim::sample_utils::sample_variance;
///
/// assert_eq!(sample_variance(&[10.0, 20.0, 30.0]).unwrap(), 100.0);
///
/// // A single observation has a defined mean but no variance
/// assert_eq!(
///     sample_variance(&[0.5]),
///     Err(SimError::InsufficientSampleSize { required: 2, actual: 1 })
/// );
/// ```
pub fn sample_variance(values: &[f64]) -> Result<f64, SimError> {
    if values.len() < 2 {
        return Err(SimError::InsufficientSampleSize {
            required: 2,
            actual: values.len(),
        });
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let sum_of_squared_deviations = values.iter().map(|&v| (v - mean).powi(2)).sum::<f64>();
    Ok(sum_of_squared_deviations / (values.len() - 1) as f64)
}

/// Reduces a Sample to its unbiased standard deviation.
pub fn sample_std(values: &[f64]) -> Result<f64, SimError> {
    Ok(sample_variance(values)?.sqrt())
}

/// Computes the standard error of the mean: sqrt(variance / n).
///
/// ```
/// use statsim::sample_utils::standard_error;
///
/// assert_eq!(standard_error(100.0, 25).unwrap(), 2.0);
/// assert!(standard_error(100.0, 0).is_err());
/// assert!(standard_error(-1.0, 25).is_err());
/// ```
pub fn standard_error(variance: f64, n: usize) -> Result<f64, SimError> {
    if n == 0 {
        return Err(SimError::InvalidParameter(
            "standard error requires a positive sample size".to_string(),
        ));
    }
    if !variance.is_finite() || variance < 0.0 {
        return Err(SimError::InvalidParameter(format!(
            "variance must be finite and non-negative, got {}",
            variance
        )));
    }
    Ok((variance / n as f64).sqrt())
}

/// Computes the running mean after each draw: element `i` is the mean of `values[0..=i]`.
/// This is the Law of Large Numbers trace - the running mean converges to the true mean as
/// the number of draws grows, for any distribution with a finite mean.
///
/// ```
/// use statsim::sample_utils::cumulative_means;
///
/// let means = cumulative_means(&[1.0, 3.0, 5.0]);
/// assert_eq!(means, vec![1.0, 2.0, 3.0]);
/// assert!(cumulative_means(&[]).is_empty());
/// ```
pub fn cumulative_means(values: &[f64]) -> Vec<f64> {
    let mut running_sum = 0.0;
    values
        .iter()
        .enumerate()
        .map(|(i, &v)| {
            running_sum += v;
            running_sum / (i + 1) as f64
        })
        .collect()
}

/// Draws `n` values and lays out the Law of Large Numbers trace as a table with
/// `draw_number`, `draw`, `running_sum`, and `running_mean` columns, ready for an external
/// plotting collaborator.
///
/// ```
/// use rand::rngs::StdRng;
/// use rand::SeedableRng;
/// use statsim::dist_utils::DistSpec;
/// use statsim::sample_utils::lln_trace;
///
/// let coin = DistSpec::Bernoulli { p: 0.5 };
/// let mut rng = StdRng::seed_from_u64(42);
///
/// let table = lln_trace(&coin, 1000, &mut rng).unwrap();
/// assert_eq!(table.row_count(), 1000);
///
/// // The running mean settles near the true mean
/// let last = table.get_data().unwrap().last().unwrap()[3].parse::<f64>().unwrap();
/// assert!((last - 0.5).abs() < 0.1);
/// ```
pub fn lln_trace<R: Rng>(
    spec: &DistSpec,
    n: usize,
    rng: &mut R,
) -> Result<TableBuilder, SimError> {
    let draws = generate_sample(spec, n, rng)?;

    let mut table = TableBuilder::new();
    table.set_header(vec!["draw_number", "draw", "running_sum", "running_mean"]);

    let mut running_sum = 0.0;
    for (i, &draw) in draws.iter().enumerate() {
        running_sum += draw;
        let running_mean = running_sum / (i + 1) as f64;
        table.add_row(vec![
            &(i + 1).to_string(),
            &draw.to_string(),
            &running_sum.to_string(),
            &running_mean.to_string(),
        ]);
    }

    Ok(table)
}
