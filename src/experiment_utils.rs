// experiment_utils.rs
use crate::dist_utils::DistSpec;
use crate::error_utils::SimError;
use crate::sample_utils::{generate_sample, sample_mean, sample_std, sample_variance};
use anyhow::Result as AnyhowResult;
use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::Serialize;
use std::fs::File;
use uuid::Uuid;

/// Represents an ExperimentBuilder object. This struct allows you to configure a Monte Carlo
/// experiment - the distribution to draw from, the sample size `n` of each run, the number of
/// repetitions `R`, an optional fixed seed - and then execute all runs sequentially or in
/// parallel. Configuration mistakes are held in an internal error handler and surface when
/// the experiment is run.
///
/// Each Experiment Run draws one Sample of `n` i.i.d. values, reduces it to its mean (and,
/// when variance tracking is on, its unbiased variance), then discards the draws. The
/// Result Collection keeps one summary statistic per run, in experiment-index order.
///
/// ```
/// use statsim::experiment_utils::ExperimentBuilder;
///
/// let results = ExperimentBuilder::new()
///     .set_distribution_str("UNIFORM(0,1)")
///     .set_sample_size(5)
///     .set_repetitions(10000)
///     .set_seed(42)
///     .run()
///     .unwrap();
///
/// assert_eq!(results.len(), 10000);
/// assert!((results.empirical_mean().unwrap() - 0.5).abs() < 0.01);
/// ```
#[derive(Debug)]
pub struct ExperimentBuilder {
    dist: Option<DistSpec>,
    sample_size: usize,
    repetitions: usize,
    seed: Option<u64>,
    track_variance: bool,
    error: Option<SimError>,
}

impl Default for ExperimentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ExperimentBuilder {
    /// Creates a new, unconfigured `ExperimentBuilder`.
    pub fn new() -> Self {
        ExperimentBuilder {
            dist: None,
            sample_size: 0,
            repetitions: 0,
            seed: None,
            track_variance: false,
            error: None,
        }
    }

    /// Sets the Distribution Specification to draw from.
    pub fn set_distribution(&mut self, spec: DistSpec) -> &mut Self {
        self.dist = Some(spec);
        self
    }

    /// Sets the distribution from a string-option token, e.g. `"UNIFORM(0,1)"` or
    /// `"NORMAL(10,2)"`. A malformed token is recorded in the internal error handler and
    /// reported when the experiment is run.
    pub fn set_distribution_str(&mut self, token: &str) -> &mut Self {
        match DistSpec::parse(token) {
            Ok(spec) => self.dist = Some(spec),
            Err(e) => self.error = Some(e),
        }
        self
    }

    /// Sets the sample size `n` of each Experiment Run.
    pub fn set_sample_size(&mut self, n: usize) -> &mut Self {
        self.sample_size = n;
        self
    }

    /// Sets the repetition count `R`.
    pub fn set_repetitions(&mut self, r: usize) -> &mut Self {
        self.repetitions = r;
        self
    }

    /// Fixes the seed of the randomness source. With a fixed seed, repeated invocation with
    /// an identical configuration yields byte-identical Result Collections. Without one, a
    /// fresh seed is taken from the operating system per run set.
    pub fn set_seed(&mut self, seed: u64) -> &mut Self {
        self.seed = Some(seed);
        self
    }

    /// Also records each run's unbiased sample variance, paired with its mean. Required for
    /// confidence-interval construction; requires `n >= 2`.
    pub fn track_variance(&mut self) -> &mut Self {
        self.track_variance = true;
        self
    }

    fn validated_config(&self) -> Result<(DistSpec, usize, usize), SimError> {
        if let Some(e) = &self.error {
            return Err(e.clone());
        }
        let dist = self.dist.clone().ok_or_else(|| {
            SimError::InvalidParameter("no distribution configured".to_string())
        })?;
        dist.validate()?;
        if self.sample_size == 0 {
            return Err(SimError::InvalidParameter(
                "sample size must be a positive integer".to_string(),
            ));
        }
        if self.repetitions == 0 {
            return Err(SimError::InvalidParameter(
                "repetition count must be a positive integer".to_string(),
            ));
        }
        if self.track_variance && self.sample_size < 2 {
            return Err(SimError::InsufficientSampleSize {
                required: 2,
                actual: self.sample_size,
            });
        }
        Ok((dist, self.sample_size, self.repetitions))
    }

    /// Executes all `R` Experiment Runs sequentially on a single randomness stream and
    /// collects the Result Collection.
    pub fn run(&self) -> Result<ResultCollection, SimError> {
        let (dist, n, r) = self.validated_config()?;
        let seed = self.seed.unwrap_or_else(rand::random);
        let started_at = Utc::now().format("%Y-%m-%d %H:%M:%S").to_string();

        let mut rng = StdRng::seed_from_u64(seed);
        let mut means = Vec::with_capacity(r);
        let mut variances = if self.track_variance {
            Some(Vec::with_capacity(r))
        } else {
            None
        };

        for _ in 0..r {
            let sample = generate_sample(&dist, n, &mut rng)?;
            means.push(sample_mean(&sample)?);
            if let Some(vars) = variances.as_mut() {
                vars.push(sample_variance(&sample)?);
            }
        }

        Ok(ResultCollection::assemble(
            dist, n, r, seed, started_at, means, variances,
        ))
    }

    /// Executes all `R` Experiment Runs across the rayon thread pool. Runs share no mutable
    /// state: each owns a randomness stream derived from the base seed and its experiment
    /// index, so the Result Collection is identical under any thread scheduling. The
    /// sequential and parallel streams differ from each other; each is individually
    /// reproducible for a given seed.
    pub fn run_parallel(&self) -> Result<ResultCollection, SimError> {
        let (dist, n, r) = self.validated_config()?;
        let seed = self.seed.unwrap_or_else(rand::random);
        let started_at = Utc::now().format("%Y-%m-%d %H:%M:%S").to_string();
        let track = self.track_variance;

        let runs: Result<Vec<(f64, Option<f64>)>, SimError> = (0..r)
            .into_par_iter()
            .map(|i| {
                let mut rng = StdRng::seed_from_u64(seed.wrapping_add(i as u64));
                let sample = generate_sample(&dist, n, &mut rng)?;
                let mean = sample_mean(&sample)?;
                let variance = if track {
                    Some(sample_variance(&sample)?)
                } else {
                    None
                };
                Ok((mean, variance))
            })
            .collect();
        let runs = runs?;

        let means = runs.iter().map(|(m, _)| *m).collect();
        let variances = if track {
            Some(runs.iter().map(|(_, v)| v.unwrap()).collect())
        } else {
            None
        };

        Ok(ResultCollection::assemble(
            dist, n, r, seed, started_at, means, variances,
        ))
    }
}

/// Represents a finalized Result Collection: one summary statistic per Experiment Run, in
/// experiment-index order (the order carries no statistical meaning - runs are
/// exchangeable). Read-only once assembled; the emergent distribution of the collected means
/// approximates the theoretical sampling distribution of the mean.
#[derive(Debug, Clone, Serialize)]
pub struct ResultCollection {
    run_id: String,
    dist: DistSpec,
    sample_size: usize,
    repetitions: usize,
    seed: u64,
    started_at: String,
    finished_at: String,
    means: Vec<f64>,
    variances: Option<Vec<f64>>,
}

impl ResultCollection {
    fn assemble(
        dist: DistSpec,
        sample_size: usize,
        repetitions: usize,
        seed: u64,
        started_at: String,
        means: Vec<f64>,
        variances: Option<Vec<f64>>,
    ) -> Self {
        let run_id = format!("{}-{}", Uuid::new_v4(), Utc::now().timestamp_millis());
        let finished_at = Utc::now().format("%Y-%m-%d %H:%M:%S").to_string();
        ResultCollection {
            run_id,
            dist,
            sample_size,
            repetitions,
            seed,
            started_at,
            finished_at,
            means,
            variances,
        }
    }

    /// The number of collected summary statistics; always equals the configured `R`.
    pub fn len(&self) -> usize {
        self.means.len()
    }

    pub fn is_empty(&self) -> bool {
        self.means.is_empty()
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn distribution(&self) -> &DistSpec {
        &self.dist
    }

    pub fn sample_size(&self) -> usize {
        self.sample_size
    }

    pub fn repetitions(&self) -> usize {
        self.repetitions
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// The collected sample means, one per Experiment Run.
    pub fn means(&self) -> &[f64] {
        &self.means
    }

    /// The collected unbiased sample variances, paired with `means`, when variance tracking
    /// was on.
    pub fn variances(&self) -> Option<&[f64]> {
        self.variances.as_deref()
    }

    /// The mean of the collected sample means.
    pub fn empirical_mean(&self) -> Result<f64, SimError> {
        sample_mean(&self.means)
    }

    /// The unbiased standard deviation of the collected sample means - the empirical
    /// estimate of the sampling distribution's spread.
    pub fn empirical_std(&self) -> Result<f64, SimError> {
        sample_std(&self.means)
    }

    /// The true mean of the configured distribution.
    pub fn theoretical_mean(&self) -> f64 {
        self.dist.theoretical_mean()
    }

    /// The Central Limit Theorem prediction for the spread of the sample means:
    /// distribution std / sqrt(n).
    pub fn theoretical_std_of_means(&self) -> f64 {
        self.dist.theoretical_std() / (self.sample_size as f64).sqrt()
    }

    /// Prints an empirical-vs-theoretical comparison of the run set, and returns self for
    /// chaining.
    pub fn print_summary(&self) -> &Self {
        println!("\nExperiment run: {}", self.run_id);
        println!(
            "Distribution: {:?} | n = {} | R = {} | seed = {}",
            self.dist, self.sample_size, self.repetitions, self.seed
        );
        println!("Started: {} | Finished: {}", self.started_at, self.finished_at);
        println!("{}", "-".repeat(60));
        println!("{:<24}{:<18}{:<18}", "", "Empirical", "Theoretical");

        let empirical_mean = self
            .empirical_mean()
            .map(|m| format!("{:.6}", m))
            .unwrap_or_else(|_| "n/a".to_string());
        println!(
            "{:<24}{:<18}{:<18.6}",
            "Mean of sample means",
            empirical_mean,
            self.theoretical_mean()
        );

        let empirical_std = self
            .empirical_std()
            .map(|s| format!("{:.6}", s))
            .unwrap_or_else(|_| "n/a".to_string());
        println!(
            "{:<24}{:<18}{:<18.6}",
            "Std of sample means",
            empirical_std,
            self.theoretical_std_of_means()
        );
        println!("{}", "-".repeat(60));

        self
    }

    /// Saves the collection as a CSV file with `experiment_id` and `sample_mean` columns
    /// (plus `sample_variance` when tracked), ready for an external plotting collaborator.
    pub fn save_as(&self, file_path: &str) -> AnyhowResult<&Self> {
        let file = File::create(file_path)?;
        let mut wtr = csv::Writer::from_writer(file);

        match &self.variances {
            Some(vars) => {
                wtr.write_record(["experiment_id", "sample_mean", "sample_variance"])?;
                for (i, (mean, var)) in self.means.iter().zip(vars.iter()).enumerate() {
                    wtr.write_record([
                        (i + 1).to_string(),
                        mean.to_string(),
                        var.to_string(),
                    ])?;
                }
            }
            None => {
                wtr.write_record(["experiment_id", "sample_mean"])?;
                for (i, mean) in self.means.iter().enumerate() {
                    wtr.write_record([(i + 1).to_string(), mean.to_string()])?;
                }
            }
        }
        wtr.flush()?;

        Ok(self)
    }

    /// Saves the collection, with its run metadata, as a JSON file.
    pub fn to_json(&self, file_path: &str) -> AnyhowResult<&Self> {
        let file = File::create(file_path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(self)
    }
}
