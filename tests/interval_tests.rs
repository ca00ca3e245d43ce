// interval_tests.rs
use statsim::dist_utils::DistSpec;
use statsim::error_utils::SimError;
use statsim::experiment_utils::ExperimentBuilder;
use statsim::interval_utils::{
    coverage_rate, interval_table, intervals_from_collection, IntervalEstimate,
};
use statsim::sample_utils::{sample_mean, sample_variance};

#[test]
fn interval_arithmetic_is_symmetric_around_the_mean() {
    // mean 0.5, variance 0.09, n = 36 => se = 0.05
    let ci = IntervalEstimate::from_stats(0.5, 0.09, 36, 1.96).unwrap();

    assert!((ci.lower - (0.5 - 1.96 * 0.05)).abs() < 1e-12);
    assert!((ci.upper - (0.5 + 1.96 * 0.05)).abs() < 1e-12);
    assert!((ci.width() - 2.0 * 1.96 * 0.05).abs() < 1e-12);

    assert!(ci.contains(0.5));
    assert!(ci.contains(ci.lower));
    assert!(ci.contains(ci.upper));
    assert!(!ci.contains(0.7));
}

#[test]
fn interval_rejects_out_of_domain_inputs() {
    assert!(IntervalEstimate::from_stats(0.5, -0.01, 36, 1.96).is_err());
    assert!(IntervalEstimate::from_stats(0.5, 0.09, 0, 1.96).is_err());
    assert!(IntervalEstimate::from_stats(f64::NAN, 0.09, 36, 1.96).is_err());
}

#[test]
fn one_observation_has_a_mean_but_no_interval_ingredients() {
    // n = 1 boundary: the mean is defined, the unbiased variance is not
    let single = [0.42];
    assert_eq!(sample_mean(&single).unwrap(), 0.42);
    assert_eq!(
        sample_variance(&single),
        Err(SimError::InsufficientSampleSize {
            required: 2,
            actual: 1
        })
    );
}

#[test]
fn interval_construction_requires_tracked_variances() {
    let results = ExperimentBuilder::new()
        .set_distribution(DistSpec::Uniform { low: 0.0, high: 1.0 })
        .set_sample_size(50)
        .set_repetitions(10)
        .set_seed(1)
        .run()
        .unwrap();

    match intervals_from_collection(&results, 1.96) {
        Err(SimError::InvalidParameter(_)) => {}
        other => panic!("expected InvalidParameter, got {:?}", other),
    }
}

#[test]
fn nominal_95_percent_intervals_cover_the_true_mean_about_95_percent_of_the_time() {
    let results = ExperimentBuilder::new()
        .set_distribution(DistSpec::Uniform { low: 0.0, high: 1.0 })
        .set_sample_size(50)
        .set_repetitions(1000)
        .set_seed(42)
        .track_variance()
        .run()
        .unwrap();

    let intervals = intervals_from_collection(&results, 1.96).unwrap();
    assert_eq!(intervals.len(), 1000);

    let coverage = coverage_rate(&intervals, 0.5).unwrap();
    assert!(
        (0.92..=0.97).contains(&coverage),
        "expected coverage near 0.95, got {}",
        coverage
    );
}

#[test]
fn coverage_over_100_intervals_stays_in_the_expected_band() {
    // With only 100 intervals the covering count fluctuates; roughly 90 to 99 of them
    // should contain the true mean
    let results = ExperimentBuilder::new()
        .set_distribution(DistSpec::Uniform { low: 0.0, high: 1.0 })
        .set_sample_size(50)
        .set_repetitions(100)
        .set_seed(44)
        .track_variance()
        .run()
        .unwrap();

    let intervals = intervals_from_collection(&results, 1.96).unwrap();
    let covering = intervals.iter().filter(|ci| ci.contains(0.5)).count();

    assert!(
        (88..=100).contains(&covering),
        "expected roughly 90-99 covering intervals, got {}",
        covering
    );
}

#[test]
fn interval_table_is_ready_for_plotting() {
    let results = ExperimentBuilder::new()
        .set_distribution(DistSpec::Uniform { low: 0.0, high: 1.0 })
        .set_sample_size(50)
        .set_repetitions(20)
        .set_seed(7)
        .track_variance()
        .run()
        .unwrap();

    let mut table = interval_table(&results, 1.96, 0.5).unwrap();
    assert_eq!(
        table.get_headers().unwrap(),
        &[
            "experiment_id".to_string(),
            "sample_mean".to_string(),
            "sample_se".to_string(),
            "ci_lower".to_string(),
            "ci_upper".to_string(),
            "covers_true_mean".to_string(),
        ]
    );
    assert_eq!(table.row_count(), 20);

    // Bounds bracket their means
    for row in table.get_data().unwrap() {
        let mean: f64 = row[1].parse().unwrap();
        let lower: f64 = row[3].parse().unwrap();
        let upper: f64 = row[4].parse().unwrap();
        assert!(lower <= mean && mean <= upper);
    }

    table.print_table();
}
