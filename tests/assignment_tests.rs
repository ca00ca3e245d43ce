// assignment_tests.rs
use rand::rngs::StdRng;
use rand::SeedableRng;
use statsim::assignment_utils::{AssignmentConfig, TreatmentAssigner};
use statsim::dist_utils::DistSpec;
use statsim::error_utils::SimError;
use statsim::sample_utils::lln_trace;
use statsim::table_utils::TableBuilder;
use tempfile::NamedTempFile;

fn user_table(rows: usize) -> TableBuilder {
    let mut table = TableBuilder::new();
    table.set_header(vec!["user", "earnings"]);
    for i in 0..rows {
        table.add_row(vec![&format!("u{}", i), &format!("{}", 50 + (i % 40))]);
    }
    table
}

fn config(strategy: &str) -> AssignmentConfig {
    AssignmentConfig {
        strategy: strategy.to_string(),
        treatment_label: "Treatment".to_string(),
        control_label: "Control".to_string(),
    }
}

#[test]
fn exact_split_halves_the_table() {
    let mut table = user_table(101);
    let mut rng = StdRng::seed_from_u64(44);

    TreatmentAssigner::assign(&mut table, "treatment", &config("EXACT_SPLIT"), &mut rng)
        .unwrap();

    let idx = table.get_column_index("treatment").unwrap();
    let treated = table
        .get_data()
        .unwrap()
        .iter()
        .filter(|row| row[idx] == "Treatment")
        .count();

    // 101 rows: exactly 50 treated, 51 control
    assert_eq!(treated, 50);
    assert_eq!(table.row_count(), 101);
}

#[test]
fn coin_flip_keeps_the_audit_column_and_is_reproducible() {
    let mut first = user_table(200);
    let mut second = user_table(200);

    let mut rng_a = StdRng::seed_from_u64(44);
    let mut rng_b = StdRng::seed_from_u64(44);
    TreatmentAssigner::assign(&mut first, "treatment", &config("COIN_FLIP"), &mut rng_a)
        .unwrap();
    TreatmentAssigner::assign(&mut second, "treatment", &config("COIN_FLIP"), &mut rng_b)
        .unwrap();

    assert_eq!(
        first.get_headers().unwrap(),
        &[
            "user".to_string(),
            "earnings".to_string(),
            "random_number".to_string(),
            "treatment".to_string(),
        ]
    );
    assert_eq!(first.get_data().unwrap(), second.get_data().unwrap());

    // Each assignment matches its audited draw
    let draw_idx = first.get_column_index("random_number").unwrap();
    let label_idx = first.get_column_index("treatment").unwrap();
    for row in first.get_data().unwrap() {
        let draw: f64 = row[draw_idx].parse().unwrap();
        let expected = if draw > 0.5 { "Treatment" } else { "Control" };
        assert_eq!(row[label_idx], expected);
    }
}

#[test]
fn unknown_strategy_and_existing_column_are_rejected() {
    let mut table = user_table(10);
    let mut rng = StdRng::seed_from_u64(1);

    match TreatmentAssigner::assign(&mut table, "treatment", &config("ALTERNATE"), &mut rng) {
        Err(SimError::InvalidParameter(_)) => {}
        other => panic!("expected InvalidParameter, got {:?}", other),
    }

    match TreatmentAssigner::assign(&mut table, "earnings", &config("COIN_FLIP"), &mut rng) {
        Err(SimError::InvalidParameter(_)) => {}
        other => panic!("expected InvalidParameter, got {:?}", other),
    }
}

#[test]
fn group_counts_cover_every_row() {
    let mut table = user_table(150);
    let mut rng = StdRng::seed_from_u64(44);
    TreatmentAssigner::assign(&mut table, "treatment", &config("COIN_FLIP"), &mut rng)
        .unwrap();

    let counts = TreatmentAssigner::group_counts(&table, "treatment").unwrap();
    assert_eq!(counts.get_headers().unwrap(), &["treatment".to_string(), "n".to_string()]);

    let total: usize = counts
        .get_data()
        .unwrap()
        .iter()
        .map(|row| row[1].parse::<usize>().unwrap())
        .sum();
    assert_eq!(total, 150);

    assert!(TreatmentAssigner::group_counts(&table, "absent").is_err());
}

#[test]
fn balance_table_reports_per_group_statistics() {
    let table = TableBuilder::from_raw_data(
        vec!["earnings".to_string(), "treatment".to_string()],
        vec![
            vec!["10".to_string(), "Control".to_string()],
            vec!["20".to_string(), "Control".to_string()],
            vec!["30".to_string(), "Control".to_string()],
            vec!["12".to_string(), "Treatment".to_string()],
            vec!["18".to_string(), "Treatment".to_string()],
        ],
    );

    let balance = TreatmentAssigner::balance_table(&table, "treatment", "earnings").unwrap();
    let data = balance.get_data().unwrap();

    // BTreeMap ordering: Control first, then Treatment
    assert_eq!(data[0][0], "Control");
    assert_eq!(data[0][1], "3");
    assert_eq!(data[0][2], "20.0000");
    assert_eq!(data[0][3], "10.0000");

    assert_eq!(data[1][0], "Treatment");
    assert_eq!(data[1][1], "2");
    assert_eq!(data[1][2], "15.0000");
}

#[test]
fn randomized_groups_come_out_balanced() {
    let mut table = user_table(2000);
    let mut rng = StdRng::seed_from_u64(44);
    TreatmentAssigner::assign(&mut table, "treatment", &config("EXACT_SPLIT"), &mut rng)
        .unwrap();

    let group_idx = table.get_column_index("treatment").unwrap();
    let earn_idx = table.get_column_index("earnings").unwrap();
    let mut treatment = Vec::new();
    let mut control = Vec::new();
    for row in table.get_data().unwrap() {
        let earnings: f64 = row[earn_idx].parse().unwrap();
        if row[group_idx] == "Treatment" {
            treatment.push(earnings);
        } else {
            control.push(earnings);
        }
    }

    let t = TreatmentAssigner::welch_t_statistic(&treatment, &control).unwrap();
    assert!(
        t.abs() < 3.0,
        "randomized assignment should balance earnings, got t = {}",
        t
    );
}

#[test]
fn welch_t_statistic_edge_cases() {
    // Identical groups: zero difference
    let a = [10.0, 12.0, 14.0];
    let t = TreatmentAssigner::welch_t_statistic(&a, &a).unwrap();
    assert_eq!(t, 0.0);

    match TreatmentAssigner::welch_t_statistic(&a, &[1.0]) {
        Err(SimError::InsufficientSampleSize { .. }) => {}
        other => panic!("expected InsufficientSampleSize, got {:?}", other),
    }

    // Constant columns have no variance to test against
    assert!(TreatmentAssigner::welch_t_statistic(&[1.0, 1.0], &[2.0, 2.0]).is_err());
}

#[test]
fn lln_trace_settles_near_the_true_mean() {
    let die = DistSpec::Categorical {
        values: vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
    };
    let mut rng = StdRng::seed_from_u64(42);

    let table = lln_trace(&die, 5000, &mut rng).unwrap();
    assert_eq!(table.row_count(), 5000);
    assert_eq!(
        table.get_headers().unwrap(),
        &[
            "draw_number".to_string(),
            "draw".to_string(),
            "running_sum".to_string(),
            "running_mean".to_string(),
        ]
    );

    let last_mean: f64 = table.get_data().unwrap().last().unwrap()[3].parse().unwrap();
    assert!(
        (last_mean - 3.5).abs() < 0.15,
        "expected running mean near 3.5, got {}",
        last_mean
    );
}

#[test]
fn tables_round_trip_through_csv() {
    let mut table = user_table(25);
    let mut rng = StdRng::seed_from_u64(8);
    TreatmentAssigner::assign(&mut table, "treatment", &config("EXACT_SPLIT"), &mut rng)
        .unwrap();

    let tmp = NamedTempFile::new().unwrap();
    let path = tmp.path().to_str().unwrap();
    table.save_as(path).unwrap();

    let reloaded = TableBuilder::from_csv(path);
    assert!(!reloaded.has_error());
    assert_eq!(reloaded.get_headers().unwrap(), table.get_headers().unwrap());
    assert_eq!(reloaded.get_data().unwrap(), table.get_data().unwrap());

    // Column statistics survive the trip
    assert_eq!(reloaded.get_mean("earnings"), table.get_mean("earnings"));
    assert_eq!(
        reloaded.get_variance("earnings"),
        table.get_variance("earnings")
    );
}
