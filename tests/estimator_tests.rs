use estimate_tool::{
    EstimatorError, HistoricalSample, RateEstimator, SampleEstimator, UnitEstimator,
};
use std::io::Write;
use tempfile::NamedTempFile;

fn sample(quantity: f64, crew_size: u32, cost_per_unit: f64, time_per_unit: f64) -> HistoricalSample {
    HistoricalSample {
        quantity,
        crew_size,
        cost_per_unit,
        time_per_unit,
    }
}

#[test]
fn rate_estimator_shares_labour_across_the_crew() {
    let estimator = RateEstimator::new(1.2, 200.0, 30.0).unwrap();

    let solo = estimator.predict(10.0, 1).unwrap();
    let trio = estimator.predict(10.0, 3).unwrap();
    assert!((solo.time_per_unit - 1.2).abs() < 1e-12);
    assert!((trio.time_per_unit - 0.4).abs() < 1e-12);
    assert_eq!(solo.cost_per_unit, trio.cost_per_unit);
    assert!((solo.cost_per_unit - 270.0).abs() < 1e-9);
}

#[test]
fn rate_estimator_rejects_zero_crew_and_bad_quantity() {
    let estimator = RateEstimator::default();
    assert!(matches!(
        estimator.predict(5.0, 0),
        Err(EstimatorError::InvalidCrewSize(0))
    ));
    assert!(matches!(
        estimator.predict(f64::NAN, 2),
        Err(EstimatorError::InvalidQuantity(_))
    ));
    assert!(RateEstimator::new(-1.0, 100.0, 0.0).is_err());
}

#[test]
fn sample_estimator_averages_nearest_neighbours() {
    let samples = vec![
        sample(10.0, 2, 100.0, 1.0),
        sample(12.0, 2, 120.0, 1.2),
        sample(90.0, 8, 900.0, 4.0),
        sample(95.0, 9, 950.0, 4.5),
    ];
    let estimator = SampleEstimator::new(samples, 2).unwrap();

    let small = estimator.predict(11.0, 2).unwrap();
    assert!((small.cost_per_unit - 110.0).abs() < 1e-9);
    assert!((small.time_per_unit - 1.1).abs() < 1e-9);

    let large = estimator.predict(93.0, 9).unwrap();
    assert!((large.cost_per_unit - 925.0).abs() < 1e-9);
}

#[test]
fn sample_estimator_is_deterministic() {
    let samples = vec![
        sample(10.0, 2, 100.0, 1.0),
        sample(10.0, 2, 300.0, 3.0),
        sample(50.0, 5, 500.0, 2.0),
    ];
    let estimator = SampleEstimator::new(samples, 1).unwrap();
    let first = estimator.predict(10.0, 2).unwrap();
    let second = estimator.predict(10.0, 2).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.cost_per_unit, 100.0);
}

#[test]
fn sample_estimator_needs_samples() {
    assert!(matches!(
        SampleEstimator::new(Vec::new(), 3),
        Err(EstimatorError::NoSamples)
    ));
}

#[test]
fn sample_estimator_loads_training_sheet() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "Element,Quantity,People,Cost_per_Unit,Time_per_Unit_Days,Unit").unwrap();
    writeln!(file, "Brickwork,10,2,100,1.0,m2").unwrap();
    writeln!(file, "Flooring,20,3,200,2.0,m2").unwrap();
    file.flush().unwrap();

    let estimator = SampleEstimator::from_csv(file.path()).unwrap().with_neighbours(1);
    assert_eq!(estimator.sample_count(), 2);
    let prediction = estimator.predict(19.0, 3).unwrap();
    assert_eq!(prediction.cost_per_unit, 200.0);
    assert_eq!(prediction.time_per_unit, 2.0);
}
