use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;
use thiserror::Error;

const DEFAULT_NEIGHBOURS: usize = 5;

#[derive(Debug, Error)]
pub enum EstimatorError {
    #[error("crew size must be at least 1 (got {0})")]
    InvalidCrewSize(u32),
    #[error("quantity must be a non-negative number (got {0})")]
    InvalidQuantity(f64),
    #[error("no historical samples available")]
    NoSamples,
    #[error("invalid estimator parameter: {0}")]
    InvalidParameter(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("unit estimator unavailable: {0}")]
    Unavailable(String),
}

/// Predicted pace and price for a single unit of an element.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UnitPrediction {
    pub time_per_unit: f64,
    pub cost_per_unit: f64,
}

impl UnitPrediction {
    pub fn new(time_per_unit: f64, cost_per_unit: f64) -> Self {
        Self {
            time_per_unit,
            cost_per_unit,
        }
    }
}

/// Predicts time and cost per unit for a requested quantity and crew.
///
/// Implementations must be deterministic for identical inputs within one calculation.
/// Input validation (e.g. a crew of zero) is the implementation's call.
pub trait UnitEstimator {
    fn predict(&self, quantity: f64, crew_size: u32) -> Result<UnitPrediction, EstimatorError>;
}

impl<F> UnitEstimator for F
where
    F: Fn(f64, u32) -> Result<UnitPrediction, EstimatorError>,
{
    fn predict(&self, quantity: f64, crew_size: u32) -> Result<UnitPrediction, EstimatorError> {
        self(quantity, crew_size)
    }
}

fn check_inputs(quantity: f64, crew_size: u32) -> Result<(), EstimatorError> {
    if !quantity.is_finite() || quantity < 0.0 {
        return Err(EstimatorError::InvalidQuantity(quantity));
    }
    if crew_size == 0 {
        return Err(EstimatorError::InvalidCrewSize(crew_size));
    }
    Ok(())
}

/// Labour-productivity model: a fixed amount of person-days per unit shared by the crew,
/// priced at a day rate on top of the material cost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateEstimator {
    pub labour_days_per_unit: f64,
    pub day_rate: f64,
    pub material_cost_per_unit: f64,
}

impl Default for RateEstimator {
    fn default() -> Self {
        Self {
            labour_days_per_unit: 0.5,
            day_rate: 220.0,
            material_cost_per_unit: 35.0,
        }
    }
}

impl RateEstimator {
    pub fn new(
        labour_days_per_unit: f64,
        day_rate: f64,
        material_cost_per_unit: f64,
    ) -> Result<Self, EstimatorError> {
        for (name, value) in [
            ("labour_days_per_unit", labour_days_per_unit),
            ("day_rate", day_rate),
            ("material_cost_per_unit", material_cost_per_unit),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(EstimatorError::InvalidParameter(format!(
                    "{name} must be a non-negative number (got {value})"
                )));
            }
        }
        Ok(Self {
            labour_days_per_unit,
            day_rate,
            material_cost_per_unit,
        })
    }
}

impl UnitEstimator for RateEstimator {
    fn predict(&self, quantity: f64, crew_size: u32) -> Result<UnitPrediction, EstimatorError> {
        check_inputs(quantity, crew_size)?;
        let time_per_unit = self.labour_days_per_unit / f64::from(crew_size);
        let cost_per_unit = self.material_cost_per_unit + self.day_rate * self.labour_days_per_unit;
        Ok(UnitPrediction::new(time_per_unit, cost_per_unit))
    }
}

/// One historical observation. Field names match the training sheet columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalSample {
    #[serde(alias = "Quantity")]
    pub quantity: f64,
    #[serde(alias = "People")]
    pub crew_size: u32,
    #[serde(alias = "Cost_per_Unit")]
    pub cost_per_unit: f64,
    #[serde(alias = "Time_per_Unit_Days")]
    pub time_per_unit: f64,
}

/// k-nearest-neighbour regression over past observations of (quantity, crew).
#[derive(Debug, Clone)]
pub struct SampleEstimator {
    samples: Vec<HistoricalSample>,
    neighbours: usize,
    quantity_range: (f64, f64),
    crew_range: (f64, f64),
}

fn span(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    })
}

fn normalise(value: f64, (lo, hi): (f64, f64)) -> f64 {
    if hi > lo { (value - lo) / (hi - lo) } else { 0.0 }
}

impl SampleEstimator {
    pub fn new(samples: Vec<HistoricalSample>, neighbours: usize) -> Result<Self, EstimatorError> {
        if samples.is_empty() {
            return Err(EstimatorError::NoSamples);
        }
        if neighbours == 0 {
            return Err(EstimatorError::InvalidParameter(
                "neighbour count must be at least 1".into(),
            ));
        }
        for (idx, sample) in samples.iter().enumerate() {
            let values = [sample.quantity, sample.cost_per_unit, sample.time_per_unit];
            if values.iter().any(|v| !v.is_finite() || *v < 0.0) {
                return Err(EstimatorError::InvalidParameter(format!(
                    "sample #{idx} has a negative or non-finite value"
                )));
            }
        }
        let quantity_range = span(samples.iter().map(|s| s.quantity));
        let crew_range = span(samples.iter().map(|s| f64::from(s.crew_size)));
        Ok(Self {
            samples,
            neighbours,
            quantity_range,
            crew_range,
        })
    }

    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self, EstimatorError> {
        let file = File::open(path)?;
        let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(file);
        let mut samples = Vec::new();
        for record in reader.deserialize::<HistoricalSample>() {
            samples.push(record?);
        }
        Self::new(samples, DEFAULT_NEIGHBOURS)
    }

    pub fn with_neighbours(mut self, neighbours: usize) -> Self {
        self.neighbours = neighbours.max(1);
        self
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }
}

impl UnitEstimator for SampleEstimator {
    fn predict(&self, quantity: f64, crew_size: u32) -> Result<UnitPrediction, EstimatorError> {
        check_inputs(quantity, crew_size)?;
        let q = normalise(quantity, self.quantity_range);
        let c = normalise(f64::from(crew_size), self.crew_range);

        let mut ranked: Vec<(f64, &HistoricalSample)> = self
            .samples
            .iter()
            .map(|s| {
                let dq = normalise(s.quantity, self.quantity_range) - q;
                let dc = normalise(f64::from(s.crew_size), self.crew_range) - c;
                ((dq * dq + dc * dc).sqrt(), s)
            })
            .collect();
        // stable sort keeps file order among equidistant samples
        ranked.sort_by(|a, b| a.0.total_cmp(&b.0));

        let nearest = &ranked[..self.neighbours.min(ranked.len())];
        let count = nearest.len() as f64;
        let time_per_unit = nearest.iter().map(|(_, s)| s.time_per_unit).sum::<f64>() / count;
        let cost_per_unit = nearest.iter().map(|(_, s)| s.cost_per_unit).sum::<f64>() / count;
        Ok(UnitPrediction::new(time_per_unit, cost_per_unit))
    }
}
