use super::{PersistenceError, PersistenceResult};
use crate::element::ElementEstimate;
use crate::estimate::{ProjectEstimate, default_country};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;

const METADATA_ROW: &str = "__project__";

pub fn save_estimate_to_json<P: AsRef<Path>>(
    estimate: &ProjectEstimate,
    path: P,
) -> PersistenceResult<()> {
    super::validate_estimate(estimate)?;
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, estimate)?;
    Ok(())
}

pub fn load_estimate_from_json<P: AsRef<Path>>(path: P) -> PersistenceResult<ProjectEstimate> {
    let file = File::open(path)?;
    let estimate: ProjectEstimate = serde_json::from_reader(file)?;
    super::validate_estimate(&estimate)?;
    Ok(estimate)
}

/// Flat row shared by the project row and the element rows. The project row carries
/// the aggregate figures as JSON and leaves the element columns empty.
#[derive(Default, Serialize, Deserialize)]
struct EstimateCsvRecord {
    element: String,
    unit: String,
    quantity: String,
    crew_size: String,
    time_per_unit: String,
    cost_per_unit: String,
    cost: String,
    baseline_days: String,
    allocated_days: String,
    crew_needed: String,
    #[serde(default)]
    project_json: String,
}

#[derive(Serialize, Deserialize)]
struct ProjectTotals {
    project_name: String,
    #[serde(default = "default_country")]
    country: String,
    time_frame_days: f64,
    scale_factor: f64,
    total_cost: f64,
    total_baseline_days: f64,
    total_allocated_days: f64,
    total_crew: u32,
    peak_crew_size: u32,
}

impl From<&ElementEstimate> for EstimateCsvRecord {
    fn from(element: &ElementEstimate) -> Self {
        Self {
            element: element.element_id.clone(),
            unit: element.unit.clone(),
            quantity: element.quantity.to_string(),
            crew_size: element.crew_size.to_string(),
            time_per_unit: element.time_per_unit.to_string(),
            cost_per_unit: element.cost_per_unit.to_string(),
            cost: element.cost.to_string(),
            baseline_days: element.baseline_days.to_string(),
            allocated_days: element.allocated_days.to_string(),
            crew_needed: element.crew_needed.to_string(),
            project_json: String::new(),
        }
    }
}

fn parse_field<T: std::str::FromStr>(element: &str, column: &str, value: &str) -> PersistenceResult<T>
where
    T::Err: std::fmt::Display,
{
    value.trim().parse::<T>().map_err(|err| {
        PersistenceError::InvalidData(format!(
            "element '{element}' has invalid {column} '{value}': {err}"
        ))
    })
}

impl EstimateCsvRecord {
    fn project_row(estimate: &ProjectEstimate) -> PersistenceResult<Self> {
        let totals = ProjectTotals {
            project_name: estimate.project_name.clone(),
            country: estimate.country.clone(),
            time_frame_days: estimate.time_frame_days,
            scale_factor: estimate.scale_factor,
            total_cost: estimate.total_cost,
            total_baseline_days: estimate.total_baseline_days,
            total_allocated_days: estimate.total_allocated_days,
            total_crew: estimate.total_crew,
            peak_crew_size: estimate.peak_crew_size,
        };
        Ok(Self {
            element: METADATA_ROW.to_string(),
            project_json: serde_json::to_string(&totals)?,
            ..Self::default()
        })
    }

    fn is_project_row(&self) -> bool {
        !self.project_json.trim().is_empty()
    }

    fn into_element(self) -> PersistenceResult<ElementEstimate> {
        let name = self.element.trim().to_string();
        Ok(ElementEstimate {
            quantity: parse_field(&name, "quantity", &self.quantity)?,
            crew_size: parse_field(&name, "crew_size", &self.crew_size)?,
            time_per_unit: parse_field(&name, "time_per_unit", &self.time_per_unit)?,
            cost_per_unit: parse_field(&name, "cost_per_unit", &self.cost_per_unit)?,
            cost: parse_field(&name, "cost", &self.cost)?,
            baseline_days: parse_field(&name, "baseline_days", &self.baseline_days)?,
            allocated_days: parse_field(&name, "allocated_days", &self.allocated_days)?,
            crew_needed: parse_field(&name, "crew_needed", &self.crew_needed)?,
            unit: self.unit,
            element_id: name,
        })
    }
}

pub fn save_estimate_to_csv<P: AsRef<Path>>(
    estimate: &ProjectEstimate,
    path: P,
) -> PersistenceResult<()> {
    super::validate_estimate(estimate)?;
    let file = File::create(path)?;
    let mut writer = csv::Writer::from_writer(file);
    writer.serialize(EstimateCsvRecord::project_row(estimate)?)?;
    for element in &estimate.elements {
        writer.serialize(EstimateCsvRecord::from(element))?;
    }
    writer.flush()?;
    Ok(())
}

pub fn load_estimate_from_csv<P: AsRef<Path>>(path: P) -> PersistenceResult<ProjectEstimate> {
    let file = File::open(path)?;
    let mut reader = csv::Reader::from_reader(file);
    let mut totals: Option<ProjectTotals> = None;
    let mut elements = Vec::new();
    for record in reader.deserialize::<EstimateCsvRecord>() {
        let record = record?;
        if record.is_project_row() {
            if totals.is_some() {
                return Err(PersistenceError::InvalidData(
                    "CSV file contained multiple project rows".into(),
                ));
            }
            totals = Some(serde_json::from_str(&record.project_json).map_err(|err| {
                PersistenceError::InvalidData(format!("invalid project json: {err}"))
            })?);
            continue;
        }
        elements.push(record.into_element()?);
    }

    let totals = totals
        .ok_or_else(|| PersistenceError::InvalidData("CSV file has no project row".into()))?;
    let estimate = ProjectEstimate {
        project_name: totals.project_name,
        country: totals.country,
        time_frame_days: totals.time_frame_days,
        scale_factor: totals.scale_factor,
        elements,
        total_cost: totals.total_cost,
        total_baseline_days: totals.total_baseline_days,
        total_allocated_days: totals.total_allocated_days,
        total_crew: totals.total_crew,
        peak_crew_size: totals.peak_crew_size,
    };
    super::validate_estimate(&estimate)?;
    Ok(estimate)
}
