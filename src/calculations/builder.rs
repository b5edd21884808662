use crate::calculations::compression::{CrewRounding, ScheduleCompressor};
use crate::catalog::Catalog;
use crate::element::{BaselineEntry, ElementRequest};
use crate::estimate::{ProjectEstimate, default_country};
use crate::estimator::{EstimatorError, UnitEstimator};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EstimateError {
    #[error("unit estimator failed for element '{element_id}': {source}")]
    Estimator {
        element_id: String,
        #[source]
        source: EstimatorError,
    },
}

/// Turns element requests into a compressed project estimate using an injected
/// catalog and unit estimator.
pub struct EstimateBuilder<'a> {
    catalog: &'a dyn Catalog,
    estimator: &'a dyn UnitEstimator,
    compressor: ScheduleCompressor,
    country: String,
}

impl<'a> EstimateBuilder<'a> {
    pub fn new(catalog: &'a dyn Catalog, estimator: &'a dyn UnitEstimator) -> Self {
        Self {
            catalog,
            estimator,
            compressor: ScheduleCompressor::default(),
            country: default_country(),
        }
    }

    pub fn with_rounding(mut self, rounding: CrewRounding) -> Self {
        self.compressor = ScheduleCompressor::new(rounding);
        self
    }

    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = country.into();
        self
    }

    /// Per-element baselines for every request with a positive quantity.
    ///
    /// Elements missing from the catalog are skipped. Any estimator failure aborts the
    /// whole calculation.
    pub fn baseline(&self, requests: &[ElementRequest]) -> Result<Vec<BaselineEntry>, EstimateError> {
        let mut entries = Vec::with_capacity(requests.len());
        for request in requests.iter().filter(|r| r.is_included()) {
            let Some(entry) = self.catalog.resolve(&request.element_id) else {
                tracing::warn!(element = %request.element_id, "element not in catalog, skipping");
                continue;
            };
            let prediction = self
                .estimator
                .predict(request.quantity, request.crew_size)
                .map_err(|source| EstimateError::Estimator {
                    element_id: request.element_id.clone(),
                    source,
                })?;
            entries.push(BaselineEntry {
                element_id: request.element_id.clone(),
                unit: entry.unit.clone(),
                quantity: request.quantity,
                crew_size: request.crew_size,
                time_per_unit: prediction.time_per_unit,
                cost_per_unit: prediction.cost_per_unit,
                cost: request.quantity * prediction.cost_per_unit,
                baseline_days: request.quantity * prediction.time_per_unit,
            });
        }
        Ok(entries)
    }

    pub fn build(
        &self,
        project_name: &str,
        requests: &[ElementRequest],
        time_frame_days: f64,
    ) -> Result<ProjectEstimate, EstimateError> {
        let entries = self.baseline(requests)?;
        let mut estimate = ProjectEstimate::empty(project_name, time_frame_days);
        estimate.country = self.country.clone();
        if entries.is_empty() {
            return Ok(estimate);
        }

        let mut total_cost = 0.0;
        let mut total_baseline_days = 0.0;
        for entry in &entries {
            total_cost += entry.cost;
            total_baseline_days += entry.baseline_days;
        }

        let schedule = self.compressor.compress(entries, time_frame_days);
        estimate.total_cost = total_cost;
        estimate.total_baseline_days = total_baseline_days;
        estimate.total_allocated_days = schedule.elements.iter().map(|e| e.allocated_days).sum();
        estimate.total_crew = schedule.elements.iter().map(|e| e.crew_needed).sum();
        estimate.peak_crew_size = schedule.peak_crew_size;
        estimate.scale_factor = schedule.scale_factor;
        estimate.elements = schedule.elements;

        tracing::debug!(
            project = project_name,
            elements = estimate.elements.len(),
            scale = estimate.scale_factor,
            peak_crew = estimate.peak_crew_size,
            "estimate built"
        );
        Ok(estimate)
    }
}
