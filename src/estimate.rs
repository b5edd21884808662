use crate::catalog::Catalog;
use crate::element::{ElementEstimate, ElementRequest};
use crate::element_validation::{self, ValidationError};
use polars::prelude::{DataFrame, PolarsResult};
use serde::{Deserialize, Serialize};

/// One line of a calculation request as submitted by a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementInput {
    pub element_id: String,
    #[serde(default)]
    pub quantity: f64,
    /// Blank falls back to the catalog's default crew, then to 1.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crew_size: Option<i64>,
}

impl ElementInput {
    pub fn new(element_id: impl Into<String>, quantity: f64, crew_size: Option<i64>) -> Self {
        Self {
            element_id: element_id.into(),
            quantity,
            crew_size,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationRequest {
    #[serde(default = "default_project_name")]
    pub project_name: String,
    /// Country the rates apply to.
    #[serde(default = "default_country")]
    pub country: String,
    /// Target project duration in days; 0 leaves the schedule unconstrained.
    #[serde(default)]
    pub time_frame_days: f64,
    #[serde(default)]
    pub elements: Vec<ElementInput>,
}

fn default_project_name() -> String {
    "Untitled Project".to_string()
}

pub(crate) fn default_country() -> String {
    "UK".to_string()
}

impl Default for CalculationRequest {
    fn default() -> Self {
        Self {
            project_name: default_project_name(),
            country: default_country(),
            time_frame_days: 0.0,
            elements: Vec::new(),
        }
    }
}

impl CalculationRequest {
    /// Validates the raw input and turns it into requests the estimate builder accepts.
    pub fn element_requests(
        &self,
        catalog: &dyn Catalog,
    ) -> Result<Vec<ElementRequest>, ValidationError> {
        element_validation::validate_request(self)?;
        Ok(self
            .elements
            .iter()
            .map(|input| {
                let crew_size = match input.crew_size {
                    // validated as non-negative above
                    Some(crew) => u32::try_from(crew).unwrap_or(u32::MAX),
                    None => catalog
                        .resolve(&input.element_id)
                        .and_then(|entry| entry.default_crew)
                        .unwrap_or(1),
                };
                ElementRequest::new(input.element_id.trim(), input.quantity, crew_size)
            })
            .collect())
    }
}

/// Cost and schedule for a whole project. Built once per calculation and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectEstimate {
    pub project_name: String,
    #[serde(default = "default_country")]
    pub country: String,
    pub time_frame_days: f64,
    /// Factor applied to every baseline duration; 1 when the plan already fits.
    pub scale_factor: f64,
    pub elements: Vec<ElementEstimate>,
    pub total_cost: f64,
    pub total_baseline_days: f64,
    pub total_allocated_days: f64,
    /// Sum of crew needed over all elements.
    pub total_crew: u32,
    pub peak_crew_size: u32,
}

impl ProjectEstimate {
    pub fn empty(project_name: impl Into<String>, time_frame_days: f64) -> Self {
        Self {
            project_name: project_name.into(),
            country: default_country(),
            time_frame_days,
            scale_factor: 1.0,
            elements: Vec::new(),
            total_cost: 0.0,
            total_baseline_days: 0.0,
            total_allocated_days: 0.0,
            total_crew: 0,
            peak_crew_size: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn is_compressed(&self) -> bool {
        self.scale_factor < 1.0
    }

    pub fn element(&self, element_id: &str) -> Option<&ElementEstimate> {
        self.elements.iter().find(|e| e.element_id == element_id)
    }

    pub fn summary(&self) -> EstimateSummary {
        EstimateSummary {
            project_name: self.project_name.clone(),
            element_count: self.elements.len(),
            compressed_count: self.elements.iter().filter(|e| e.was_compressed()).count(),
            total_cost: self.total_cost,
            total_baseline_days: self.total_baseline_days,
            total_allocated_days: self.total_allocated_days,
            peak_crew_size: self.peak_crew_size,
        }
    }

    /// Breakdown table, one row per element in estimate order.
    pub fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        let elements: Vec<String> = self.elements.iter().map(|e| e.element_id.clone()).collect();
        let units: Vec<String> = self.elements.iter().map(|e| e.unit.clone()).collect();
        let quantities: Vec<f64> = self.elements.iter().map(|e| e.quantity).collect();
        let crews: Vec<u32> = self.elements.iter().map(|e| e.crew_size).collect();
        let costs: Vec<f64> = self.elements.iter().map(|e| e.cost).collect();
        let baseline: Vec<f64> = self.elements.iter().map(|e| e.baseline_days).collect();
        let allocated: Vec<f64> = self.elements.iter().map(|e| e.allocated_days).collect();
        let needed: Vec<u32> = self.elements.iter().map(|e| e.crew_needed).collect();
        polars::df!(
            "element" => elements,
            "unit" => units,
            "quantity" => quantities,
            "crew_size" => crews,
            "cost" => costs,
            "baseline_days" => baseline,
            "allocated_days" => allocated,
            "crew_needed" => needed
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimateSummary {
    pub project_name: String,
    pub element_count: usize,
    pub compressed_count: usize,
    pub total_cost: f64,
    pub total_baseline_days: f64,
    pub total_allocated_days: f64,
    pub peak_crew_size: u32,
}

impl EstimateSummary {
    pub fn to_cli_summary(&self) -> String {
        let mut parts = Vec::new();
        parts.push(format!("elements={}", self.element_count));
        parts.push(format!("cost={:.2}", self.total_cost));
        parts.push(format!("days={:.2}", self.total_allocated_days));
        if self.compressed_count > 0 {
            parts.push(format!("compressed={}", self.compressed_count));
            parts.push(format!("baseline_days={:.2}", self.total_baseline_days));
        }
        parts.push(format!("peak_crew={}", self.peak_crew_size));
        parts.join(", ")
    }
}
