use serde::{Deserialize, Serialize};

/// One unit of requested work: a catalog element, how much of it, and the crew assigned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementRequest {
    pub element_id: String,
    /// Requested quantity in the element's catalog unit. Non-positive values exclude the element.
    pub quantity: f64,
    pub crew_size: u32,
}

impl ElementRequest {
    pub fn new(element_id: impl Into<String>, quantity: f64, crew_size: u32) -> Self {
        Self {
            element_id: element_id.into(),
            quantity,
            crew_size,
        }
    }

    pub fn is_included(&self) -> bool {
        self.quantity > 0.0
    }
}

/// Per-element line of an estimate before the schedule is compressed.
#[derive(Debug, Clone, PartialEq)]
pub struct BaselineEntry {
    pub element_id: String,
    pub unit: String,
    pub quantity: f64,
    pub crew_size: u32,
    pub time_per_unit: f64,
    pub cost_per_unit: f64,
    pub cost: f64,
    pub baseline_days: f64,
}

/// Final per-element breakdown produced by the estimate pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementEstimate {
    pub element_id: String,
    pub unit: String,
    pub quantity: f64,
    /// Crew size the estimate was requested with.
    pub crew_size: u32,
    pub time_per_unit: f64,
    pub cost_per_unit: f64,
    pub cost: f64,
    /// Days to finish the quantity at the predicted pace, ignoring the time frame.
    pub baseline_days: f64,
    /// Days left to the element once the schedule is fitted into the time frame.
    pub allocated_days: f64,
    /// Crew required to deliver the baseline effort inside `allocated_days`. Always at least 1.
    pub crew_needed: u32,
}

impl ElementEstimate {
    pub(crate) fn from_baseline(entry: BaselineEntry, allocated_days: f64, crew_needed: u32) -> Self {
        Self {
            element_id: entry.element_id,
            unit: entry.unit,
            quantity: entry.quantity,
            crew_size: entry.crew_size,
            time_per_unit: entry.time_per_unit,
            cost_per_unit: entry.cost_per_unit,
            cost: entry.cost,
            baseline_days: entry.baseline_days,
            allocated_days,
            crew_needed,
        }
    }

    pub fn was_compressed(&self) -> bool {
        self.allocated_days < self.baseline_days
    }
}
