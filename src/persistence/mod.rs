use crate::estimate::{EstimateSummary, ProjectEstimate};
use crate::progress::{ProgressRecord, ProgressUpdate};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[cfg(feature = "sqlite")]
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("invalid data: {0}")]
    InvalidData(String),
    #[error("estimate {0} not found")]
    NotFound(i64),
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// A committed estimate as kept by a store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredEstimate {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub estimate: ProjectEstimate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimateListing {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub summary: EstimateSummary,
}

impl From<&StoredEstimate> for EstimateListing {
    fn from(stored: &StoredEstimate) -> Self {
        Self {
            id: stored.id,
            created_at: stored.created_at,
            summary: stored.estimate.summary(),
        }
    }
}

/// Keeps committed estimates and the progress records created alongside them.
///
/// `update_progress` is the only way progress changes, and implementations run its
/// read-modify-write without interleaving so the deviation latch trips at most once.
pub trait EstimateStore: Send + Sync {
    /// Commits the estimate and creates one progress record per element. Returns the new id.
    fn save_estimate(&self, estimate: &ProjectEstimate) -> PersistenceResult<i64>;
    fn load_estimate(&self, id: i64) -> PersistenceResult<Option<StoredEstimate>>;
    fn list_estimates(&self) -> PersistenceResult<Vec<EstimateListing>>;
    fn progress_records(&self, id: i64) -> PersistenceResult<Vec<ProgressRecord>>;
    /// `Ok(None)` when the estimate has no record for `element_id`.
    fn update_progress(
        &self,
        id: i64,
        element_id: &str,
        actual_days: f64,
    ) -> PersistenceResult<Option<ProgressUpdate>>;
}

pub fn validate_actual_days(element_id: &str, actual_days: f64) -> PersistenceResult<()> {
    if !actual_days.is_finite() || actual_days < 0.0 {
        return Err(PersistenceError::InvalidData(format!(
            "element '{element_id}' has invalid actual days {actual_days}"
        )));
    }
    Ok(())
}

pub fn validate_estimate(estimate: &ProjectEstimate) -> PersistenceResult<()> {
    for element in &estimate.elements {
        if element.element_id.trim().is_empty() {
            return Err(PersistenceError::InvalidData(
                "estimate contains an element without an id".into(),
            ));
        }
        let figures = [
            element.quantity,
            element.cost,
            element.baseline_days,
            element.allocated_days,
        ];
        if figures.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(PersistenceError::InvalidData(format!(
                "element '{}' has a negative or non-finite figure",
                element.element_id
            )));
        }
        if element.crew_needed == 0 {
            return Err(PersistenceError::InvalidData(format!(
                "element '{}' has a crew_needed of 0",
                element.element_id
            )));
        }
    }
    Ok(())
}

pub mod file;
pub mod memory;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use file::{
    load_estimate_from_csv, load_estimate_from_json, save_estimate_to_csv, save_estimate_to_json,
};
pub use memory::MemoryEstimateStore;
