use super::{
    EstimateListing, EstimateStore, PersistenceError, PersistenceResult, StoredEstimate,
};
use crate::estimate::ProjectEstimate;
use crate::progress::{ProgressRecord, ProgressUpdate};
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Mutex;

#[derive(Debug, Default)]
struct Inner {
    next_id: i64,
    estimates: BTreeMap<i64, StoredEstimate>,
    progress: BTreeMap<i64, Vec<ProgressRecord>>,
}

/// Process-local store. One lock covers all state, so progress updates never interleave.
#[derive(Debug, Default)]
pub struct MemoryEstimateStore {
    inner: Mutex<Inner>,
}

impl MemoryEstimateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EstimateStore for MemoryEstimateStore {
    fn save_estimate(&self, estimate: &ProjectEstimate) -> PersistenceResult<i64> {
        super::validate_estimate(estimate)?;
        let mut inner = self.inner.lock().expect("estimate store mutex poisoned");
        inner.next_id += 1;
        let id = inner.next_id;
        inner.estimates.insert(
            id,
            StoredEstimate {
                id,
                created_at: Utc::now(),
                estimate: estimate.clone(),
            },
        );
        inner.progress.insert(id, ProgressRecord::for_estimate(estimate));
        tracing::info!(id, project = %estimate.project_name, "estimate committed");
        Ok(id)
    }

    fn load_estimate(&self, id: i64) -> PersistenceResult<Option<StoredEstimate>> {
        let inner = self.inner.lock().expect("estimate store mutex poisoned");
        Ok(inner.estimates.get(&id).cloned())
    }

    fn list_estimates(&self) -> PersistenceResult<Vec<EstimateListing>> {
        let inner = self.inner.lock().expect("estimate store mutex poisoned");
        Ok(inner.estimates.values().map(EstimateListing::from).collect())
    }

    fn progress_records(&self, id: i64) -> PersistenceResult<Vec<ProgressRecord>> {
        let inner = self.inner.lock().expect("estimate store mutex poisoned");
        inner
            .progress
            .get(&id)
            .cloned()
            .ok_or(PersistenceError::NotFound(id))
    }

    fn update_progress(
        &self,
        id: i64,
        element_id: &str,
        actual_days: f64,
    ) -> PersistenceResult<Option<ProgressUpdate>> {
        super::validate_actual_days(element_id, actual_days)?;
        let mut inner = self.inner.lock().expect("estimate store mutex poisoned");
        let records = inner
            .progress
            .get_mut(&id)
            .ok_or(PersistenceError::NotFound(id))?;
        let Some(record) = records.iter_mut().find(|r| r.element_id == element_id) else {
            return Ok(None);
        };
        let event = record.record(actual_days);
        Ok(Some(ProgressUpdate {
            record: record.clone(),
            event,
        }))
    }
}
