use crate::estimate::ProjectEstimate;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Signal that an element has run past its allocated days. Emitted at most once per record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviationEvent {
    pub element_id: String,
    pub allocated_days: f64,
    pub actual_days: f64,
}

impl fmt::Display for DeviationEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Warning: installation of {} has exceeded its allocated time of {:.2} days ({:.2} days elapsed).",
            self.element_id, self.allocated_days, self.actual_days
        )
    }
}

/// Real-world progress of one element against a committed estimate.
///
/// `deviation_notified` is a one-way latch. Updates must go through [`ProgressRecord::record`]
/// and the read-modify-write must not interleave with another update of the same record;
/// stores serialize it behind a lock or a transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub element_id: String,
    pub allocated_days: f64,
    #[serde(default)]
    pub actual_days: f64,
    #[serde(default)]
    pub deviation_notified: bool,
    pub started_at: DateTime<Utc>,
}

impl ProgressRecord {
    pub fn new(element_id: impl Into<String>, allocated_days: f64) -> Self {
        Self {
            element_id: element_id.into(),
            allocated_days,
            actual_days: 0.0,
            deviation_notified: false,
            started_at: Utc::now(),
        }
    }

    /// One record per element, created when an estimate's schedule is committed.
    pub fn for_estimate(estimate: &ProjectEstimate) -> Vec<ProgressRecord> {
        let started_at = Utc::now();
        estimate
            .elements
            .iter()
            .map(|element| ProgressRecord {
                element_id: element.element_id.clone(),
                allocated_days: element.allocated_days,
                actual_days: 0.0,
                deviation_notified: false,
                started_at,
            })
            .collect()
    }

    pub fn is_overrun(&self) -> bool {
        self.actual_days > self.allocated_days
    }

    pub fn remaining_days(&self) -> f64 {
        (self.allocated_days - self.actual_days).max(0.0)
    }

    /// Stores the reported elapsed days and trips the latch on the first overrun.
    pub fn record(&mut self, actual_days: f64) -> Option<DeviationEvent> {
        self.actual_days = actual_days;
        if !self.is_overrun() || self.deviation_notified {
            return None;
        }
        self.deviation_notified = true;
        Some(DeviationEvent {
            element_id: self.element_id.clone(),
            allocated_days: self.allocated_days,
            actual_days,
        })
    }
}

pub fn record_progress(
    mut record: ProgressRecord,
    actual_days: f64,
) -> (ProgressRecord, Option<DeviationEvent>) {
    let event = record.record(actual_days);
    (record, event)
}

/// Result of applying one progress report through a store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub record: ProgressRecord,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<DeviationEvent>,
}
