use crate::element::{BaselineEntry, ElementEstimate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Absorbs float noise such as 3.9999999 before the crew count is rounded.
const ROUNDING_TOLERANCE: f64 = 1e-9;

/// How a fractional crew requirement becomes a head count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrewRounding {
    /// Floor with a 1e-9 tolerance: a ratio within 1e-9 below an integer counts as that
    /// integer, so this is not a strict truncation. Can under-staff a compressed element.
    #[default]
    Floor,
    /// Round up, so the crew always covers the compressed duration.
    Ceil,
}

impl CrewRounding {
    pub fn as_str(&self) -> &'static str {
        match self {
            CrewRounding::Floor => "floor",
            CrewRounding::Ceil => "ceil",
        }
    }

    fn apply(&self, value: f64) -> f64 {
        match self {
            CrewRounding::Floor => (value + ROUNDING_TOLERANCE).floor(),
            CrewRounding::Ceil => (value - ROUNDING_TOLERANCE).ceil(),
        }
    }
}

impl fmt::Display for CrewRounding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CrewRounding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "floor" => Ok(CrewRounding::Floor),
            "ceil" | "ceiling" => Ok(CrewRounding::Ceil),
            other => Err(format!("unknown crew rounding '{other}' (expected floor or ceil)")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompressedSchedule {
    pub elements: Vec<ElementEstimate>,
    pub scale_factor: f64,
    pub peak_crew_size: u32,
}

/// Fits baseline durations into a time frame by scaling them all by the same factor,
/// then works out the crew each element needs to deliver its baseline effort in the
/// shorter window.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScheduleCompressor {
    rounding: CrewRounding,
}

impl ScheduleCompressor {
    pub fn new(rounding: CrewRounding) -> Self {
        Self { rounding }
    }

    pub fn rounding(&self) -> CrewRounding {
        self.rounding
    }

    /// Scale applied to every baseline. A time frame of 0 means unconstrained.
    pub fn scale_factor(total_baseline_days: f64, time_frame_days: f64) -> f64 {
        if time_frame_days > 0.0 && total_baseline_days > time_frame_days {
            time_frame_days / total_baseline_days
        } else {
            1.0
        }
    }

    /// Crew required to keep `crew_size * baseline_days` person-days inside `allocated_days`.
    pub fn crew_needed(&self, crew_size: u32, baseline_days: f64, allocated_days: f64) -> u32 {
        if baseline_days <= 0.0 || allocated_days <= 0.0 {
            return crew_size.max(1);
        }
        let required = f64::from(crew_size) * baseline_days / allocated_days;
        let rounded = self.rounding.apply(required);
        if rounded >= f64::from(u32::MAX) {
            u32::MAX
        } else {
            (rounded as u32).max(1)
        }
    }

    pub fn compress(&self, entries: Vec<BaselineEntry>, time_frame_days: f64) -> CompressedSchedule {
        let total_baseline: f64 = entries.iter().map(|e| e.baseline_days).sum();

        if total_baseline == 0.0 {
            // nothing to schedule; keep baselines and report no crew
            let elements = entries
                .into_iter()
                .map(|entry| {
                    let crew = entry.crew_size.max(1);
                    let days = entry.baseline_days;
                    ElementEstimate::from_baseline(entry, days, crew)
                })
                .collect();
            return CompressedSchedule {
                elements,
                scale_factor: 1.0,
                peak_crew_size: 0,
            };
        }

        let scale = Self::scale_factor(total_baseline, time_frame_days);
        let mut peak = 0;
        let elements = entries
            .into_iter()
            .map(|entry| {
                let allocated = entry.baseline_days * scale;
                let crew = self.crew_needed(entry.crew_size, entry.baseline_days, allocated);
                peak = peak.max(crew);
                tracing::debug!(
                    element = %entry.element_id,
                    baseline_days = entry.baseline_days,
                    allocated_days = allocated,
                    crew_needed = crew,
                    "element scheduled"
                );
                ElementEstimate::from_baseline(entry, allocated, crew)
            })
            .collect();

        CompressedSchedule {
            elements,
            scale_factor: scale,
            peak_crew_size: peak,
        }
    }
}
