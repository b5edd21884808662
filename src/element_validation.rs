use crate::estimate::{CalculationRequest, ElementInput};
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("element '{element_id}' has invalid quantity {quantity} (must be a non-negative number)")]
    InvalidQuantity { element_id: String, quantity: f64 },
    #[error("element '{element_id}' has invalid crew size {crew_size} (must be non-negative)")]
    InvalidCrewSize { element_id: String, crew_size: i64 },
    #[error("time frame {0} is invalid (must be a non-negative number of days)")]
    InvalidTimeFrame(f64),
    #[error("element #{0} requires a non-empty element_id")]
    EmptyElementId(usize),
    #[error("element '{0}' is listed more than once")]
    DuplicateElement(String),
}

pub fn validate_time_frame(time_frame_days: f64) -> Result<(), ValidationError> {
    if !time_frame_days.is_finite() || time_frame_days < 0.0 {
        return Err(ValidationError::InvalidTimeFrame(time_frame_days));
    }
    Ok(())
}

pub fn validate_input(input: &ElementInput) -> Result<(), ValidationError> {
    if !input.quantity.is_finite() || input.quantity < 0.0 {
        return Err(ValidationError::InvalidQuantity {
            element_id: input.element_id.clone(),
            quantity: input.quantity,
        });
    }
    if let Some(crew) = input.crew_size {
        if crew < 0 || crew > i64::from(u32::MAX) {
            return Err(ValidationError::InvalidCrewSize {
                element_id: input.element_id.clone(),
                crew_size: crew,
            });
        }
    }
    Ok(())
}

pub fn validate_request(request: &CalculationRequest) -> Result<(), ValidationError> {
    validate_time_frame(request.time_frame_days)?;
    let mut seen = HashSet::with_capacity(request.elements.len());
    for (idx, input) in request.elements.iter().enumerate() {
        let element_id = input.element_id.trim();
        if element_id.is_empty() {
            return Err(ValidationError::EmptyElementId(idx));
        }
        if !seen.insert(element_id) {
            return Err(ValidationError::DuplicateElement(element_id.to_string()));
        }
        validate_input(input)?;
    }
    Ok(())
}
