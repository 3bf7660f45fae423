// Error handling utilities for consistent error messages and exit codes

use std::process;
use crate::models::Stage;

/// Exit with a user error (exit code 1)
/// User errors are for invalid input, missing resources, etc.
pub fn user_error(message: &str) -> ! {
    eprintln!("Error: {}", message);
    process::exit(1);
}

/// Exit with an internal error (exit code >1)
/// Internal errors are for unexpected system failures, database corruption, etc.
pub fn internal_error(message: &str) -> ! {
    eprintln!("Internal error: {}", message);
    process::exit(2);
}

/// Validate that a string is not empty
pub fn validate_non_empty(value: &str, field_name: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        Err(format!("{} cannot be empty", field_name))
    } else {
        Ok(())
    }
}

/// Validate that a lead ID is valid (positive integer)
pub fn validate_lead_id(id_str: &str) -> Result<i64, String> {
    id_str.parse::<i64>()
        .map_err(|_| format!("Invalid lead ID: '{}'. Lead ID must be a number.", id_str))
        .and_then(|id| {
            if id > 0 {
                Ok(id)
            } else {
                Err(format!("Invalid lead ID: {}. Lead ID must be positive.", id))
            }
        })
}

/// Validate that a board position is valid (non-negative integer)
pub fn validate_position(position_str: &str) -> Result<i64, String> {
    position_str.parse::<i64>()
        .map_err(|_| format!("Invalid position: '{}'. Position must be a number.", position_str))
        .and_then(|pos| {
            if pos >= 0 {
                Ok(pos)
            } else {
                Err(format!("Invalid position: {}. Position must be non-negative.", pos))
            }
        })
}

/// Validate a pipeline stage name
pub fn validate_stage(stage_str: &str) -> Result<Stage, String> {
    Stage::from_str(stage_str).ok_or_else(|| {
        let names: Vec<&str> = Stage::ALL.iter().map(|s| s.as_str()).collect();
        format!(
            "Invalid stage: '{}'. Valid stages are: {}.",
            stage_str,
            names.join(", ")
        )
    })
}

/// Validate a deal value (non-negative whole currency units)
pub fn validate_deal_value(value_str: &str) -> Result<i64, String> {
    value_str.parse::<i64>()
        .map_err(|_| format!("Invalid deal value: '{}'. Deal value must be a whole number.", value_str))
        .and_then(|value| {
            if value >= 0 {
                Ok(value)
            } else {
                Err(format!("Invalid deal value: {}. Deal value must be non-negative.", value))
            }
        })
}
