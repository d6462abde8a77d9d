//! Data models for the fleet server

pub mod assignment;
pub mod client;
pub mod enums;
pub mod user;
pub mod vehicle;

use std::borrow::Cow;
use std::str::FromStr;

use validator::{ValidationError, ValidationErrors};

use crate::error::{AppError, AppResult};

// Re-export commonly used types
pub use assignment::{Assignment, AssignmentWithDetails};
pub use client::{Client, ClientWithAssignment};
pub use enums::{AssignmentStatus, ClientType, VehicleStatus, VehicleType};
pub use user::{User, UserClaims};
pub use vehicle::{Vehicle, VehicleWithAssignment};

/// Parse an enum-valued input field, recording a field error on failure.
pub(crate) fn parse_enum_field<T>(
    errors: &mut ValidationErrors,
    field: &'static str,
    value: &str,
) -> Option<T>
where
    T: FromStr<Err = String>,
{
    match value.parse() {
        Ok(parsed) => Some(parsed),
        Err(message) => {
            let mut error = ValidationError::new("enum");
            error.message = Some(Cow::from(message));
            error.add_param(Cow::from("value"), &value);
            errors.add(field, error);
            None
        }
    }
}

/// Record a custom field error
pub(crate) fn reject_field(errors: &mut ValidationErrors, field: &'static str, code: &'static str, message: &str) {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::from(message.to_string()));
    errors.add(field, error);
}

/// Start from the derive-generated validation result so custom checks can add to it
pub(crate) fn collect_errors(result: Result<(), ValidationErrors>) -> ValidationErrors {
    result.err().unwrap_or_default()
}

/// Fail with every recorded field error, if any
pub(crate) fn finish(errors: ValidationErrors) -> AppResult<()> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::InvalidFields(errors))
    }
}

/// Blank optional text is stored as NULL
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
