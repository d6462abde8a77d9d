//! Assignment model: a vehicle lent to a client for a span of time

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::enums::AssignmentStatus;
use super::non_blank;
use crate::error::{AppError, AppResult};

/// Assignment record.
///
/// `end_date` is set exactly when the status is terminal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub id: Uuid,
    pub vehicle_id: Uuid,
    pub client_id: Uuid,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub status: AssignmentStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Assignment {
    /// New active assignment starting at `now`
    pub fn start(vehicle_id: Uuid, client_id: Uuid, notes: Option<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            vehicle_id,
            client_id,
            start_date: now,
            end_date: None,
            status: AssignmentStatus::Active,
            notes: non_blank(notes),
            created_at: now,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == AssignmentStatus::Active
    }

    /// Move an active assignment to a terminal state.
    ///
    /// Terminal assignments never transition again, so closing twice fails.
    pub fn close(&mut self, outcome: AssignmentStatus, now: DateTime<Utc>) -> AppResult<()> {
        if !outcome.is_terminal() {
            return Err(AppError::Internal(format!(
                "cannot close assignment {} into non-terminal state {}",
                self.id, outcome
            )));
        }
        if !self.is_active() {
            return Err(AppError::Conflict("assignment not active".to_string()));
        }
        self.status = outcome;
        self.end_date = Some(now);
        Ok(())
    }
}

/// Assignment with denormalized client and vehicle names
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentWithDetails {
    #[serde(flatten)]
    pub assignment: Assignment,
    /// "First Last"
    pub client_name: String,
    pub vehicle_plate: String,
    /// "Make Model"
    pub vehicle_model: String,
}

/// Create assignment request
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateAssignment {
    pub vehicle_id: Uuid,
    pub client_id: Uuid,
    #[validate(length(max = 2000, message = "Notes must be at most 2000 characters"))]
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn active() -> Assignment {
        Assignment::start(Uuid::new_v4(), Uuid::new_v4(), Some("  ".to_string()), Utc::now())
    }

    #[test]
    fn starts_active_without_end_date() {
        let assignment = active();
        assert!(assignment.is_active());
        assert_eq!(assignment.end_date, None);
        assert_eq!(assignment.notes, None);
        assert_eq!(assignment.start_date, assignment.created_at);
    }

    #[test]
    fn close_sets_end_date_and_status() {
        let mut assignment = active();
        let later = assignment.start_date + Duration::hours(3);
        assignment.close(AssignmentStatus::Completed, later).unwrap();
        assert_eq!(assignment.status, AssignmentStatus::Completed);
        assert_eq!(assignment.end_date, Some(later));
    }

    #[test]
    fn closing_twice_is_a_conflict_and_keeps_first_outcome() {
        let mut assignment = active();
        let first = Utc::now();
        assignment.close(AssignmentStatus::Cancelled, first).unwrap();

        let second = assignment.close(AssignmentStatus::Completed, first + Duration::minutes(1));
        assert!(matches!(second, Err(AppError::Conflict(_))));
        assert_eq!(assignment.status, AssignmentStatus::Cancelled);
        assert_eq!(assignment.end_date, Some(first));
    }

    #[test]
    fn cannot_close_into_active() {
        let mut assignment = active();
        assert!(assignment.close(AssignmentStatus::Active, Utc::now()).is_err());
        assert!(assignment.is_active());
    }
}
