//! Assignment lifecycle.
//!
//! An assignment ties one available vehicle to one available client. Creating
//! it marks both as taken; completing or cancelling it frees both again. Each
//! transition runs in a single transaction that locks the rows it touches in
//! a fixed order (assignment, vehicle, client), so two requests racing for the
//! same vehicle or client are serialized and the loser sees the winner's
//! writes.

use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        assignment::CreateAssignment, Assignment, AssignmentStatus, AssignmentWithDetails,
        VehicleStatus,
    },
    projection,
    repository::Repository,
};

#[derive(Clone)]
pub struct AssignmentsService {
    repository: Repository,
}

impl AssignmentsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Every assignment with names attached, newest first
    pub async fn list(&self) -> AppResult<Vec<AssignmentWithDetails>> {
        let snapshot = self.repository.snapshot().await?;
        Ok(projection::assignment_views(&snapshot))
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Option<Assignment>> {
        self.repository.get_assignment(id).await
    }

    /// Hand a vehicle to a client
    pub async fn create(&self, data: CreateAssignment) -> AppResult<Assignment> {
        data.validate()?;

        let mut tx = self.repository.begin().await?;

        let mut vehicle = tx
            .vehicle_for_update(data.vehicle_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Vehicle {} not found", data.vehicle_id)))?;
        let mut client = tx
            .client_for_update(data.client_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Client {} not found", data.client_id)))?;

        if vehicle.status != VehicleStatus::Available {
            tracing::warn!(vehicle_id = %vehicle.id, status = %vehicle.status, "Assignment refused");
            return Err(AppError::Conflict("vehicle not available".to_string()));
        }
        if !client.available {
            tracing::warn!(client_id = %client.id, "Assignment refused");
            return Err(AppError::Conflict("client not available".to_string()));
        }

        let assignment = Assignment::start(vehicle.id, client.id, data.notes, Utc::now());
        vehicle.status = VehicleStatus::Assigned;
        client.available = false;

        tx.save_vehicle(&vehicle).await?;
        tx.save_client(&client).await?;
        tx.insert_assignment(&assignment).await?;
        tx.commit().await?;

        tracing::info!(
            assignment_id = %assignment.id,
            vehicle_id = %vehicle.id,
            client_id = %client.id,
            "Assignment started"
        );
        Ok(assignment)
    }

    /// Vehicle returned at the end of the assignment
    pub async fn complete(&self, id: Uuid) -> AppResult<Assignment> {
        self.finish(id, AssignmentStatus::Completed).await
    }

    /// Assignment called off; frees the vehicle and client exactly like completion
    pub async fn cancel(&self, id: Uuid) -> AppResult<Assignment> {
        self.finish(id, AssignmentStatus::Cancelled).await
    }

    async fn finish(&self, id: Uuid, outcome: AssignmentStatus) -> AppResult<Assignment> {
        let mut tx = self.repository.begin().await?;

        let mut assignment = tx
            .assignment_for_update(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Assignment {} not found", id)))?;

        if let Err(e) = assignment.close(outcome, Utc::now()) {
            tracing::warn!(assignment_id = %id, status = %assignment.status, "Cannot {} assignment", verb(outcome));
            return Err(e);
        }

        let mut vehicle = tx
            .vehicle_for_update(assignment.vehicle_id)
            .await?
            .ok_or_else(|| AppError::Internal(format!("Assignment {} references a missing vehicle", id)))?;
        let mut client = tx
            .client_for_update(assignment.client_id)
            .await?
            .ok_or_else(|| AppError::Internal(format!("Assignment {} references a missing client", id)))?;

        vehicle.status = VehicleStatus::Available;
        client.available = true;

        tx.save_assignment(&assignment).await?;
        tx.save_vehicle(&vehicle).await?;
        tx.save_client(&client).await?;
        tx.commit().await?;

        tracing::info!(assignment_id = %id, status = %assignment.status, "Assignment closed");
        Ok(assignment)
    }
}

fn verb(outcome: AssignmentStatus) -> &'static str {
    match outcome {
        AssignmentStatus::Cancelled => "cancel",
        _ => "complete",
    }
}
