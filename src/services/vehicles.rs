//! Vehicle service

use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::vehicle::{CreateVehicle, UpdateVehicle, Vehicle, VehicleWithAssignment},
    projection,
    repository::{Party, Repository},
};

#[derive(Clone)]
pub struct VehiclesService {
    repository: Repository,
}

impl VehiclesService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// All vehicles with the name of their current assignee
    pub async fn list(&self) -> AppResult<Vec<VehicleWithAssignment>> {
        let snapshot = self.repository.snapshot().await?;
        Ok(projection::vehicle_views(&snapshot))
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Option<Vehicle>> {
        self.repository.get_vehicle(id).await
    }

    pub async fn create(&self, data: CreateVehicle) -> AppResult<Vehicle> {
        let vehicle = data.into_vehicle()?;

        let mut tx = self.repository.begin().await?;
        tx.insert_vehicle(&vehicle).await?;
        tx.commit().await?;

        tracing::info!(vehicle_id = %vehicle.id, plate = %vehicle.license_plate, "Vehicle created");
        Ok(vehicle)
    }

    pub async fn update(&self, id: Uuid, data: UpdateVehicle) -> AppResult<Vehicle> {
        let mut tx = self.repository.begin().await?;
        let mut vehicle = tx
            .vehicle_for_update(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Vehicle {} not found", id)))?;

        data.apply_to(&mut vehicle)?;
        tx.save_vehicle(&vehicle).await?;
        tx.commit().await?;

        tracing::info!(vehicle_id = %id, status = %vehicle.status, "Vehicle updated");
        Ok(vehicle)
    }

    /// Delete a vehicle.
    ///
    /// Refused while an assignment is active. Past assignments also block
    /// deletion unless `force` is set, in which case they are removed too.
    pub async fn delete(&self, id: Uuid, force: bool) -> AppResult<()> {
        let mut tx = self.repository.begin().await?;
        tx.vehicle_for_update(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Vehicle {} not found", id)))?;

        let history = tx.assignments_of(Party::Vehicle(id)).await?;
        if history.iter().any(|a| a.is_active()) {
            return Err(AppError::Conflict("vehicle has an active assignment".to_string()));
        }
        if !history.is_empty() {
            if !force {
                return Err(AppError::Conflict(format!(
                    "vehicle is referenced by {} past assignments",
                    history.len()
                )));
            }
            let removed = tx.delete_assignments_of(Party::Vehicle(id)).await?;
            tracing::warn!(vehicle_id = %id, removed, "Removing assignment history with vehicle");
        }

        tx.delete_vehicle(id).await?;
        tx.commit().await?;

        tracing::info!(vehicle_id = %id, "Vehicle deleted");
        Ok(())
    }
}
