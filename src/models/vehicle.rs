//! Vehicle model and related types

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use super::enums::{VehicleStatus, VehicleType};
use super::{collect_errors, finish, parse_enum_field, reject_field};
use crate::error::{AppError, AppResult};

/// Vehicle record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    pub id: Uuid,
    /// Upper-cased, unique
    pub license_plate: String,
    pub make: String,
    pub model: String,
    #[serde(rename = "type")]
    pub vehicle_type: VehicleType,
    pub location: String,
    pub status: VehicleStatus,
}

impl Vehicle {
    /// "Make Model", as shown in assignment listings
    pub fn display_model(&self) -> String {
        format!("{} {}", self.make, self.model)
    }

    /// "Make Model (PLATE)", as shown next to a client
    pub fn description(&self) -> String {
        format!("{} {} ({})", self.make, self.model, self.license_plate)
    }
}

/// Vehicle with the name of its current assignee
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VehicleWithAssignment {
    #[serde(flatten)]
    pub vehicle: Vehicle,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
}

pub fn normalize_plate(plate: &str) -> String {
    plate.trim().to_uppercase()
}

fn require_text(errors: &mut ValidationErrors, field: &'static str, value: &str) {
    if value.is_empty() {
        reject_field(errors, field, "required", &format!("{} must not be blank", field));
    }
}

/// Create vehicle request
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateVehicle {
    #[validate(length(max = 20, message = "License plate must be at most 20 characters"))]
    pub license_plate: String,
    #[validate(length(max = 100))]
    pub make: String,
    #[validate(length(max = 100))]
    pub model: String,
    /// sedan, suv, truck or van
    #[serde(rename = "type")]
    pub vehicle_type: String,
    #[validate(length(max = 200))]
    pub location: String,
    /// Initial status; defaults to available
    pub status: Option<String>,
}

impl CreateVehicle {
    fn trimmed(self) -> Self {
        Self {
            license_plate: self.license_plate.trim().to_string(),
            make: self.make.trim().to_string(),
            model: self.model.trim().to_string(),
            vehicle_type: self.vehicle_type,
            location: self.location.trim().to_string(),
            status: self.status,
        }
    }

    /// Validate the request and build a new vehicle record.
    ///
    /// Text fields are trimmed before their limits are checked.
    pub fn into_vehicle(self) -> AppResult<Vehicle> {
        let data = self.trimmed();
        let mut errors = collect_errors(data.validate());
        require_text(&mut errors, "licensePlate", &data.license_plate);
        require_text(&mut errors, "make", &data.make);
        require_text(&mut errors, "model", &data.model);
        require_text(&mut errors, "location", &data.location);

        let vehicle_type = parse_enum_field::<VehicleType>(&mut errors, "type", &data.vehicle_type);
        let status = match data.status.as_deref() {
            None => Some(VehicleStatus::Available),
            Some(raw) => parse_enum_field::<VehicleStatus>(&mut errors, "status", raw),
        };
        if status.is_some_and(|s| !s.is_editable()) {
            reject_field(
                &mut errors,
                "status",
                "lifecycle",
                "status 'assigned' is set by creating an assignment",
            );
        }
        finish(errors)?;

        let (Some(vehicle_type), Some(status)) = (vehicle_type, status) else {
            return Err(AppError::Validation("Invalid vehicle data".to_string()));
        };

        Ok(Vehicle {
            id: Uuid::new_v4(),
            license_plate: normalize_plate(&data.license_plate),
            make: data.make,
            model: data.model,
            vehicle_type,
            location: data.location,
            status,
        })
    }
}

/// Update vehicle request (only supplied fields change)
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateVehicle {
    #[validate(length(max = 20, message = "License plate must be at most 20 characters"))]
    pub license_plate: Option<String>,
    #[validate(length(max = 100))]
    pub make: Option<String>,
    #[validate(length(max = 100))]
    pub model: Option<String>,
    #[serde(rename = "type")]
    pub vehicle_type: Option<String>,
    #[validate(length(max = 200))]
    pub location: Option<String>,
    /// available, maintenance or out_of_service
    pub status: Option<String>,
}

impl UpdateVehicle {
    fn trimmed(self) -> Self {
        let trim = |value: Option<String>| value.map(|v| v.trim().to_string());
        Self {
            license_plate: trim(self.license_plate),
            make: trim(self.make),
            model: trim(self.model),
            vehicle_type: self.vehicle_type,
            location: trim(self.location),
            status: self.status,
        }
    }

    /// Merge the supplied fields into `vehicle`.
    ///
    /// A vehicle held by an active assignment keeps its status until that
    /// assignment ends.
    pub fn apply_to(self, vehicle: &mut Vehicle) -> AppResult<()> {
        let data = self.trimmed();
        let mut errors = collect_errors(data.validate());
        for (field, value) in [
            ("licensePlate", &data.license_plate),
            ("make", &data.make),
            ("model", &data.model),
            ("location", &data.location),
        ] {
            if let Some(value) = value {
                require_text(&mut errors, field, value);
            }
        }

        let vehicle_type = data
            .vehicle_type
            .as_deref()
            .and_then(|raw| parse_enum_field::<VehicleType>(&mut errors, "type", raw));
        let status = data
            .status
            .as_deref()
            .and_then(|raw| parse_enum_field::<VehicleStatus>(&mut errors, "status", raw));
        if status.is_some_and(|s| !s.is_editable()) {
            reject_field(
                &mut errors,
                "status",
                "lifecycle",
                "status 'assigned' is set by creating an assignment",
            );
        }
        finish(errors)?;

        if status.is_some() && vehicle.status == VehicleStatus::Assigned {
            return Err(AppError::Conflict(
                "vehicle is assigned; complete or cancel its assignment first".to_string(),
            ));
        }

        if let Some(plate) = data.license_plate {
            vehicle.license_plate = normalize_plate(&plate);
        }
        if let Some(make) = data.make {
            vehicle.make = make;
        }
        if let Some(model) = data.model {
            vehicle.model = model;
        }
        if let Some(vehicle_type) = vehicle_type {
            vehicle.vehicle_type = vehicle_type;
        }
        if let Some(location) = data.location {
            vehicle.location = location;
        }
        if let Some(status) = status {
            vehicle.status = status;
        }
        Ok(())
    }
}
