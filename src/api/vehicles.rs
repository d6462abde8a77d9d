//! Vehicle endpoints

use axum::{
    extract::{rejection::{JsonRejection, QueryRejection}, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::{AppError, AppResult},
    models::vehicle::{CreateVehicle, UpdateVehicle, Vehicle, VehicleWithAssignment},
};

use super::{query_params, AuthenticatedUser, DeleteParams, EntityId};

/// List vehicles with the name of their current assignee
#[utoipa::path(
    get,
    path = "/vehicles",
    tag = "vehicles",
    responses(
        (status = 200, description = "Vehicles ordered by license plate", body = Vec<VehicleWithAssignment>)
    )
)]
pub async fn list_vehicles(
    State(state): State<crate::AppState>,
) -> AppResult<Json<Vec<VehicleWithAssignment>>> {
    let vehicles = state.services.vehicles.list().await?;
    Ok(Json(vehicles))
}

/// Get vehicle by ID
#[utoipa::path(
    get,
    path = "/vehicles/{id}",
    tag = "vehicles",
    params(("id" = Uuid, Path, description = "Vehicle ID")),
    responses(
        (status = 200, description = "Vehicle details", body = Vehicle),
        (status = 404, description = "Vehicle not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_vehicle(
    State(state): State<crate::AppState>,
    EntityId(id): EntityId,
) -> AppResult<Json<Vehicle>> {
    let vehicle = state
        .services
        .vehicles
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Vehicle {} not found", id)))?;
    Ok(Json(vehicle))
}

/// Register a vehicle
#[utoipa::path(
    post,
    path = "/vehicles",
    tag = "vehicles",
    security(("bearer_auth" = [])),
    request_body = CreateVehicle,
    responses(
        (status = 201, description = "Vehicle created", body = Vehicle),
        (status = 400, description = "Invalid input", body = crate::error::ErrorResponse),
        (status = 409, description = "License plate already registered", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_vehicle(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    payload: Result<Json<CreateVehicle>, JsonRejection>,
) -> AppResult<(StatusCode, Json<Vehicle>)> {
    let Json(data) = payload?;
    let vehicle = state.services.vehicles.create(data).await?;
    Ok((StatusCode::CREATED, Json(vehicle)))
}

/// Update a vehicle
#[utoipa::path(
    patch,
    path = "/vehicles/{id}",
    tag = "vehicles",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Vehicle ID")),
    request_body = UpdateVehicle,
    responses(
        (status = 200, description = "Vehicle updated", body = Vehicle),
        (status = 400, description = "Invalid input", body = crate::error::ErrorResponse),
        (status = 404, description = "Vehicle not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Plate taken, or status change while assigned", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_vehicle(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    EntityId(id): EntityId,
    payload: Result<Json<UpdateVehicle>, JsonRejection>,
) -> AppResult<Json<Vehicle>> {
    let Json(data) = payload?;
    let vehicle = state.services.vehicles.update(id, data).await?;
    Ok(Json(vehicle))
}

/// Delete a vehicle
#[utoipa::path(
    delete,
    path = "/vehicles/{id}",
    tag = "vehicles",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Vehicle ID"), DeleteParams),
    responses(
        (status = 204, description = "Vehicle deleted"),
        (status = 404, description = "Vehicle not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Vehicle still referenced by assignments", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_vehicle(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    EntityId(id): EntityId,
    query: Result<Query<DeleteParams>, QueryRejection>,
) -> AppResult<StatusCode> {
    let params = query_params(query)?;
    state.services.vehicles.delete(id, params.force).await?;
    Ok(StatusCode::NO_CONTENT)
}
