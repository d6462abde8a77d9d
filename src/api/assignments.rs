//! Assignment endpoints

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::{AppError, AppResult},
    models::{assignment::CreateAssignment, Assignment, AssignmentWithDetails},
};

use super::{AuthenticatedUser, EntityId};

/// List assignments, newest first
#[utoipa::path(
    get,
    path = "/assignments",
    tag = "assignments",
    responses(
        (status = 200, description = "Assignments with client and vehicle names", body = Vec<AssignmentWithDetails>)
    )
)]
pub async fn list_assignments(
    State(state): State<crate::AppState>,
) -> AppResult<Json<Vec<AssignmentWithDetails>>> {
    let assignments = state.services.assignments.list().await?;
    Ok(Json(assignments))
}

/// Get assignment by ID
#[utoipa::path(
    get,
    path = "/assignments/{id}",
    tag = "assignments",
    params(("id" = Uuid, Path, description = "Assignment ID")),
    responses(
        (status = 200, description = "Assignment", body = Assignment),
        (status = 404, description = "Assignment not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_assignment(
    State(state): State<crate::AppState>,
    EntityId(id): EntityId,
) -> AppResult<Json<Assignment>> {
    let assignment = state
        .services
        .assignments
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Assignment {} not found", id)))?;
    Ok(Json(assignment))
}

/// Assign an available vehicle to an available client
#[utoipa::path(
    post,
    path = "/assignments",
    tag = "assignments",
    security(("bearer_auth" = [])),
    request_body = CreateAssignment,
    responses(
        (status = 201, description = "Assignment started", body = Assignment),
        (status = 400, description = "Invalid input", body = crate::error::ErrorResponse),
        (status = 404, description = "Vehicle or client not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Vehicle or client not available", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_assignment(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    payload: Result<Json<CreateAssignment>, JsonRejection>,
) -> AppResult<(StatusCode, Json<Assignment>)> {
    let Json(data) = payload?;
    let assignment = state.services.assignments.create(data).await?;
    Ok((StatusCode::CREATED, Json(assignment)))
}

/// Mark an active assignment completed
#[utoipa::path(
    post,
    path = "/assignments/{id}/complete",
    tag = "assignments",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Assignment ID")),
    responses(
        (status = 200, description = "Assignment completed", body = Assignment),
        (status = 404, description = "Assignment not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Assignment not active", body = crate::error::ErrorResponse)
    )
)]
pub async fn complete_assignment(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    EntityId(id): EntityId,
) -> AppResult<Json<Assignment>> {
    let assignment = state.services.assignments.complete(id).await?;
    Ok(Json(assignment))
}

/// Cancel an active assignment
#[utoipa::path(
    post,
    path = "/assignments/{id}/cancel",
    tag = "assignments",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Assignment ID")),
    responses(
        (status = 200, description = "Assignment cancelled", body = Assignment),
        (status = 404, description = "Assignment not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Assignment not active", body = crate::error::ErrorResponse)
    )
)]
pub async fn cancel_assignment(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    EntityId(id): EntityId,
) -> AppResult<Json<Assignment>> {
    let assignment = state.services.assignments.cancel(id).await?;
    Ok(Json(assignment))
}
