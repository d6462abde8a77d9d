//! Client endpoints

use axum::{
    extract::{rejection::{JsonRejection, QueryRejection}, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::{AppError, AppResult},
    models::{
        client::{Client, ClientQuery, ClientWithAssignment, CreateClient, UpdateClient},
        AssignmentWithDetails,
    },
};

use super::{query_params, AuthenticatedUser, DeleteParams, EntityId};

/// List clients with the vehicle they currently hold
#[utoipa::path(
    get,
    path = "/clients",
    tag = "clients",
    params(ClientQuery),
    responses(
        (status = 200, description = "Clients ordered by name", body = Vec<ClientWithAssignment>),
        (status = 400, description = "Invalid query", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_clients(
    State(state): State<crate::AppState>,
    query: Result<Query<ClientQuery>, QueryRejection>,
) -> AppResult<Json<Vec<ClientWithAssignment>>> {
    let query = query_params(query)?;
    let clients = state.services.clients.list(&query).await?;
    Ok(Json(clients))
}

/// Get client by ID
#[utoipa::path(
    get,
    path = "/clients/{id}",
    tag = "clients",
    params(("id" = Uuid, Path, description = "Client ID")),
    responses(
        (status = 200, description = "Client details", body = Client),
        (status = 404, description = "Client not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_client(
    State(state): State<crate::AppState>,
    EntityId(id): EntityId,
) -> AppResult<Json<Client>> {
    let client = state
        .services
        .clients
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Client {} not found", id)))?;
    Ok(Json(client))
}

/// Register a client
#[utoipa::path(
    post,
    path = "/clients",
    tag = "clients",
    security(("bearer_auth" = [])),
    request_body = CreateClient,
    responses(
        (status = 201, description = "Client created", body = Client),
        (status = 400, description = "Invalid input", body = crate::error::ErrorResponse),
        (status = 409, description = "CIN already registered", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_client(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    payload: Result<Json<CreateClient>, JsonRejection>,
) -> AppResult<(StatusCode, Json<Client>)> {
    let Json(data) = payload?;
    let client = state.services.clients.create(data).await?;
    Ok((StatusCode::CREATED, Json(client)))
}

/// Update a client
#[utoipa::path(
    patch,
    path = "/clients/{id}",
    tag = "clients",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Client ID")),
    request_body = UpdateClient,
    responses(
        (status = 200, description = "Client updated", body = Client),
        (status = 400, description = "Invalid input", body = crate::error::ErrorResponse),
        (status = 404, description = "Client not found", body = crate::error::ErrorResponse),
        (status = 409, description = "CIN already registered", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_client(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    EntityId(id): EntityId,
    payload: Result<Json<UpdateClient>, JsonRejection>,
) -> AppResult<Json<Client>> {
    let Json(data) = payload?;
    let client = state.services.clients.update(id, data).await?;
    Ok(Json(client))
}

/// Delete a client
#[utoipa::path(
    delete,
    path = "/clients/{id}",
    tag = "clients",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Client ID"), DeleteParams),
    responses(
        (status = 204, description = "Client deleted"),
        (status = 404, description = "Client not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Client still referenced by assignments", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_client(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    EntityId(id): EntityId,
    query: Result<Query<DeleteParams>, QueryRejection>,
) -> AppResult<StatusCode> {
    let params = query_params(query)?;
    state.services.clients.delete(id, params.force).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// The client's active assignment, or null
#[utoipa::path(
    get,
    path = "/clients/{id}/current-assignment",
    tag = "clients",
    params(("id" = Uuid, Path, description = "Client ID")),
    responses(
        (status = 200, description = "Active assignment or null", body = AssignmentWithDetails),
        (status = 404, description = "Client not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn current_assignment(
    State(state): State<crate::AppState>,
    EntityId(id): EntityId,
) -> AppResult<Json<Option<AssignmentWithDetails>>> {
    let assignment = state.services.clients.current_assignment(id).await?;
    Ok(Json(assignment))
}

/// The client's completed assignments, newest first
#[utoipa::path(
    get,
    path = "/clients/{id}/assignment-history",
    tag = "clients",
    params(("id" = Uuid, Path, description = "Client ID")),
    responses(
        (status = 200, description = "Completed assignments", body = Vec<AssignmentWithDetails>),
        (status = 404, description = "Client not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn assignment_history(
    State(state): State<crate::AppState>,
    EntityId(id): EntityId,
) -> AppResult<Json<Vec<AssignmentWithDetails>>> {
    let history = state.services.clients.assignment_history(id).await?;
    Ok(Json(history))
}
