//! API handlers for the fleet REST endpoints

pub mod assignments;
pub mod auth;
pub mod clients;
pub mod health;
pub mod openapi;
pub mod stats;
pub mod vehicles;

use axum::{
    async_trait,
    extract::{rejection::QueryRejection, FromRequestParts, Path, Query},
    http::{header::AUTHORIZATION, request::Parts},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::IntoParams;
use uuid::Uuid;

use crate::{error::AppError, models::user::UserClaims, AppState};

/// Extractor for authenticated user from JWT token
pub struct AuthenticatedUser(pub UserClaims);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Authentication("Missing authorization header".to_string()))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::Authentication("Invalid authorization header format".to_string()))?;

        let claims = UserClaims::from_token(token, &state.config.auth.jwt_secret)
            .map_err(|e| AppError::Authentication(e.to_string()))?;

        Ok(AuthenticatedUser(claims))
    }
}

/// `:id` path segment parsed as a UUID; anything else is a 400
pub struct EntityId(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for EntityId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id) = Path::<Uuid>::from_request_parts(parts, state).await?;
        Ok(EntityId(id))
    }
}

/// Query parameters for DELETE on vehicles and clients
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DeleteParams {
    /// Also remove past assignments that reference the record
    #[serde(default)]
    pub force: bool,
}

pub(crate) fn query_params<T>(query: Result<Query<T>, QueryRejection>) -> Result<T, AppError> {
    query
        .map(|Query(params)| params)
        .map_err(|e| AppError::Validation(e.body_text()))
}

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Authentication
        .route("/auth/login", post(auth::login))
        .route("/auth/me", get(auth::me))
        .route("/change-password", post(auth::change_password))
        // Vehicles
        .route("/vehicles", get(vehicles::list_vehicles).post(vehicles::create_vehicle))
        .route(
            "/vehicles/:id",
            get(vehicles::get_vehicle)
                .patch(vehicles::update_vehicle)
                .delete(vehicles::delete_vehicle),
        )
        // Clients
        .route("/clients", get(clients::list_clients).post(clients::create_client))
        .route(
            "/clients/:id",
            get(clients::get_client)
                .patch(clients::update_client)
                .delete(clients::delete_client),
        )
        .route("/clients/:id/current-assignment", get(clients::current_assignment))
        .route("/clients/:id/assignment-history", get(clients::assignment_history))
        // Assignments
        .route(
            "/assignments",
            get(assignments::list_assignments).post(assignments::create_assignment),
        )
        .route("/assignments/:id", get(assignments::get_assignment))
        .route("/assignments/:id/complete", post(assignments::complete_assignment))
        .route("/assignments/:id/cancel", post(assignments::cancel_assignment))
        // Statistics
        .route("/stats", get(stats::get_stats))
        .with_state(state);

    Router::new()
        .nest("/api", api)
        .merge(openapi::create_openapi_router())
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
}
