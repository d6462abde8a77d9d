//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{assignments, auth, clients, health, stats, vehicles};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Fleet API",
        version = "1.0.0",
        description = "Vehicle fleet and assignment management REST API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api", description = "API")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Auth
        auth::login,
        auth::me,
        auth::change_password,
        // Vehicles
        vehicles::list_vehicles,
        vehicles::get_vehicle,
        vehicles::create_vehicle,
        vehicles::update_vehicle,
        vehicles::delete_vehicle,
        // Clients
        clients::list_clients,
        clients::get_client,
        clients::create_client,
        clients::update_client,
        clients::delete_client,
        clients::current_assignment,
        clients::assignment_history,
        // Assignments
        assignments::list_assignments,
        assignments::get_assignment,
        assignments::create_assignment,
        assignments::complete_assignment,
        assignments::cancel_assignment,
        // Stats
        stats::get_stats,
    ),
    components(
        schemas(
            // Auth
            auth::LoginRequest,
            auth::LoginResponse,
            auth::UserInfo,
            auth::ChangePasswordRequest,
            auth::MessageResponse,
            // Vehicles
            crate::models::vehicle::Vehicle,
            crate::models::vehicle::VehicleWithAssignment,
            crate::models::vehicle::CreateVehicle,
            crate::models::vehicle::UpdateVehicle,
            crate::models::enums::VehicleType,
            crate::models::enums::VehicleStatus,
            // Clients
            crate::models::client::Client,
            crate::models::client::ClientWithAssignment,
            crate::models::client::CreateClient,
            crate::models::client::UpdateClient,
            crate::models::enums::ClientType,
            // Assignments
            crate::models::assignment::Assignment,
            crate::models::assignment::AssignmentWithDetails,
            crate::models::assignment::CreateAssignment,
            crate::models::enums::AssignmentStatus,
            // Stats
            crate::projection::FleetStats,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Authentication endpoints"),
        (name = "vehicles", description = "Vehicle management"),
        (name = "clients", description = "Client management"),
        (name = "assignments", description = "Vehicle assignment lifecycle"),
        (name = "stats", description = "Statistics")
    )
)]
pub struct ApiDoc;

/// Registers the `bearer_auth` scheme referenced by write endpoints
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
