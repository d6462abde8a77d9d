//! Business logic services

pub mod assignments;
pub mod auth;
pub mod clients;
pub mod stats;
pub mod vehicles;

use crate::{config::AuthConfig, error::AppResult, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub auth: auth::AuthService,
    pub vehicles: vehicles::VehiclesService,
    pub clients: clients::ClientsService,
    pub assignments: assignments::AssignmentsService,
    pub stats: stats::StatsService,
    repository: Repository,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, auth_config: AuthConfig) -> Self {
        Self {
            auth: auth::AuthService::new(repository.clone(), auth_config),
            vehicles: vehicles::VehiclesService::new(repository.clone()),
            clients: clients::ClientsService::new(repository.clone()),
            assignments: assignments::AssignmentsService::new(repository.clone()),
            stats: stats::StatsService::new(repository.clone()),
            repository,
        }
    }

    /// Whether the storage backend answers
    pub async fn ready(&self) -> AppResult<&'static str> {
        self.repository.ping().await?;
        Ok(self.repository.backend())
    }
}
