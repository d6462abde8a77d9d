//! Dashboard statistics

use crate::{
    error::AppResult,
    projection::{self, FleetStats},
    repository::Repository,
};

#[derive(Clone)]
pub struct StatsService {
    repository: Repository,
}

impl StatsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn overview(&self) -> AppResult<FleetStats> {
        let snapshot = self.repository.snapshot().await?;
        Ok(projection::fleet_stats(&snapshot))
    }
}
