//! Statistics endpoint

use axum::{extract::State, Json};

use crate::{error::AppResult, projection::FleetStats};

/// Dashboard counters
#[utoipa::path(
    get,
    path = "/stats",
    tag = "stats",
    responses(
        (status = 200, description = "Fleet counters", body = FleetStats)
    )
)]
pub async fn get_stats(State(state): State<crate::AppState>) -> AppResult<Json<FleetStats>> {
    let stats = state.services.stats.overview().await?;
    Ok(Json(stats))
}
