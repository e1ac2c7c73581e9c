use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use serde_json::Value;

use shared_config::AppConfig;
use shared_models::error::AppError;

use crate::models::RecentAppointmentsQuery;
use crate::services::DashboardService;

#[axum::debug_handler]
pub async fn stats(State(config): State<Arc<AppConfig>>) -> Result<Json<Value>, AppError> {
    let service = DashboardService::new(&config);

    let estadisticas = service.stats().await?;

    Ok(Json(estadisticas))
}

#[axum::debug_handler]
pub async fn recent_appointments(
    State(config): State<Arc<AppConfig>>,
    Query(query): Query<RecentAppointmentsQuery>,
) -> Result<Json<Value>, AppError> {
    let service = DashboardService::new(&config);

    let citas = service.recent_appointments(query).await?;

    Ok(Json(citas))
}
