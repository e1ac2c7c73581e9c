use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde_json::Value;

use shared_config::AppConfig;
use shared_models::error::AppError;

use crate::models::{DiagnosisListQuery, DiagnosisRequest};
use crate::services::DiagnosisService;

#[axum::debug_handler]
pub async fn create_diagnosis(
    State(config): State<Arc<AppConfig>>,
    Json(request): Json<DiagnosisRequest>,
) -> Result<Json<Value>, AppError> {
    let service = DiagnosisService::new(&config);

    let resultado = service.create_diagnosis(request).await?;

    Ok(Json(resultado))
}

#[axum::debug_handler]
pub async fn update_diagnosis(
    State(config): State<Arc<AppConfig>>,
    Path(diagnostico_id): Path<i64>,
    Json(request): Json<DiagnosisRequest>,
) -> Result<Json<Value>, AppError> {
    let service = DiagnosisService::new(&config);

    let resultado = service.update_diagnosis(diagnostico_id, request).await?;

    Ok(Json(resultado))
}

#[axum::debug_handler]
pub async fn delete_diagnosis(
    State(config): State<Arc<AppConfig>>,
    Path(diagnostico_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let service = DiagnosisService::new(&config);

    let resultado = service.delete_diagnosis(diagnostico_id).await?;

    Ok(Json(resultado))
}

#[axum::debug_handler]
pub async fn list_diagnoses(
    State(config): State<Arc<AppConfig>>,
    Query(query): Query<DiagnosisListQuery>,
) -> Result<Json<Value>, AppError> {
    let service = DiagnosisService::new(&config);

    let resultado = service.list_diagnoses(query).await?;

    Ok(Json(resultado))
}

#[axum::debug_handler]
pub async fn diagnosis_stats(
    State(config): State<Arc<AppConfig>>,
) -> Result<Json<Value>, AppError> {
    let service = DiagnosisService::new(&config);

    let resultado = service.diagnosis_stats().await?;

    Ok(Json(resultado))
}
