use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::error::AppError;

use crate::models::{
    AvailabilityQuery, CreateBlockRequest, DateRangeQuery, ScheduleListQuery, UpdateBlockRequest,
    WeeklyScheduleRequest,
};
use crate::services::{AvailabilityService, ScheduleService};

#[axum::debug_handler]
pub async fn create_block(
    State(config): State<Arc<AppConfig>>,
    Json(request): Json<CreateBlockRequest>,
) -> Result<Json<Value>, AppError> {
    let service = ScheduleService::new(&config);

    let horario = service.create_block(request).await?;

    Ok(Json(json!({
        "mensaje": "Horario creado exitosamente.",
        "horario": horario
    })))
}

#[axum::debug_handler]
pub async fn create_weekly_schedule(
    State(config): State<Arc<AppConfig>>,
    Json(request): Json<WeeklyScheduleRequest>,
) -> Result<Json<Value>, AppError> {
    let service = ScheduleService::new(&config);

    let resultado = service.create_weekly(request).await?;

    Ok(Json(resultado))
}

#[axum::debug_handler]
pub async fn list_blocks(
    State(config): State<Arc<AppConfig>>,
    Query(query): Query<ScheduleListQuery>,
) -> Result<Json<Value>, AppError> {
    let service = ScheduleService::new(&config);

    let horarios = service.list_blocks(query).await?;

    Ok(Json(json!({ "horarios": horarios })))
}

#[axum::debug_handler]
pub async fn get_block(
    State(config): State<Arc<AppConfig>>,
    Path(horario_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let service = ScheduleService::new(&config);

    let horario = service.get_block(horario_id).await?;

    Ok(Json(horario))
}

#[axum::debug_handler]
pub async fn update_block(
    State(config): State<Arc<AppConfig>>,
    Path(horario_id): Path<i64>,
    Json(request): Json<UpdateBlockRequest>,
) -> Result<Json<Value>, AppError> {
    let service = ScheduleService::new(&config);

    let horario = service.update_block(horario_id, request).await?;

    Ok(Json(json!({
        "mensaje": "Horario actualizado exitosamente.",
        "horario": horario
    })))
}

#[axum::debug_handler]
pub async fn delete_block(
    State(config): State<Arc<AppConfig>>,
    Path(horario_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let service = ScheduleService::new(&config);

    service.delete_block(horario_id).await?;

    Ok(Json(json!({ "mensaje": "Horario eliminado exitosamente." })))
}

#[axum::debug_handler]
pub async fn delete_doctor_blocks(
    State(config): State<Arc<AppConfig>>,
    Path(usuario_id): Path<i64>,
    Query(query): Query<DateRangeQuery>,
) -> Result<Json<Value>, AppError> {
    let service = ScheduleService::new(&config);

    let eliminados = service
        .delete_doctor_blocks(
            usuario_id,
            query.fecha_inicio.as_deref(),
            query.fecha_fin.as_deref(),
        )
        .await?;

    Ok(Json(json!({
        "mensaje": "Horarios del doctor eliminados exitosamente.",
        "bloques_eliminados": eliminados
    })))
}

#[axum::debug_handler]
pub async fn doctors_with_schedules(
    State(config): State<Arc<AppConfig>>,
) -> Result<Json<Value>, AppError> {
    let service = ScheduleService::new(&config);

    let doctores = service.doctors_with_schedules().await?;

    Ok(Json(json!({ "doctores": doctores })))
}

#[axum::debug_handler]
pub async fn available_blocks(
    State(config): State<Arc<AppConfig>>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<Value>, AppError> {
    let service = AvailabilityService::new(&config);

    let disponibles = service.available_blocks(query).await?;

    Ok(Json(json!({ "horarios_disponibles": disponibles })))
}
