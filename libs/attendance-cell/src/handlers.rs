use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde_json::Value;

use shared_config::AppConfig;
use shared_models::error::AppError;

use crate::models::{
    DateQuery, DoctorMarkQuery, DoctorShiftQuery, HistoryQuery, JustificationRequest,
    PeriodQuery, RegisterEntryRequest,
};
use crate::services::{AttendanceService, ReportService};

#[axum::debug_handler]
pub async fn daily_summary(
    State(config): State<Arc<AppConfig>>,
    Query(query): Query<DateQuery>,
) -> Result<Json<Value>, AppError> {
    let service = AttendanceService::new(&config);

    let resumen = service.daily_summary(query.fecha.as_deref()).await?;

    Ok(Json(resumen))
}

#[axum::debug_handler]
pub async fn register_entry(
    State(config): State<Arc<AppConfig>>,
    Json(request): Json<RegisterEntryRequest>,
) -> Result<Json<Value>, AppError> {
    let service = AttendanceService::new(&config);

    let asistencia = service.register_entry(request.usuario_sistema_id).await?;

    Ok(Json(serde_json::json!({
        "mensaje": "Entrada registrada",
        "asistencia": asistencia
    })))
}

#[axum::debug_handler]
pub async fn register_exit(
    State(config): State<Arc<AppConfig>>,
    Path(asistencia_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let service = AttendanceService::new(&config);

    let asistencia = service.register_exit(asistencia_id).await?;

    Ok(Json(serde_json::json!({
        "mensaje": "Salida registrada",
        "asistencia": asistencia
    })))
}

#[axum::debug_handler]
pub async fn my_shift_today(
    State(config): State<Arc<AppConfig>>,
    Query(query): Query<DoctorShiftQuery>,
) -> Result<Json<Value>, AppError> {
    let service = AttendanceService::new(&config);

    let turno = service
        .my_shift_today(query.usuario_id, query.fecha.as_deref())
        .await?;

    Ok(Json(turno))
}

#[axum::debug_handler]
pub async fn mark_entry(
    State(config): State<Arc<AppConfig>>,
    Query(query): Query<DoctorMarkQuery>,
) -> Result<Json<Value>, AppError> {
    let service = AttendanceService::new(&config);

    let resultado = service.mark_entry(query.usuario_id).await?;

    Ok(Json(resultado))
}

#[axum::debug_handler]
pub async fn mark_exit(
    State(config): State<Arc<AppConfig>>,
    Query(query): Query<DoctorMarkQuery>,
) -> Result<Json<Value>, AppError> {
    let service = AttendanceService::new(&config);

    let resultado = service.mark_exit(query.usuario_id).await?;

    Ok(Json(resultado))
}

#[axum::debug_handler]
pub async fn doctor_detail(
    State(config): State<Arc<AppConfig>>,
    Path(doctor_id): Path<i64>,
    Query(query): Query<DateQuery>,
) -> Result<Json<Value>, AppError> {
    let service = ReportService::new(&config);

    let detalle = service
        .doctor_detail(doctor_id, query.fecha.as_deref())
        .await?;

    Ok(Json(detalle))
}

#[axum::debug_handler]
pub async fn period_stats(
    State(config): State<Arc<AppConfig>>,
    Path(doctor_id): Path<i64>,
    Query(query): Query<PeriodQuery>,
) -> Result<Json<Value>, AppError> {
    let service = ReportService::new(&config);

    let estadisticas = service
        .period_stats(doctor_id, &query.periodo, query.fecha_referencia.as_deref())
        .await?;

    Ok(Json(estadisticas))
}

#[axum::debug_handler]
pub async fn daily_history(
    State(config): State<Arc<AppConfig>>,
    Path(doctor_id): Path<i64>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Value>, AppError> {
    let service = ReportService::new(&config);

    let historial = service.daily_history(doctor_id, query).await?;

    Ok(Json(historial))
}

#[axum::debug_handler]
pub async fn justifications(
    State(config): State<Arc<AppConfig>>,
    Path(doctor_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let service = ReportService::new(&config);

    let justificaciones = service.justifications(doctor_id).await?;

    Ok(Json(justificaciones))
}

#[axum::debug_handler]
pub async fn add_justification(
    State(config): State<Arc<AppConfig>>,
    Path(doctor_id): Path<i64>,
    Json(request): Json<JustificationRequest>,
) -> Result<Json<Value>, AppError> {
    let service = ReportService::new(&config);

    let estado = service.add_justification(doctor_id, request).await?;

    Ok(Json(serde_json::json!({
        "mensaje": "Justificación agregada",
        "data": estado
    })))
}
