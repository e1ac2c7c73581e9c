use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::error::AppError;

use crate::models::{
    AppointmentListQuery, ChangeStatusRequest, ConsultationInfo, CreateAppointmentRequest,
    DateQuery, DoctorAgendaQuery, PaymentRequest, SaveConsultationRequest, SpecialtyQuery,
    UpdateAppointmentRequest,
};
use crate::services::{
    AppointmentService, ConsultationService, LookupService, PaymentService, StatsService,
};

#[axum::debug_handler]
pub async fn create_appointment(
    State(config): State<Arc<AppConfig>>,
    Json(request): Json<CreateAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let service = AppointmentService::new(&config);

    let created = service.create_appointment(request).await?;

    Ok(Json(created))
}

#[axum::debug_handler]
pub async fn list_appointments(
    State(config): State<Arc<AppConfig>>,
    Query(query): Query<AppointmentListQuery>,
) -> Result<Json<Value>, AppError> {
    let service = AppointmentService::new(&config);

    let citas = service.list_appointments(query).await?;

    Ok(Json(json!({ "citas": citas })))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(config): State<Arc<AppConfig>>,
    Path(cita_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let service = AppointmentService::new(&config);

    let detalle = service.get_appointment(cita_id).await?;

    Ok(Json(detalle))
}

#[axum::debug_handler]
pub async fn appointment_full_detail(
    State(config): State<Arc<AppConfig>>,
    Path(cita_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let service = AppointmentService::new(&config);

    let detalle = service.full_detail(cita_id).await?;

    Ok(Json(detalle))
}

#[axum::debug_handler]
pub async fn update_appointment(
    State(config): State<Arc<AppConfig>>,
    Path(cita_id): Path<i64>,
    Json(request): Json<UpdateAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let service = AppointmentService::new(&config);

    let cita = service.update_appointment(cita_id, request).await?;

    Ok(Json(json!({
        "mensaje": "Cita actualizada exitosamente.",
        "cita": cita
    })))
}

#[axum::debug_handler]
pub async fn update_consultation_info(
    State(config): State<Arc<AppConfig>>,
    Path(cita_id): Path<i64>,
    Json(info): Json<ConsultationInfo>,
) -> Result<Json<Value>, AppError> {
    let service = ConsultationService::new(&config);

    let informacion = service.update_info(cita_id, info).await?;

    Ok(Json(json!({
        "mensaje": "Información de la cita actualizada exitosamente.",
        "informacion": informacion
    })))
}

#[axum::debug_handler]
pub async fn change_status(
    State(config): State<Arc<AppConfig>>,
    Path(cita_id): Path<i64>,
    Json(cambio): Json<ChangeStatusRequest>,
) -> Result<Json<Value>, AppError> {
    let service = AppointmentService::new(&config);

    let estado = service.change_status(cita_id, &cambio.estado).await?;

    Ok(Json(json!({
        "mensaje": format!("Estado cambiado a '{}' exitosamente.", cambio.estado),
        "estado": estado
    })))
}

#[axum::debug_handler]
pub async fn status_history(
    State(config): State<Arc<AppConfig>>,
    Path(cita_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let service = AppointmentService::new(&config);

    let historial = service.status_history(cita_id).await?;

    Ok(Json(json!({ "historial": historial })))
}

#[axum::debug_handler]
pub async fn cancel_appointment(
    State(config): State<Arc<AppConfig>>,
    Path(cita_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let service = AppointmentService::new(&config);

    let estado = service.cancel_appointment(cita_id).await?;

    Ok(Json(json!({
        "mensaje": "Cita cancelada exitosamente.",
        "estado": estado
    })))
}

#[axum::debug_handler]
pub async fn save_consultation(
    State(config): State<Arc<AppConfig>>,
    Path(cita_id): Path<i64>,
    Json(consulta): Json<SaveConsultationRequest>,
) -> Result<Json<Value>, AppError> {
    let service = ConsultationService::new(&config);

    let informacion_cita_id = service.save_consultation(cita_id, consulta).await?;

    Ok(Json(json!({
        "mensaje": "Consulta guardada exitosamente.",
        "informacion_cita_id": informacion_cita_id
    })))
}

#[axum::debug_handler]
pub async fn process_payment(
    State(config): State<Arc<AppConfig>>,
    Json(pago): Json<PaymentRequest>,
) -> Result<Json<Value>, AppError> {
    let service = PaymentService::new(&config);

    let resultado = service.process_payment(pago).await?;

    Ok(Json(resultado))
}

#[axum::debug_handler]
pub async fn revenue(
    State(config): State<Arc<AppConfig>>,
    Query(query): Query<DateQuery>,
) -> Result<Json<Value>, AppError> {
    let service = PaymentService::new(&config);

    let ingresos = service.revenue(query.fecha.as_deref()).await?;

    Ok(Json(ingresos))
}

#[axum::debug_handler]
pub async fn specialty_price(
    State(config): State<Arc<AppConfig>>,
    Path(especialidad_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let service = PaymentService::new(&config);

    let costo = service.specialty_price(especialidad_id).await?;

    Ok(Json(json!({ "costo_servicio": costo })))
}

#[axum::debug_handler]
pub async fn appointment_stats(
    State(config): State<Arc<AppConfig>>,
    Query(query): Query<DateQuery>,
) -> Result<Json<Value>, AppError> {
    let service = StatsService::new(&config);

    let estadisticas = service.appointment_stats(query.fecha.as_deref()).await?;

    Ok(Json(estadisticas))
}

#[axum::debug_handler]
pub async fn doctor_agenda(
    State(config): State<Arc<AppConfig>>,
    Path(doctor_id): Path<i64>,
    Query(query): Query<DoctorAgendaQuery>,
) -> Result<Json<Value>, AppError> {
    let service = StatsService::new(&config);

    let citas = service.doctor_agenda(doctor_id, query).await?;

    Ok(Json(json!({ "citas": citas })))
}

#[axum::debug_handler]
pub async fn doctor_stats(
    State(config): State<Arc<AppConfig>>,
    Path(doctor_id): Path<i64>,
    Query(query): Query<DateQuery>,
) -> Result<Json<Value>, AppError> {
    let service = StatsService::new(&config);

    let stats = service.doctor_stats(doctor_id, query.fecha.as_deref()).await?;

    Ok(Json(stats))
}

#[axum::debug_handler]
pub async fn current_in_consultation(
    State(config): State<Arc<AppConfig>>,
    Path(doctor_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let service = StatsService::new(&config);

    let cita_id = service.current_in_consultation(doctor_id).await?;

    Ok(Json(json!({ "cita_en_consulta": cita_id })))
}

#[axum::debug_handler]
pub async fn list_specialties(
    State(config): State<Arc<AppConfig>>,
) -> Result<Json<Value>, AppError> {
    let service = LookupService::new(&config);

    let especialidades = service.list_specialties().await?;

    Ok(Json(json!({ "especialidades": especialidades })))
}

#[axum::debug_handler]
pub async fn list_doctors(
    State(config): State<Arc<AppConfig>>,
    Query(query): Query<SpecialtyQuery>,
) -> Result<Json<Value>, AppError> {
    let service = LookupService::new(&config);

    let doctores = service.list_doctors(query.especialidad_id).await?;

    Ok(Json(json!({ "doctores": doctores })))
}

#[axum::debug_handler]
pub async fn list_diagnoses(
    State(config): State<Arc<AppConfig>>,
) -> Result<Json<Value>, AppError> {
    let service = LookupService::new(&config);

    let diagnosticos = service.list_diagnoses().await?;

    Ok(Json(json!({ "diagnosticos": diagnosticos })))
}
