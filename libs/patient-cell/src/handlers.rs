use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::error::AppError;

use crate::models::{CreatePatientRequest, CreatePrevencionRequest, UpdatePatientRequest};
use crate::services::PatientService;

#[axum::debug_handler]
pub async fn create_patient(
    State(config): State<Arc<AppConfig>>,
    Json(request): Json<CreatePatientRequest>,
) -> Result<Json<Value>, AppError> {
    let service = PatientService::new(&config);

    let patient = service.create_patient(request).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Paciente creado correctamente",
        "paciente": patient
    })))
}

#[axum::debug_handler]
pub async fn update_patient(
    State(config): State<Arc<AppConfig>>,
    Path(patient_id): Path<i64>,
    Json(request): Json<UpdatePatientRequest>,
) -> Result<Json<Value>, AppError> {
    let service = PatientService::new(&config);

    let patient = service.update_patient(patient_id, request).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Paciente actualizado correctamente",
        "paciente": patient
    })))
}

#[axum::debug_handler]
pub async fn delete_patient(
    State(config): State<Arc<AppConfig>>,
    Path(patient_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let service = PatientService::new(&config);

    service.delete_patient(patient_id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Paciente eliminado correctamente"
    })))
}

#[axum::debug_handler]
pub async fn list_patients(
    State(config): State<Arc<AppConfig>>,
) -> Result<Json<Value>, AppError> {
    let service = PatientService::new(&config);

    let patients = service.list_patients().await?;

    Ok(Json(json!({
        "pacientes": patients,
        "total": patients.len()
    })))
}

#[axum::debug_handler]
pub async fn list_prevenciones(
    State(config): State<Arc<AppConfig>>,
) -> Result<Json<Value>, AppError> {
    let service = PatientService::new(&config);

    let prevenciones = service.list_prevenciones().await?;

    Ok(Json(json!({ "prevenciones": prevenciones })))
}

#[axum::debug_handler]
pub async fn create_prevencion(
    State(config): State<Arc<AppConfig>>,
    Json(request): Json<CreatePrevencionRequest>,
) -> Result<Json<Value>, AppError> {
    let service = PatientService::new(&config);

    let prevencion = service.create_prevencion(request).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Previsión creada correctamente",
        "prevencion": prevencion
    })))
}
