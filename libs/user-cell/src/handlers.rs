use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde_json::Value;

use shared_config::AppConfig;
use shared_models::error::AppError;

use crate::models::{
    ChangePasswordRequest, DoctorProfileUpdateRequest, ProfileUpdateRequest, RoleRequest,
    SpecialtyLinkRequest, SpecialtyRequest, SubSpecialtyRequest, UserRequest,
};
use crate::services::{ProfileService, RoleService, SpecialtyService, UserService};

// ---- roles y usuarios ----

#[axum::debug_handler]
pub async fn create_role(
    State(config): State<Arc<AppConfig>>,
    Json(request): Json<RoleRequest>,
) -> Result<Json<Value>, AppError> {
    let service = RoleService::new(&config);

    let resultado = service.create_role(request).await?;

    Ok(Json(resultado))
}

#[axum::debug_handler]
pub async fn update_role(
    State(config): State<Arc<AppConfig>>,
    Path(rol_id): Path<i64>,
    Json(request): Json<RoleRequest>,
) -> Result<Json<Value>, AppError> {
    let service = RoleService::new(&config);

    let resultado = service.update_role(rol_id, request).await?;

    Ok(Json(resultado))
}

#[axum::debug_handler]
pub async fn delete_role(
    State(config): State<Arc<AppConfig>>,
    Path(rol_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let service = RoleService::new(&config);

    let resultado = service.delete_role(rol_id).await?;

    Ok(Json(resultado))
}

#[axum::debug_handler]
pub async fn list_roles(
    State(config): State<Arc<AppConfig>>,
) -> Result<Json<Value>, AppError> {
    let service = RoleService::new(&config);

    let roles = service.list_roles().await?;

    Ok(Json(serde_json::json!({ "roles": roles })))
}

#[axum::debug_handler]
pub async fn create_user(
    State(config): State<Arc<AppConfig>>,
    Json(request): Json<UserRequest>,
) -> Result<Json<Value>, AppError> {
    let service = UserService::new(&config);

    let resultado = service.create_user(request).await?;

    Ok(Json(resultado))
}

#[axum::debug_handler]
pub async fn update_user(
    State(config): State<Arc<AppConfig>>,
    Path(usuario_id): Path<i64>,
    Json(request): Json<UserRequest>,
) -> Result<Json<Value>, AppError> {
    let service = UserService::new(&config);

    let resultado = service.update_user(usuario_id, request).await?;

    Ok(Json(resultado))
}

#[axum::debug_handler]
pub async fn delete_user(
    State(config): State<Arc<AppConfig>>,
    Path(usuario_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let service = UserService::new(&config);

    let resultado = service.delete_user(usuario_id).await?;

    Ok(Json(resultado))
}

#[axum::debug_handler]
pub async fn list_users(
    State(config): State<Arc<AppConfig>>,
) -> Result<Json<Value>, AppError> {
    let service = UserService::new(&config);

    let usuarios = service.list_users().await?;

    Ok(Json(serde_json::json!({ "usuarios": usuarios })))
}

// ---- especialidades ----

#[axum::debug_handler]
pub async fn create_specialty(
    State(config): State<Arc<AppConfig>>,
    Json(request): Json<SpecialtyRequest>,
) -> Result<Json<Value>, AppError> {
    let service = SpecialtyService::new(&config);

    let resultado = service.create_specialty(request).await?;

    Ok(Json(resultado))
}

#[axum::debug_handler]
pub async fn update_specialty(
    State(config): State<Arc<AppConfig>>,
    Path(especialidad_id): Path<i64>,
    Json(request): Json<SpecialtyRequest>,
) -> Result<Json<Value>, AppError> {
    let service = SpecialtyService::new(&config);

    let resultado = service.update_specialty(especialidad_id, request).await?;

    Ok(Json(resultado))
}

#[axum::debug_handler]
pub async fn delete_specialty(
    State(config): State<Arc<AppConfig>>,
    Path(especialidad_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let service = SpecialtyService::new(&config);

    let resultado = service.delete_specialty(especialidad_id).await?;

    Ok(Json(resultado))
}

#[axum::debug_handler]
pub async fn create_sub_specialty(
    State(config): State<Arc<AppConfig>>,
    Json(request): Json<SubSpecialtyRequest>,
) -> Result<Json<Value>, AppError> {
    let service = SpecialtyService::new(&config);

    let resultado = service.create_sub_specialty(request).await?;

    Ok(Json(resultado))
}

#[axum::debug_handler]
pub async fn update_sub_specialty(
    State(config): State<Arc<AppConfig>>,
    Path(sub_id): Path<i64>,
    Json(request): Json<SubSpecialtyRequest>,
) -> Result<Json<Value>, AppError> {
    let service = SpecialtyService::new(&config);

    let resultado = service.update_sub_specialty(sub_id, request).await?;

    Ok(Json(resultado))
}

#[axum::debug_handler]
pub async fn delete_sub_specialty(
    State(config): State<Arc<AppConfig>>,
    Path(sub_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let service = SpecialtyService::new(&config);

    let resultado = service.delete_sub_specialty(sub_id).await?;

    Ok(Json(resultado))
}

#[axum::debug_handler]
pub async fn link_sub_specialty(
    State(config): State<Arc<AppConfig>>,
    Json(request): Json<SpecialtyLinkRequest>,
) -> Result<Json<Value>, AppError> {
    let service = SpecialtyService::new(&config);

    let resultado = service.link_sub_specialty(request).await?;

    Ok(Json(resultado))
}

#[axum::debug_handler]
pub async fn unlink_sub_specialty(
    State(config): State<Arc<AppConfig>>,
    Json(request): Json<SpecialtyLinkRequest>,
) -> Result<Json<Value>, AppError> {
    let service = SpecialtyService::new(&config);

    let resultado = service.unlink_sub_specialty(request).await?;

    Ok(Json(resultado))
}

#[axum::debug_handler]
pub async fn list_specialties(
    State(config): State<Arc<AppConfig>>,
) -> Result<Json<Value>, AppError> {
    let service = SpecialtyService::new(&config);

    let especialidades = service.list_specialties().await?;

    Ok(Json(serde_json::json!({ "especialidades": especialidades })))
}

#[axum::debug_handler]
pub async fn list_sub_specialties(
    State(config): State<Arc<AppConfig>>,
) -> Result<Json<Value>, AppError> {
    let service = SpecialtyService::new(&config);

    let subespecialidades = service.list_sub_specialties().await?;

    Ok(Json(serde_json::json!({ "subespecialidades": subespecialidades })))
}

#[axum::debug_handler]
pub async fn sub_specialties_of(
    State(config): State<Arc<AppConfig>>,
    Path(especialidad_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let service = SpecialtyService::new(&config);

    let subespecialidades = service.sub_specialties_of(especialidad_id).await?;

    Ok(Json(serde_json::json!({ "subespecialidades": subespecialidades })))
}

#[axum::debug_handler]
pub async fn list_doctors(
    State(config): State<Arc<AppConfig>>,
) -> Result<Json<Value>, AppError> {
    let service = SpecialtyService::new(&config);

    let doctores = service.list_doctors().await?;

    Ok(Json(serde_json::json!({ "doctores": doctores })))
}

// ---- perfil ----

#[axum::debug_handler]
pub async fn get_profile(
    State(config): State<Arc<AppConfig>>,
    Path(usuario_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let service = ProfileService::new(&config);

    let perfil = service.get_profile(usuario_id).await?;

    Ok(Json(perfil))
}

#[axum::debug_handler]
pub async fn update_profile(
    State(config): State<Arc<AppConfig>>,
    Path(usuario_id): Path<i64>,
    Json(request): Json<ProfileUpdateRequest>,
) -> Result<Json<Value>, AppError> {
    let service = ProfileService::new(&config);

    let resultado = service.update_profile(usuario_id, request).await?;

    Ok(Json(resultado))
}

#[axum::debug_handler]
pub async fn doctor_profile(
    State(config): State<Arc<AppConfig>>,
    Path(doctor_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let service = ProfileService::new(&config);

    let perfil = service.doctor_profile(doctor_id).await?;

    Ok(Json(perfil))
}

#[axum::debug_handler]
pub async fn update_doctor_profile(
    State(config): State<Arc<AppConfig>>,
    Path(doctor_id): Path<i64>,
    Json(request): Json<DoctorProfileUpdateRequest>,
) -> Result<Json<Value>, AppError> {
    let service = ProfileService::new(&config);

    let resultado = service.update_doctor_profile(doctor_id, request).await?;

    Ok(Json(resultado))
}

#[axum::debug_handler]
pub async fn doctor_stats(
    State(config): State<Arc<AppConfig>>,
    Path(doctor_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let service = ProfileService::new(&config);

    let estadisticas = service.doctor_stats(doctor_id).await?;

    Ok(Json(estadisticas))
}

#[axum::debug_handler]
pub async fn change_password(
    State(config): State<Arc<AppConfig>>,
    Path(doctor_id): Path<i64>,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<Json<Value>, AppError> {
    let service = ProfileService::new(&config);

    let resultado = service.change_password(doctor_id, request).await?;

    Ok(Json(resultado))
}
