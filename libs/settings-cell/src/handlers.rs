use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde_json::Value;

use shared_config::AppConfig;
use shared_models::error::AppError;

use crate::models::{
    BulkSettingItem, CreateSettingRequest, SettingListQuery, UpdateSettingRequest,
};
use crate::services::SettingsService;

#[axum::debug_handler]
pub async fn list_settings(
    State(config): State<Arc<AppConfig>>,
    Query(query): Query<SettingListQuery>,
) -> Result<Json<Value>, AppError> {
    let service = SettingsService::new(&config);

    let resultado = service.list_settings(query).await?;

    Ok(Json(resultado))
}

#[axum::debug_handler]
pub async fn get_setting(
    State(config): State<Arc<AppConfig>>,
    Path(clave): Path<String>,
) -> Result<Json<Value>, AppError> {
    let service = SettingsService::new(&config);

    let configuracion = service.get_setting(&clave).await?;

    Ok(Json(configuracion))
}

#[axum::debug_handler]
pub async fn update_setting(
    State(config): State<Arc<AppConfig>>,
    Path(clave): Path<String>,
    Json(request): Json<UpdateSettingRequest>,
) -> Result<Json<Value>, AppError> {
    let service = SettingsService::new(&config);

    let resultado = service.update_setting(&clave, request).await?;

    Ok(Json(resultado))
}

#[axum::debug_handler]
pub async fn create_setting(
    State(config): State<Arc<AppConfig>>,
    Json(request): Json<CreateSettingRequest>,
) -> Result<Json<Value>, AppError> {
    let service = SettingsService::new(&config);

    let resultado = service.create_setting(request).await?;

    Ok(Json(resultado))
}

#[axum::debug_handler]
pub async fn update_many(
    State(config): State<Arc<AppConfig>>,
    Json(items): Json<Vec<BulkSettingItem>>,
) -> Result<Json<Value>, AppError> {
    let service = SettingsService::new(&config);

    let resultado = service.update_many(items).await?;

    Ok(Json(resultado))
}
