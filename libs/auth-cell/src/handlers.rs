use std::sync::Arc;

use axum::{extract::State, Json};
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::error::AppError;

use crate::models::{ChangeTempPasswordRequest, LoginRequest};
use crate::services::AuthService;

#[axum::debug_handler]
pub async fn login(
    State(config): State<Arc<AppConfig>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<Value>, AppError> {
    let service = AuthService::new(&config);

    let response = service.login(request).await?;

    Ok(Json(json!(response)))
}

#[axum::debug_handler]
pub async fn change_temp_password(
    State(config): State<Arc<AppConfig>>,
    Json(request): Json<ChangeTempPasswordRequest>,
) -> Result<Json<Value>, AppError> {
    let service = AuthService::new(&config);

    service
        .change_temp_password(request.usuario_id, &request.nueva_contrasena)
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Contraseña actualizada correctamente"
    })))
}

#[axum::debug_handler]
pub async fn logout() -> Json<Value> {
    Json(json!({
        "success": true,
        "message": "Sesión cerrada correctamente"
    }))
}
