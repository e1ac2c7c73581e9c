use serde::{Deserialize, Serialize};
use thiserror::Error;

use shared_models::error::AppError;

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Payload returned to the frontend after a successful login. The token is
/// opaque and client-side only; no route verifies it.
#[derive(Debug, Clone, Serialize)]
pub struct UserData {
    pub id: i64,
    pub nombre: String,
    pub apellido_paterno: String,
    pub apellido_materno: Option<String>,
    pub email: String,
    pub rut: Option<String>,
    pub rol_id: i64,
    pub rol_nombre: String,
    pub especialidad_id: Option<i64>,
    pub especialidad_nombre: Option<String>,
    pub auth_token: String,
    pub contrasena_temporal: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub message: String,
    pub data: UserData,
    pub redirect_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChangeTempPasswordRequest {
    pub usuario_id: i64,
    pub nueva_contrasena: String,
}

/// Row shape of the password table, keyed by the professional's user id.
#[derive(Debug, Clone, Deserialize)]
pub struct PasswordRow {
    #[serde(rename = "contraseña")]
    pub contrasena: Option<String>,
    #[serde(rename = "contraseña_temporal")]
    pub contrasena_temporal: Option<String>,
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Email o contraseña incorrectos")]
    InvalidCredentials,

    #[error("Usuario sin rol asignado")]
    MissingRole,

    #[error("Rol '{0}' no autorizado. Roles permitidos: medico, admin, secretaria")]
    UnauthorizedRole(String),

    #[error("Usuario no encontrado")]
    UserNotFound,

    #[error("{0}")]
    Validation(String),

    #[error("Error de base de datos: {0}")]
    Database(String),
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        AuthError::Database(err.to_string())
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => AppError::Auth(err.to_string()),
            AuthError::MissingRole | AuthError::UnauthorizedRole(_) => {
                AppError::Forbidden(err.to_string())
            }
            AuthError::UserNotFound => AppError::NotFound(err.to_string()),
            AuthError::Validation(msg) => AppError::BadRequest(msg),
            AuthError::Database(msg) => AppError::Database(msg),
        }
    }
}
