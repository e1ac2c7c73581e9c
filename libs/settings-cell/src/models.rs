use serde::Deserialize;
use thiserror::Error;

use shared_models::error::AppError;

fn default_tipo() -> String {
    "texto".to_string()
}

fn default_categoria() -> String {
    "general".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateSettingRequest {
    pub clave: String,
    pub valor: Option<String>,
    #[serde(default = "default_tipo")]
    pub tipo: String,
    #[serde(default = "default_categoria")]
    pub categoria: String,
    pub descripcion: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateSettingRequest {
    pub valor: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BulkSettingItem {
    pub clave: Option<String>,
    pub valor: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SettingListQuery {
    pub categoria: Option<String>,
}

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("No existe la configuración con clave '{0}'.")]
    NotFound(String),

    #[error("Ya existe una configuración con la clave '{0}'.")]
    DuplicateKey(String),

    #[error("Error de base de datos: {0}")]
    Database(String),
}

impl From<anyhow::Error> for SettingsError {
    fn from(err: anyhow::Error) -> Self {
        SettingsError::Database(err.to_string())
    }
}

impl From<SettingsError> for AppError {
    fn from(err: SettingsError) -> Self {
        match err {
            SettingsError::NotFound(_) => AppError::NotFound(err.to_string()),
            SettingsError::DuplicateKey(_) => AppError::Conflict(err.to_string()),
            SettingsError::Database(msg) => AppError::Database(msg),
        }
    }
}
