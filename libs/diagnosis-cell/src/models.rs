use serde::Deserialize;
use thiserror::Error;

use shared_models::error::AppError;

#[derive(Debug, Clone, Deserialize)]
pub struct DiagnosisRequest {
    pub nombre_enfermedad: String,
    pub descripcion_enfermedad: Option<String>,
}

fn default_page() -> u64 {
    1
}

fn default_limit() -> u64 {
    6
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiagnosisListQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
    pub search: Option<String>,
}

#[derive(Error, Debug)]
pub enum DiagnosisError {
    #[error("No existe el diagnóstico con ID {0}.")]
    NotFound(i64),

    #[error("La enfermedad '{0}' ya existe en el sistema.")]
    DuplicateName(String),

    #[error("No se puede eliminar '{0}' porque está siendo usado en citas médicas.")]
    InUse(String),

    #[error("{0}")]
    Validation(String),

    #[error("Error de base de datos: {0}")]
    Database(String),
}

impl From<anyhow::Error> for DiagnosisError {
    fn from(err: anyhow::Error) -> Self {
        DiagnosisError::Database(err.to_string())
    }
}

impl From<DiagnosisError> for AppError {
    fn from(err: DiagnosisError) -> Self {
        match err {
            DiagnosisError::NotFound(_) => AppError::NotFound(err.to_string()),
            DiagnosisError::DuplicateName(_) | DiagnosisError::InUse(_) => {
                AppError::Conflict(err.to_string())
            }
            DiagnosisError::Validation(msg) => AppError::BadRequest(msg),
            DiagnosisError::Database(msg) => AppError::Database(msg),
        }
    }
}
