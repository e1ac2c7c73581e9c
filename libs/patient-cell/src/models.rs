use serde::Deserialize;
use thiserror::Error;

use shared_models::error::AppError;

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePatientRequest {
    pub nombre: String,
    pub apellido_paterno: String,
    pub apellido_materno: Option<String>,
    pub rut: String,
    pub email: Option<String>,
    pub celular: Option<String>,
    pub direccion: Option<String>,
    pub fecha_nacimiento: Option<String>,
    pub prevencion_id: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePatientRequest {
    pub nombre: Option<String>,
    pub apellido_paterno: Option<String>,
    pub apellido_materno: Option<String>,
    pub rut: Option<String>,
    pub email: Option<String>,
    pub celular: Option<String>,
    pub direccion: Option<String>,
    pub fecha_nacimiento: Option<String>,
    pub prevencion_id: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePrevencionRequest {
    pub nombre: String,
    pub descuento: Option<f64>,
}

#[derive(Error, Debug)]
pub enum PatientError {
    #[error("Paciente no encontrado")]
    NotFound,

    #[error("Ya existe un paciente con el RUT {0}")]
    DuplicateRut(String),

    #[error("Ya existe una previsión con el nombre '{0}'")]
    DuplicatePrevencion(String),

    #[error("{0}")]
    Validation(String),

    #[error("Error de base de datos: {0}")]
    Database(String),
}

impl From<anyhow::Error> for PatientError {
    fn from(err: anyhow::Error) -> Self {
        PatientError::Database(err.to_string())
    }
}

impl From<PatientError> for AppError {
    fn from(err: PatientError) -> Self {
        match err {
            PatientError::NotFound => AppError::NotFound(err.to_string()),
            PatientError::DuplicateRut(_) | PatientError::DuplicatePrevencion(_) => {
                AppError::Conflict(err.to_string())
            }
            PatientError::Validation(msg) => AppError::BadRequest(msg),
            PatientError::Database(msg) => AppError::Database(msg),
        }
    }
}
