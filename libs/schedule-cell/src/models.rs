use chrono::NaiveDateTime;
use serde::Deserialize;
use thiserror::Error;

use shared_models::error::AppError;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateBlockRequest {
    pub inicio_bloque: NaiveDateTime,
    pub finalizacion_bloque: NaiveDateTime,
    pub usuario_sistema_id: i64,
}

/// Weekly generation request. `dia_semana` uses 0 = Monday, matching the
/// stored data; times are clinic-local and converted to UTC on insert.
#[derive(Debug, Clone, Deserialize)]
pub struct WeeklyScheduleRequest {
    pub usuario_sistema_id: i64,
    pub dia_semana: u8,
    pub hora_inicio: String,
    pub hora_fin: String,
    pub duracion_bloque_minutos: i64,
    pub fecha_inicio: String,
    pub fecha_fin: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateBlockRequest {
    pub inicio_bloque: NaiveDateTime,
    pub finalizacion_bloque: NaiveDateTime,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScheduleListQuery {
    pub usuario_sistema_id: Option<i64>,
    pub fecha_inicio: Option<String>,
    pub fecha_fin: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DateRangeQuery {
    pub fecha_inicio: Option<String>,
    pub fecha_fin: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AvailabilityQuery {
    pub doctor_id: i64,
    pub fecha_inicio: String,
    pub fecha_fin: String,
    pub especialidad_id: Option<i64>,
}

/// Stored schedule block, timestamps in UTC.
#[derive(Debug, Clone, PartialEq, Deserialize, serde::Serialize)]
pub struct ScheduleBlock {
    pub id: i64,
    pub inicio_bloque: NaiveDateTime,
    pub finalizacion_bloque: NaiveDateTime,
    pub usuario_sistema_id: i64,
}

#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error("Usuario no encontrado")]
    UserNotFound,

    #[error("El usuario no es un doctor")]
    NotADoctor,

    #[error("Horario no encontrado")]
    BlockNotFound,

    #[error("Ya existe un horario en ese rango de tiempo")]
    Overlap,

    #[error("{0}")]
    Validation(String),

    #[error("Error de base de datos: {0}")]
    Database(String),
}

impl From<anyhow::Error> for ScheduleError {
    fn from(err: anyhow::Error) -> Self {
        ScheduleError::Database(err.to_string())
    }
}

impl From<ScheduleError> for AppError {
    fn from(err: ScheduleError) -> Self {
        match err {
            ScheduleError::UserNotFound | ScheduleError::BlockNotFound => {
                AppError::NotFound(err.to_string())
            }
            ScheduleError::Overlap => AppError::Conflict(err.to_string()),
            ScheduleError::NotADoctor => AppError::BadRequest(err.to_string()),
            ScheduleError::Validation(msg) => AppError::BadRequest(msg),
            ScheduleError::Database(msg) => AppError::Database(msg),
        }
    }
}
