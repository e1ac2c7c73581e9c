use serde::Deserialize;
use std::fmt;
use thiserror::Error;

use shared_models::error::AppError;

/// Derived attendance state for a scheduled shift. Marks only record entry
/// and exit times; everything else is computed against the schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttendanceStatus {
    /// Shift scheduled, start time not reached yet.
    Programado,
    /// Entry marked on time, no exit yet.
    EnTurno,
    /// Entry and exit marked, on time.
    Asistio,
    /// Entry marked late, or start time passed without a mark.
    Atraso,
    /// Shift ended without any entry mark.
    Ausente,
    /// Absence or delay covered by a justification.
    Justificado,
}

impl AttendanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Programado => "PROGRAMADO",
            AttendanceStatus::EnTurno => "EN_TURNO",
            AttendanceStatus::Asistio => "ASISTIO",
            AttendanceStatus::Atraso => "ATRASO",
            AttendanceStatus::Ausente => "AUSENTE",
            AttendanceStatus::Justificado => "JUSTIFICADO",
        }
    }
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterEntryRequest {
    pub usuario_sistema_id: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DateQuery {
    pub fecha: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DoctorShiftQuery {
    pub usuario_id: i64,
    pub fecha: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DoctorMarkQuery {
    pub usuario_id: i64,
}

fn default_history_limit() -> usize {
    30
}

#[derive(Debug, Clone, Deserialize)]
pub struct HistoryQuery {
    pub fecha_desde: Option<String>,
    pub fecha_hasta: Option<String>,
    #[serde(default = "default_history_limit")]
    pub limit: usize,
}

fn default_period() -> String {
    "hoy".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct PeriodQuery {
    #[serde(default = "default_period")]
    pub periodo: String,
    pub fecha_referencia: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JustificationRequest {
    pub asistencia_id: i64,
    pub tipo_justificacion: String,
    pub justificacion: String,
    pub justificado_por: i64,
}

#[derive(Error, Debug)]
pub enum AttendanceError {
    #[error("Doctor no encontrado")]
    DoctorNotFound,

    #[error("Registro de asistencia no encontrado")]
    RecordNotFound,

    #[error("Ya tiene un turno activo")]
    ActiveShift,

    #[error("Turno ya finalizado")]
    ShiftFinished,

    #[error("No tienes turno programado para hoy")]
    NoShiftToday,

    #[error("Ya marcaste entrada hoy")]
    AlreadyMarkedEntry,

    #[error("No has marcado entrada hoy")]
    NoEntryToday,

    #[error("Ya marcaste salida hoy")]
    AlreadyMarkedExit,

    #[error("Período inválido. Use: hoy, semana o mes")]
    InvalidPeriod,

    #[error("{0}")]
    Validation(String),

    #[error("Error de base de datos: {0}")]
    Database(String),
}

impl From<anyhow::Error> for AttendanceError {
    fn from(err: anyhow::Error) -> Self {
        AttendanceError::Database(err.to_string())
    }
}

impl From<AttendanceError> for AppError {
    fn from(err: AttendanceError) -> Self {
        match err {
            AttendanceError::DoctorNotFound | AttendanceError::RecordNotFound => {
                AppError::NotFound(err.to_string())
            }
            AttendanceError::ActiveShift | AttendanceError::ShiftFinished => {
                AppError::Conflict(err.to_string())
            }
            AttendanceError::NoShiftToday
            | AttendanceError::AlreadyMarkedEntry
            | AttendanceError::NoEntryToday
            | AttendanceError::AlreadyMarkedExit
            | AttendanceError::InvalidPeriod => AppError::BadRequest(err.to_string()),
            AttendanceError::Validation(msg) => AppError::BadRequest(msg),
            AttendanceError::Database(msg) => AppError::Database(msg),
        }
    }
}
