use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::Deserialize;
use thiserror::Error;

use shared_models::error::AppError;

/// Closed status set for an appointment. The history table is append-only;
/// the latest row is the current status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppointmentStatus {
    Pendiente,
    Confirmada,
    EnConsulta,
    Completada,
    Cancelada,
}

impl AppointmentStatus {
    pub const ALL: [AppointmentStatus; 5] = [
        AppointmentStatus::Pendiente,
        AppointmentStatus::Confirmada,
        AppointmentStatus::EnConsulta,
        AppointmentStatus::Completada,
        AppointmentStatus::Cancelada,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Pendiente => "Pendiente",
            AppointmentStatus::Confirmada => "Confirmada",
            AppointmentStatus::EnConsulta => "En Consulta",
            AppointmentStatus::Completada => "Completada",
            AppointmentStatus::Cancelada => "Cancelada",
        }
    }

    pub fn valid_values() -> String {
        Self::ALL
            .iter()
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppointmentStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pendiente" => Ok(AppointmentStatus::Pendiente),
            "Confirmada" => Ok(AppointmentStatus::Confirmada),
            "En Consulta" => Ok(AppointmentStatus::EnConsulta),
            "Completada" => Ok(AppointmentStatus::Completada),
            "Cancelada" => Ok(AppointmentStatus::Cancelada),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewAppointment {
    pub fecha_atencion: NaiveDateTime,
    pub paciente_id: i64,
    pub doctor_id: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConsultationInfo {
    pub motivo_consulta: Option<String>,
    pub antecedentes: Option<String>,
    pub dolores_sintomas: Option<String>,
    pub atenciones_quirurgicas: Option<String>,
    pub evaluacion_doctor: Option<String>,
    pub tratamiento: Option<String>,
    pub diagnostico_id: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateAppointmentRequest {
    pub cita: NewAppointment,
    #[serde(default)]
    pub estado_inicial: Option<String>,
    #[serde(default)]
    pub informacion: ConsultationInfo,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateAppointmentRequest {
    pub fecha_atencion: Option<NaiveDateTime>,
    pub paciente_id: Option<i64>,
    pub doctor_id: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChangeStatusRequest {
    pub estado: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PrescriptionItem {
    pub nombre: String,
    pub presentacion: Option<String>,
    pub dosis: Option<String>,
    pub duracion: Option<String>,
    pub cantidad: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SaveConsultationRequest {
    pub motivo_consulta: Option<String>,
    pub antecedentes: Option<String>,
    pub dolores_sintomas: Option<String>,
    pub atenciones_quirurgicas: Option<String>,
    pub evaluacion_doctor: Option<String>,
    pub tratamiento: Option<String>,
    pub diagnostico_ids: Option<Vec<i64>>,
    pub recetas: Option<Vec<PrescriptionItem>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentRequest {
    pub cita_medica_id: i64,
    pub tipo_pago: String,
    pub total: f64,
    pub descuento_aseguradora: Option<f64>,
}

pub const VALID_PAYMENT_TYPES: [&str; 4] = [
    "Efectivo",
    "Tarjeta de Débito",
    "Tarjeta de Crédito",
    "Transferencia",
];

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppointmentListQuery {
    pub fecha: Option<String>,
    pub doctor_id: Option<i64>,
    pub estado: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DateQuery {
    pub fecha: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DoctorAgendaQuery {
    pub fecha: Option<String>,
    /// Comma-separated status list, e.g. "Confirmada,En Consulta".
    pub estados: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SpecialtyQuery {
    pub especialidad_id: Option<i64>,
}

#[derive(Error, Debug)]
pub enum AppointmentError {
    #[error("La cita no existe.")]
    AppointmentNotFound,

    #[error("El paciente no existe.")]
    PatientNotFound,

    #[error("El doctor no existe.")]
    DoctorNotFound,

    #[error("El usuario seleccionado no es un doctor.")]
    NotADoctor,

    #[error("El doctor no tiene horarios asignados para la fecha/hora seleccionada.")]
    NoScheduleBlock,

    #[error("Ya existe una cita para este doctor en la fecha/hora seleccionada.")]
    SlotTaken,

    #[error("Estado inválido. Estados válidos: {0}")]
    InvalidStatus(String),

    #[error("Tipo de pago inválido. Valores válidos: {0}")]
    InvalidPaymentType(String),

    #[error("Ya existe un pago registrado para esta cita.")]
    DuplicatePayment,

    #[error("El descuento debe estar entre 0 y 100%")]
    InvalidDiscount,

    #[error("No se encontró un precio para esta especialidad.")]
    PriceNotFound,

    #[error("{0}")]
    Validation(String),

    #[error("Error de base de datos: {0}")]
    Database(String),
}

impl From<anyhow::Error> for AppointmentError {
    fn from(err: anyhow::Error) -> Self {
        AppointmentError::Database(err.to_string())
    }
}

impl From<AppointmentError> for AppError {
    fn from(err: AppointmentError) -> Self {
        match err {
            AppointmentError::AppointmentNotFound
            | AppointmentError::PatientNotFound
            | AppointmentError::DoctorNotFound
            | AppointmentError::PriceNotFound => AppError::NotFound(err.to_string()),
            AppointmentError::NoScheduleBlock
            | AppointmentError::SlotTaken
            | AppointmentError::DuplicatePayment => AppError::Conflict(err.to_string()),
            AppointmentError::NotADoctor
            | AppointmentError::InvalidStatus(_)
            | AppointmentError::InvalidPaymentType(_)
            | AppointmentError::InvalidDiscount => AppError::BadRequest(err.to_string()),
            AppointmentError::Validation(msg) => AppError::BadRequest(msg),
            AppointmentError::Database(msg) => AppError::Database(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_roundtrips_through_display() {
        for status in AppointmentStatus::ALL {
            assert_eq!(status.as_str().parse::<AppointmentStatus>(), Ok(status));
        }
    }

    #[test]
    fn en_consulta_uses_a_space() {
        assert_eq!(AppointmentStatus::EnConsulta.to_string(), "En Consulta");
        assert_eq!(
            "En Consulta".parse::<AppointmentStatus>(),
            Ok(AppointmentStatus::EnConsulta)
        );
    }

    #[test]
    fn unknown_status_is_rejected() {
        assert!("Agendada".parse::<AppointmentStatus>().is_err());
        assert!("pendiente".parse::<AppointmentStatus>().is_err());
    }
}
