use serde::Deserialize;
use thiserror::Error;

use shared_models::error::AppError;

#[derive(Debug, Clone, Deserialize)]
pub struct RoleRequest {
    pub nombre: String,
    pub descripcion: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserRequest {
    pub nombre: String,
    pub apellido_paterno: String,
    pub apellido_materno: Option<String>,
    pub rut: String,
    pub email: String,
    pub celular: Option<String>,
    pub cel_secundario: Option<String>,
    pub direccion: Option<String>,
    pub rol_id: i64,
    pub especialidad_id: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpecialtyRequest {
    pub nombre: String,
    pub descripcion: Option<String>,
    pub precio: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubSpecialtyRequest {
    pub nombre: String,
    pub descripcion: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpecialtyLinkRequest {
    pub especialidad_id: i64,
    pub sub_especialidad_id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProfileUpdateRequest {
    pub nombre: String,
    pub apellido_paterno: String,
    pub apellido_materno: Option<String>,
    pub rut: String,
    pub email: String,
    pub celular: Option<String>,
    pub cel_secundario: Option<String>,
    pub direccion: Option<String>,
}

/// Doctor self-service profile edit. RUT and specialties stay
/// admin-managed, so they are not part of this request.
#[derive(Debug, Clone, Deserialize)]
pub struct DoctorProfileUpdateRequest {
    pub nombre: String,
    pub apellido_paterno: String,
    pub apellido_materno: Option<String>,
    pub email: String,
    pub celular: Option<String>,
    pub cel_secundario: Option<String>,
    pub direccion: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChangePasswordRequest {
    pub password_actual: String,
    pub password_nueva: String,
}

#[derive(Error, Debug)]
pub enum UserError {
    #[error("No existe el rol con ID {0}.")]
    RoleNotFound(i64),

    #[error("El rol '{0}' ya existe en el sistema.")]
    DuplicateRole(String),

    #[error("No existe el usuario.")]
    UserNotFound,

    #[error("Ya existe un usuario con ese rut o email.")]
    DuplicateUser,

    #[error("No existe la especialidad con ID {0}.")]
    SpecialtyNotFound(i64),

    #[error("Ya existe otra especialidad con nombre '{0}'.")]
    DuplicateSpecialty(String),

    #[error("{0}")]
    SpecialtyInUse(String),

    #[error("No existe la subespecialidad con ID {0}.")]
    SubSpecialtyNotFound(i64),

    #[error("Ya existe otra subespecialidad con nombre '{0}'.")]
    DuplicateSubSpecialty(String),

    #[error("Ya existe ese vínculo.")]
    DuplicateLink,

    #[error("El vínculo no existe.")]
    LinkNotFound,

    #[error("No se encontró información de contraseña para este doctor.")]
    PasswordNotFound,

    #[error("La contraseña actual es incorrecta.")]
    WrongPassword,

    #[error("{0}")]
    Validation(String),

    #[error("Error de base de datos: {0}")]
    Database(String),
}

impl From<anyhow::Error> for UserError {
    fn from(err: anyhow::Error) -> Self {
        UserError::Database(err.to_string())
    }
}

impl From<UserError> for AppError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::RoleNotFound(_)
            | UserError::UserNotFound
            | UserError::SpecialtyNotFound(_)
            | UserError::SubSpecialtyNotFound(_)
            | UserError::LinkNotFound
            | UserError::PasswordNotFound => AppError::NotFound(err.to_string()),
            UserError::DuplicateRole(_)
            | UserError::DuplicateUser
            | UserError::DuplicateSpecialty(_)
            | UserError::SpecialtyInUse(_)
            | UserError::DuplicateSubSpecialty(_)
            | UserError::DuplicateLink => AppError::Conflict(err.to_string()),
            UserError::WrongPassword => AppError::Auth(err.to_string()),
            UserError::Validation(msg) => AppError::BadRequest(msg),
            UserError::Database(msg) => AppError::Database(msg),
        }
    }
}
