use reqwest::Method;
use serde_json::{json, Value};
use tracing::warn;

use shared_config::AppConfig;
use shared_database::supabase::{representation_headers, SupabaseClient};
use shared_utils::rut::normalize_rut;

use crate::models::{UserError, UserRequest};

pub struct UserService {
    supabase: SupabaseClient,
}

impl UserService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    async fn duplicate_exists(
        &self,
        rut: &str,
        email: &str,
        exclude_id: Option<i64>,
    ) -> Result<bool, UserError> {
        let mut path = format!(
            "/rest/v1/usuario_sistema?or=(rut.eq.{},email.eq.{})&select=id",
            urlencoding::encode(rut),
            urlencoding::encode(email)
        );
        if let Some(id) = exclude_id {
            path.push_str(&format!("&id=neq.{}", id));
        }
        let rows: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;
        Ok(!rows.is_empty())
    }

    pub async fn create_user(&self, request: UserRequest) -> Result<Value, UserError> {
        let rut = normalize_rut(&request.rut);
        if self.duplicate_exists(&rut, &request.email, None).await? {
            return Err(UserError::DuplicateUser);
        }

        let creados: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/usuario_sistema",
                Some(json!({
                    "nombre": request.nombre,
                    "apellido_paterno": request.apellido_paterno,
                    "apellido_materno": request.apellido_materno,
                    "rut": rut,
                    "email": request.email,
                    "celular": request.celular,
                    "cel_secundario": request.cel_secundario,
                    "direccion": request.direccion,
                    "rol_id": request.rol_id
                })),
                Some(representation_headers()),
            )
            .await?;
        let usuario = creados
            .into_iter()
            .next()
            .ok_or_else(|| UserError::Database("No se pudo crear el usuario.".to_string()))?;

        if let Some(especialidad_id) = request.especialidad_id {
            let resultado: Result<Vec<Value>, _> = self
                .supabase
                .request_with_headers(
                    Method::POST,
                    "/rest/v1/especialidades_doctor",
                    Some(json!({
                        "usuario_sistema_id": usuario["id"],
                        "especialidad_id": especialidad_id
                    })),
                    Some(representation_headers()),
                )
                .await;
            if let Err(err) = resultado {
                warn!("Could not link specialty to new user: {}", err);
            }
        }

        Ok(json!({
            "mensaje": "Usuario creado correctamente.",
            "usuario": usuario
        }))
    }

    pub async fn update_user(
        &self,
        usuario_id: i64,
        request: UserRequest,
    ) -> Result<Value, UserError> {
        let path = format!("/rest/v1/usuario_sistema?id=eq.{}&select=id", usuario_id);
        let existentes: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;
        if existentes.is_empty() {
            return Err(UserError::UserNotFound);
        }

        let rut = normalize_rut(&request.rut);
        if self
            .duplicate_exists(&rut, &request.email, Some(usuario_id))
            .await?
        {
            return Err(UserError::DuplicateUser);
        }

        let update_path = format!("/rest/v1/usuario_sistema?id=eq.{}", usuario_id);
        let actualizados: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &update_path,
                Some(json!({
                    "nombre": request.nombre,
                    "apellido_paterno": request.apellido_paterno,
                    "apellido_materno": request.apellido_materno,
                    "rut": rut,
                    "email": request.email,
                    "celular": request.celular,
                    "cel_secundario": request.cel_secundario,
                    "direccion": request.direccion,
                    "rol_id": request.rol_id
                })),
                Some(representation_headers()),
            )
            .await?;
        let usuario = actualizados
            .into_iter()
            .next()
            .ok_or_else(|| UserError::Database("No se pudo actualizar el usuario.".to_string()))?;

        self.sync_specialty(usuario_id, request.especialidad_id).await?;

        Ok(json!({
            "mensaje": "Usuario modificado correctamente.",
            "usuario": usuario
        }))
    }

    /// Keeps especialidades_doctor in sync with the requested specialty:
    /// update-or-insert when one is given, delete when none.
    async fn sync_specialty(
        &self,
        usuario_id: i64,
        especialidad_id: Option<i64>,
    ) -> Result<(), UserError> {
        match especialidad_id {
            Some(especialidad_id) => {
                let path = format!(
                    "/rest/v1/especialidades_doctor?usuario_sistema_id=eq.{}&select=id",
                    usuario_id
                );
                let existentes: Vec<Value> =
                    self.supabase.request(Method::GET, &path, None).await?;
                if existentes.is_empty() {
                    let _: Vec<Value> = self
                        .supabase
                        .request_with_headers(
                            Method::POST,
                            "/rest/v1/especialidades_doctor",
                            Some(json!({
                                "usuario_sistema_id": usuario_id,
                                "especialidad_id": especialidad_id
                            })),
                            Some(representation_headers()),
                        )
                        .await?;
                } else {
                    let update_path = format!(
                        "/rest/v1/especialidades_doctor?usuario_sistema_id=eq.{}",
                        usuario_id
                    );
                    let _: Vec<Value> = self
                        .supabase
                        .request_with_headers(
                            Method::PATCH,
                            &update_path,
                            Some(json!({ "especialidad_id": especialidad_id })),
                            Some(representation_headers()),
                        )
                        .await?;
                }
            }
            None => {
                let delete_path = format!(
                    "/rest/v1/especialidades_doctor?usuario_sistema_id=eq.{}",
                    usuario_id
                );
                let _: Vec<Value> = self
                    .supabase
                    .request_with_headers(
                        Method::DELETE,
                        &delete_path,
                        None,
                        Some(representation_headers()),
                    )
                    .await?;
            }
        }
        Ok(())
    }

    pub async fn delete_user(&self, usuario_id: i64) -> Result<Value, UserError> {
        let path = format!("/rest/v1/usuario_sistema?id=eq.{}&select=id", usuario_id);
        let existentes: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;
        if existentes.is_empty() {
            return Err(UserError::UserNotFound);
        }

        // Specialty links first, the user row references them otherwise.
        let especialidad_path = format!(
            "/rest/v1/especialidades_doctor?usuario_sistema_id=eq.{}",
            usuario_id
        );
        let _: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::DELETE,
                &especialidad_path,
                None,
                Some(representation_headers()),
            )
            .await?;

        let delete_path = format!("/rest/v1/usuario_sistema?id=eq.{}", usuario_id);
        let eliminados: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::DELETE,
                &delete_path,
                None,
                Some(representation_headers()),
            )
            .await?;
        if eliminados.is_empty() {
            return Err(UserError::Database(
                "No se pudo eliminar el usuario.".to_string(),
            ));
        }

        Ok(json!({ "mensaje": "Usuario eliminado correctamente." }))
    }

    pub async fn list_users(&self) -> Result<Vec<Value>, UserError> {
        let usuarios: Vec<Value> = self
            .supabase
            .request(
                Method::GET,
                "/rest/v1/usuario_sistema?select=*&order=id.asc",
                None,
            )
            .await?;
        Ok(usuarios)
    }
}
