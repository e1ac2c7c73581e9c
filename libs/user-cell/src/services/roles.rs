use reqwest::Method;
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_database::supabase::{representation_headers, SupabaseClient};

use crate::models::{RoleRequest, UserError};

pub struct RoleService {
    supabase: SupabaseClient,
}

impl RoleService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    pub async fn create_role(&self, request: RoleRequest) -> Result<Value, UserError> {
        let path = format!(
            "/rest/v1/rol?nombre=eq.{}&select=id,nombre",
            urlencoding::encode(&request.nombre)
        );
        let existentes: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;
        if !existentes.is_empty() {
            return Err(UserError::DuplicateRole(request.nombre));
        }

        let creados: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/rol",
                Some(json!({
                    "nombre": request.nombre,
                    "descripcion": request.descripcion
                })),
                Some(representation_headers()),
            )
            .await?;
        let rol = creados
            .into_iter()
            .next()
            .ok_or_else(|| UserError::Database("No se pudo insertar el rol.".to_string()))?;

        let roles = self.list_roles().await?;
        Ok(json!({
            "mensaje": format!("Rol '{}' creado correctamente.", rol["nombre"].as_str().unwrap_or_default()),
            "roles_actuales": roles
        }))
    }

    pub async fn update_role(
        &self,
        rol_id: i64,
        request: RoleRequest,
    ) -> Result<Value, UserError> {
        let path = format!("/rest/v1/rol?id=eq.{}&select=id,nombre", rol_id);
        let existentes: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;
        if existentes.is_empty() {
            return Err(UserError::RoleNotFound(rol_id));
        }

        let dup_path = format!(
            "/rest/v1/rol?nombre=eq.{}&id=neq.{}&select=id",
            urlencoding::encode(&request.nombre),
            rol_id
        );
        let duplicados: Vec<Value> = self.supabase.request(Method::GET, &dup_path, None).await?;
        if !duplicados.is_empty() {
            return Err(UserError::DuplicateRole(request.nombre));
        }

        let update_path = format!("/rest/v1/rol?id=eq.{}", rol_id);
        let actualizados: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &update_path,
                Some(json!({
                    "nombre": request.nombre,
                    "descripcion": request.descripcion
                })),
                Some(representation_headers()),
            )
            .await?;
        let rol = actualizados
            .into_iter()
            .next()
            .ok_or_else(|| UserError::Database("No se pudo actualizar el rol.".to_string()))?;

        Ok(json!({
            "mensaje": format!("Rol '{}' modificado correctamente.", rol["nombre"].as_str().unwrap_or_default()),
            "rol_actualizado": rol
        }))
    }

    pub async fn delete_role(&self, rol_id: i64) -> Result<Value, UserError> {
        let path = format!("/rest/v1/rol?id=eq.{}&select=id,nombre", rol_id);
        let existentes: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;
        let rol = existentes
            .into_iter()
            .next()
            .ok_or(UserError::RoleNotFound(rol_id))?;
        let nombre = rol["nombre"].as_str().unwrap_or_default().to_string();

        let delete_path = format!("/rest/v1/rol?id=eq.{}", rol_id);
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
            return Err(UserError::Database("No se pudo eliminar el rol.".to_string()));
        }

        Ok(json!({ "mensaje": format!("Rol '{}' eliminado correctamente.", nombre) }))
    }

    pub async fn list_roles(&self) -> Result<Vec<Value>, UserError> {
        let roles: Vec<Value> = self
            .supabase
            .request(Method::GET, "/rest/v1/rol?select=*&order=id.asc", None)
            .await?;
        Ok(roles)
    }
}
