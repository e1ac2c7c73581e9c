use reqwest::Method;
use serde_json::{json, Value};
use tracing::warn;

use shared_config::AppConfig;
use shared_database::supabase::{representation_headers, SupabaseClient};

use crate::models::{
    BulkSettingItem, CreateSettingRequest, SettingListQuery, SettingsError, UpdateSettingRequest,
};

pub struct SettingsService {
    supabase: SupabaseClient,
}

impl SettingsService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    pub async fn list_settings(&self, query: SettingListQuery) -> Result<Value, SettingsError> {
        let mut path =
            "/rest/v1/configuracion_sistema?select=*&order=categoria.asc,clave.asc".to_string();
        if let Some(categoria) = query.categoria.as_deref().filter(|c| !c.is_empty()) {
            path.push_str(&format!("&categoria=eq.{}", urlencoding::encode(categoria)));
        }

        let configuraciones: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;

        Ok(json!({
            "total": configuraciones.len(),
            "configuraciones": configuraciones
        }))
    }

    pub async fn get_setting(&self, clave: &str) -> Result<Value, SettingsError> {
        let path = format!(
            "/rest/v1/configuracion_sistema?clave=eq.{}&select=*",
            urlencoding::encode(clave)
        );
        let filas: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;
        filas
            .into_iter()
            .next()
            .ok_or_else(|| SettingsError::NotFound(clave.to_string()))
    }

    pub async fn update_setting(
        &self,
        clave: &str,
        request: UpdateSettingRequest,
    ) -> Result<Value, SettingsError> {
        let path = format!(
            "/rest/v1/configuracion_sistema?clave=eq.{}&select=id,clave",
            urlencoding::encode(clave)
        );
        let existentes: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;
        if existentes.is_empty() {
            return Err(SettingsError::NotFound(clave.to_string()));
        }

        let update_path = format!(
            "/rest/v1/configuracion_sistema?clave=eq.{}",
            urlencoding::encode(clave)
        );
        let actualizados: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &update_path,
                Some(json!({ "valor": request.valor })),
                Some(representation_headers()),
            )
            .await?;
        let configuracion = actualizados.into_iter().next().ok_or_else(|| {
            SettingsError::Database("No se pudo actualizar la configuración.".to_string())
        })?;

        Ok(json!({
            "mensaje": "Configuración actualizada correctamente.",
            "configuracion": configuracion
        }))
    }

    pub async fn create_setting(
        &self,
        request: CreateSettingRequest,
    ) -> Result<Value, SettingsError> {
        let path = format!(
            "/rest/v1/configuracion_sistema?clave=eq.{}&select=id",
            urlencoding::encode(&request.clave)
        );
        let existentes: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;
        if !existentes.is_empty() {
            return Err(SettingsError::DuplicateKey(request.clave));
        }

        let creados: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/configuracion_sistema",
                Some(json!({
                    "clave": request.clave,
                    "valor": request.valor,
                    "tipo": request.tipo,
                    "categoria": request.categoria,
                    "descripcion": request.descripcion
                })),
                Some(representation_headers()),
            )
            .await?;
        let configuracion = creados.into_iter().next().ok_or_else(|| {
            SettingsError::Database("No se pudo crear la configuración.".to_string())
        })?;

        Ok(json!({
            "mensaje": "Configuración creada correctamente.",
            "configuracion": configuracion
        }))
    }

    /// Best-effort bulk update. Each entry is applied independently; failures
    /// are collected per key instead of aborting the batch.
    pub async fn update_many(
        &self,
        items: Vec<BulkSettingItem>,
    ) -> Result<Value, SettingsError> {
        let mut actualizados: Vec<Value> = Vec::new();
        let mut errores: Vec<Value> = Vec::new();

        for item in items {
            let Some(clave) = item.clave.filter(|c| !c.is_empty()) else {
                errores.push(json!({"clave": "unknown", "error": "Clave no proporcionada"}));
                continue;
            };

            let update_path = format!(
                "/rest/v1/configuracion_sistema?clave=eq.{}",
                urlencoding::encode(&clave)
            );
            let resultado: Result<Vec<Value>, _> = self
                .supabase
                .request_with_headers(
                    Method::PATCH,
                    &update_path,
                    Some(json!({ "valor": item.valor })),
                    Some(representation_headers()),
                )
                .await;

            match resultado {
                Ok(filas) => match filas.into_iter().next() {
                    Some(fila) => actualizados.push(fila),
                    None => errores.push(json!({"clave": clave, "error": "No se pudo actualizar"})),
                },
                Err(err) => {
                    warn!("Bulk setting update failed for '{}': {}", clave, err);
                    errores.push(json!({"clave": clave, "error": err.to_string()}));
                }
            }
        }

        Ok(json!({
            "mensaje": format!("Se actualizaron {} configuraciones correctamente.", actualizados.len()),
            "actualizados": actualizados,
            "errores": if errores.is_empty() { Value::Null } else { Value::Array(errores) }
        }))
    }
}
