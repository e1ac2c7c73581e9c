use reqwest::Method;
use serde_json::Value;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::AppointmentError;

/// Read-only catalogs used by the booking forms.
pub struct LookupService {
    supabase: SupabaseClient,
}

impl LookupService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    pub async fn list_specialties(&self) -> Result<Vec<Value>, AppointmentError> {
        let path = "/rest/v1/especialidad?select=id,nombre,descripcion&order=nombre.asc";
        let especialidades: Vec<Value> = self.supabase.request(Method::GET, path, None).await?;
        Ok(especialidades)
    }

    pub async fn list_doctors(
        &self,
        especialidad_id: Option<i64>,
    ) -> Result<Vec<Value>, AppointmentError> {
        if let Some(especialidad_id) = especialidad_id {
            let links_path = format!(
                "/rest/v1/especialidades_doctor?especialidad_id=eq.{}&select=usuario_sistema_id",
                especialidad_id
            );
            let links: Vec<Value> = self.supabase.request(Method::GET, &links_path, None).await?;
            if links.is_empty() {
                return Ok(vec![]);
            }

            let ids: Vec<String> = links
                .iter()
                .filter_map(|l| l["usuario_sistema_id"].as_i64())
                .map(|id| id.to_string())
                .collect();
            let path = format!(
                "/rest/v1/usuario_sistema?id=in.({})&select=id,nombre,apellido_paterno,apellido_materno,email&order=nombre.asc",
                ids.join(",")
            );
            let doctores: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;
            Ok(doctores)
        } else {
            let path = "/rest/v1/usuario_sistema?rol_id=eq.2&select=id,nombre,apellido_paterno,apellido_materno,email&order=nombre.asc";
            let doctores: Vec<Value> = self.supabase.request(Method::GET, path, None).await?;
            Ok(doctores)
        }
    }

    pub async fn list_diagnoses(&self) -> Result<Vec<Value>, AppointmentError> {
        let path = "/rest/v1/diagnosticos?select=id,nombre_enfermedad&order=nombre_enfermedad.asc";
        let diagnosticos: Vec<Value> = self.supabase.request(Method::GET, path, None).await?;
        Ok(diagnosticos)
    }
}
