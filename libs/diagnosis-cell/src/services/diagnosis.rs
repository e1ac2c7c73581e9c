use std::collections::HashMap;

use reqwest::Method;
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_database::supabase::{representation_headers, SupabaseClient};

use crate::models::{DiagnosisError, DiagnosisListQuery, DiagnosisRequest};

const MAX_PAGE_SIZE: u64 = 50;

pub struct DiagnosisService {
    supabase: SupabaseClient,
}

impl DiagnosisService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    pub async fn create_diagnosis(
        &self,
        request: DiagnosisRequest,
    ) -> Result<Value, DiagnosisError> {
        let path = format!(
            "/rest/v1/diagnosticos?nombre_enfermedad=eq.{}&select=id,nombre_enfermedad",
            urlencoding::encode(&request.nombre_enfermedad)
        );
        let existentes: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;
        if !existentes.is_empty() {
            return Err(DiagnosisError::DuplicateName(request.nombre_enfermedad));
        }

        let creados: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/diagnosticos",
                Some(json!({
                    "nombre_enfermedad": request.nombre_enfermedad,
                    "descripcion_enfermedad": request.descripcion_enfermedad
                })),
                Some(representation_headers()),
            )
            .await?;
        let diagnostico = creados.into_iter().next().ok_or_else(|| {
            DiagnosisError::Database("No se pudo insertar el diagnóstico.".to_string())
        })?;

        Ok(json!({
            "mensaje": format!("Diagnóstico '{}' creado correctamente.", request.nombre_enfermedad),
            "diagnostico": diagnostico
        }))
    }

    pub async fn update_diagnosis(
        &self,
        diagnostico_id: i64,
        request: DiagnosisRequest,
    ) -> Result<Value, DiagnosisError> {
        let path = format!(
            "/rest/v1/diagnosticos?id=eq.{}&select=id,nombre_enfermedad",
            diagnostico_id
        );
        let existentes: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;
        if existentes.is_empty() {
            return Err(DiagnosisError::NotFound(diagnostico_id));
        }

        let dup_path = format!(
            "/rest/v1/diagnosticos?nombre_enfermedad=eq.{}&id=neq.{}&select=id",
            urlencoding::encode(&request.nombre_enfermedad),
            diagnostico_id
        );
        let duplicados: Vec<Value> = self.supabase.request(Method::GET, &dup_path, None).await?;
        if !duplicados.is_empty() {
            return Err(DiagnosisError::DuplicateName(request.nombre_enfermedad));
        }

        let update_path = format!("/rest/v1/diagnosticos?id=eq.{}", diagnostico_id);
        let actualizados: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &update_path,
                Some(json!({
                    "nombre_enfermedad": request.nombre_enfermedad,
                    "descripcion_enfermedad": request.descripcion_enfermedad
                })),
                Some(representation_headers()),
            )
            .await?;
        let diagnostico = actualizados.into_iter().next().ok_or_else(|| {
            DiagnosisError::Database("No se pudo actualizar el diagnóstico.".to_string())
        })?;

        Ok(json!({
            "mensaje": format!("Diagnóstico '{}' modificado correctamente.", request.nombre_enfermedad),
            "diagnostico": diagnostico
        }))
    }

    pub async fn delete_diagnosis(&self, diagnostico_id: i64) -> Result<Value, DiagnosisError> {
        let path = format!(
            "/rest/v1/diagnosticos?id=eq.{}&select=id,nombre_enfermedad",
            diagnostico_id
        );
        let existentes: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;
        let diagnostico = existentes
            .into_iter()
            .next()
            .ok_or(DiagnosisError::NotFound(diagnostico_id))?;
        let nombre = diagnostico["nombre_enfermedad"]
            .as_str()
            .unwrap_or_default()
            .to_string();

        let usos_path = format!(
            "/rest/v1/informacion_cita?diagnostico_id=eq.{}&select=id&limit=1",
            diagnostico_id
        );
        let usos: Vec<Value> = self.supabase.request(Method::GET, &usos_path, None).await?;
        if !usos.is_empty() {
            return Err(DiagnosisError::InUse(nombre));
        }

        let delete_path = format!("/rest/v1/diagnosticos?id=eq.{}", diagnostico_id);
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
            return Err(DiagnosisError::Database(
                "No se pudo eliminar el diagnóstico.".to_string(),
            ));
        }

        Ok(json!({ "mensaje": format!("Diagnóstico '{}' eliminado correctamente.", nombre) }))
    }

    /// Paginated catalog with optional name/description search. The total
    /// comes from the same request via `Prefer: count=exact`.
    pub async fn list_diagnoses(
        &self,
        query: DiagnosisListQuery,
    ) -> Result<Value, DiagnosisError> {
        let page = query.page.max(1);
        let limit = query.limit.clamp(1, MAX_PAGE_SIZE);
        let offset = (page - 1) * limit;

        let mut path = format!(
            "/rest/v1/diagnosticos?select=*&order=id.asc&limit={}&offset={}",
            limit, offset
        );
        if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let pattern = format!("%{}%", search);
            let encoded = urlencoding::encode(&pattern);
            path.push_str(&format!(
                "&or=(nombre_enfermedad.ilike.{},descripcion_enfermedad.ilike.{})",
                encoded, encoded
            ));
        }

        let (diagnosticos, total): (Vec<Value>, u64) =
            self.supabase.request_with_total(&path).await?;

        let total_pages = total.div_ceil(limit);

        Ok(json!({
            "diagnosticos": diagnosticos,
            "pagination": {
                "page": page,
                "limit": limit,
                "total": total,
                "total_pages": total_pages,
                "has_next": page < total_pages,
                "has_prev": page > 1
            }
        }))
    }

    pub async fn diagnosis_stats(&self) -> Result<Value, DiagnosisError> {
        let (_, total_diagnosticos): (Vec<Value>, u64) = self
            .supabase
            .request_with_total("/rest/v1/diagnosticos?select=id&limit=1")
            .await?;

        let usos: Vec<Value> = self
            .supabase
            .request(
                Method::GET,
                "/rest/v1/informacion_cita?select=diagnostico_id",
                None,
            )
            .await?;

        let mut uso_por_diagnostico: HashMap<i64, u64> = HashMap::new();
        for uso in &usos {
            if let Some(diagnostico_id) = uso["diagnostico_id"].as_i64() {
                *uso_por_diagnostico.entry(diagnostico_id).or_insert(0) += 1;
            }
        }

        let total_usos: u64 = uso_por_diagnostico.values().sum();
        let diagnosticos_con_uso = uso_por_diagnostico.len() as u64;
        let diagnosticos_sin_uso = total_diagnosticos.saturating_sub(diagnosticos_con_uso);

        Ok(json!({
            "total_diagnosticos": total_diagnosticos,
            "diagnosticos_con_uso": diagnosticos_con_uso,
            "diagnosticos_sin_uso": diagnosticos_sin_uso,
            "total_usos": total_usos
        }))
    }
}
