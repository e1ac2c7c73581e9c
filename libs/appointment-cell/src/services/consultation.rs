use reqwest::Method;
use serde_json::{json, Value};
use tracing::debug;

use shared_config::AppConfig;
use shared_database::supabase::{representation_headers, SupabaseClient};

use crate::models::{AppointmentError, ConsultationInfo, SaveConsultationRequest};
use crate::services::status::appointment_exists;

pub struct ConsultationService {
    supabase: SupabaseClient,
}

impl ConsultationService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    /// Partial update of the consultation record; creates it when the
    /// appointment has none yet.
    pub async fn update_info(
        &self,
        cita_id: i64,
        info: ConsultationInfo,
    ) -> Result<Value, AppointmentError> {
        if !appointment_exists(&self.supabase, cita_id).await? {
            return Err(AppointmentError::AppointmentNotFound);
        }

        let mut update_data = serde_json::Map::new();
        if let Some(motivo) = info.motivo_consulta {
            update_data.insert("motivo_consulta".to_string(), json!(motivo));
        }
        if let Some(antecedentes) = info.antecedentes {
            update_data.insert("antecedentes".to_string(), json!(antecedentes));
        }
        if let Some(dolores) = info.dolores_sintomas {
            update_data.insert("dolores_sintomas".to_string(), json!(dolores));
        }
        if let Some(atenciones) = info.atenciones_quirurgicas {
            update_data.insert("atenciones_quirurgicas".to_string(), json!(atenciones));
        }
        if let Some(evaluacion) = info.evaluacion_doctor {
            update_data.insert("evaluacion_doctor".to_string(), json!(evaluacion));
        }
        if let Some(tratamiento) = info.tratamiento {
            update_data.insert("tratamiento".to_string(), json!(tratamiento));
        }
        if let Some(diagnostico_id) = info.diagnostico_id {
            update_data.insert("diagnostico_id".to_string(), json!(diagnostico_id));
        }

        if update_data.is_empty() {
            return Err(AppointmentError::Validation(
                "No hay datos para actualizar.".to_string(),
            ));
        }

        let existing_path = format!(
            "/rest/v1/informacion_cita?cita_medica_id=eq.{}&select=id",
            cita_id
        );
        let existing: Vec<Value> = self
            .supabase
            .request(Method::GET, &existing_path, None)
            .await?;

        let updated: Vec<Value> = if existing.is_empty() {
            update_data.insert("cita_medica_id".to_string(), json!(cita_id));
            self.supabase
                .request_with_headers(
                    Method::POST,
                    "/rest/v1/informacion_cita",
                    Some(Value::Object(update_data)),
                    Some(representation_headers()),
                )
                .await?
        } else {
            let path = format!("/rest/v1/informacion_cita?cita_medica_id=eq.{}", cita_id);
            self.supabase
                .request_with_headers(
                    Method::PATCH,
                    &path,
                    Some(Value::Object(update_data)),
                    Some(representation_headers()),
                )
                .await?
        };

        updated.into_iter().next().ok_or_else(|| {
            AppointmentError::Database("No se pudo actualizar la información.".to_string())
        })
    }

    /// Saves a consultation draft or final record: upserts the consultation
    /// info and replaces the prescription rows wholesale.
    pub async fn save_consultation(
        &self,
        cita_id: i64,
        consulta: SaveConsultationRequest,
    ) -> Result<i64, AppointmentError> {
        if !appointment_exists(&self.supabase, cita_id).await? {
            return Err(AppointmentError::AppointmentNotFound);
        }
        debug!("Saving consultation for appointment {}", cita_id);

        let mut datos = json!({
            "cita_medica_id": cita_id,
            "motivo_consulta": consulta.motivo_consulta,
            "antecedentes": consulta.antecedentes,
            "dolores_sintomas": consulta.dolores_sintomas.as_deref().unwrap_or("No aplica dolor"),
            "atenciones_quirurgicas": consulta.atenciones_quirurgicas.as_deref().unwrap_or("No aplica"),
            "evaluacion_doctor": consulta.evaluacion_doctor,
            "tratamiento": consulta.tratamiento
        });
        // The schema keeps a single diagnosis per consultation; the first
        // selected one wins.
        if let Some(first) = consulta.diagnostico_ids.as_ref().and_then(|ids| ids.first()) {
            datos["diagnostico_id"] = json!(first);
        }

        let existing_path = format!(
            "/rest/v1/informacion_cita?cita_medica_id=eq.{}&select=id",
            cita_id
        );
        let existing: Vec<Value> = self
            .supabase
            .request(Method::GET, &existing_path, None)
            .await?;

        let info_cita_id = if let Some(info_id) = existing.first().and_then(|r| r["id"].as_i64()) {
            let path = format!("/rest/v1/informacion_cita?id=eq.{}", info_id);
            let _: Vec<Value> = self
                .supabase
                .request_with_headers(
                    Method::PATCH,
                    &path,
                    Some(datos),
                    Some(representation_headers()),
                )
                .await?;

            let recetas_path = format!("/rest/v1/receta?informacion_cita_id=eq.{}", info_id);
            let _: Vec<Value> = self
                .supabase
                .request_with_headers(
                    Method::DELETE,
                    &recetas_path,
                    None,
                    Some(representation_headers()),
                )
                .await?;
            info_id
        } else {
            let created: Vec<Value> = self
                .supabase
                .request_with_headers(
                    Method::POST,
                    "/rest/v1/informacion_cita",
                    Some(datos),
                    Some(representation_headers()),
                )
                .await?;
            created
                .first()
                .and_then(|r| r["id"].as_i64())
                .ok_or_else(|| {
                    AppointmentError::Database(
                        "No se pudo crear la información de la consulta.".to_string(),
                    )
                })?
        };

        if let Some(recetas) = consulta.recetas {
            for receta in recetas {
                let _: Vec<Value> = self
                    .supabase
                    .request_with_headers(
                        Method::POST,
                        "/rest/v1/receta",
                        Some(json!({
                            "nombre": receta.nombre,
                            "presentacion": receta.presentacion,
                            "dosis": receta.dosis,
                            "duracion": receta.duracion,
                            "cantidad": receta.cantidad,
                            "informacion_cita_id": info_cita_id
                        })),
                        Some(representation_headers()),
                    )
                    .await?;
            }
        }

        Ok(info_cita_id)
    }
}
