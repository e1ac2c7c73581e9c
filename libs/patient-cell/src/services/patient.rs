use reqwest::Method;
use serde_json::{json, Value};
use tracing::debug;

use shared_config::AppConfig;
use shared_database::supabase::{representation_headers, SupabaseClient};
use shared_utils::rut::normalize_rut;

use crate::models::{CreatePatientRequest, CreatePrevencionRequest, PatientError, UpdatePatientRequest};

pub struct PatientService {
    supabase: SupabaseClient,
}

impl PatientService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    pub async fn create_patient(&self, request: CreatePatientRequest) -> Result<Value, PatientError> {
        let rut = normalize_rut(&request.rut);
        if rut.is_empty() {
            return Err(PatientError::Validation("El RUT es obligatorio".to_string()));
        }
        debug!("Creating patient with RUT {}", rut);

        let dup_path = format!("/rest/v1/paciente?rut=eq.{}&select=id", rut);
        let existing: Vec<Value> = self.supabase.request(Method::GET, &dup_path, None).await?;
        if !existing.is_empty() {
            return Err(PatientError::DuplicateRut(rut));
        }

        let patient_data = json!({
            "nombre": request.nombre,
            "apellido_paterno": request.apellido_paterno,
            "apellido_materno": request.apellido_materno,
            "rut": rut,
            "email": request.email,
            "celular": request.celular,
            "direccion": request.direccion,
            "fecha_nacimiento": request.fecha_nacimiento,
            "prevencion_id": request.prevencion_id,
        });

        let created: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/paciente",
                Some(patient_data),
                Some(representation_headers()),
            )
            .await?;

        created
            .into_iter()
            .next()
            .ok_or_else(|| PatientError::Database("No se pudo crear el paciente".to_string()))
    }

    pub async fn update_patient(
        &self,
        patient_id: i64,
        request: UpdatePatientRequest,
    ) -> Result<Value, PatientError> {
        debug!("Updating patient {}", patient_id);

        let exists_path = format!("/rest/v1/paciente?id=eq.{}&select=id", patient_id);
        let existing: Vec<Value> = self.supabase.request(Method::GET, &exists_path, None).await?;
        if existing.is_empty() {
            return Err(PatientError::NotFound);
        }

        let mut update_data = serde_json::Map::new();
        if let Some(nombre) = request.nombre {
            update_data.insert("nombre".to_string(), json!(nombre));
        }
        if let Some(apellido_paterno) = request.apellido_paterno {
            update_data.insert("apellido_paterno".to_string(), json!(apellido_paterno));
        }
        if let Some(apellido_materno) = request.apellido_materno {
            update_data.insert("apellido_materno".to_string(), json!(apellido_materno));
        }
        if let Some(rut) = request.rut {
            let rut = normalize_rut(&rut);
            let dup_path = format!(
                "/rest/v1/paciente?rut=eq.{}&id=neq.{}&select=id",
                rut, patient_id
            );
            let duplicates: Vec<Value> = self.supabase.request(Method::GET, &dup_path, None).await?;
            if !duplicates.is_empty() {
                return Err(PatientError::DuplicateRut(rut));
            }
            update_data.insert("rut".to_string(), json!(rut));
        }
        if let Some(email) = request.email {
            update_data.insert("email".to_string(), json!(email));
        }
        if let Some(celular) = request.celular {
            update_data.insert("celular".to_string(), json!(celular));
        }
        if let Some(direccion) = request.direccion {
            update_data.insert("direccion".to_string(), json!(direccion));
        }
        if let Some(fecha_nacimiento) = request.fecha_nacimiento {
            update_data.insert("fecha_nacimiento".to_string(), json!(fecha_nacimiento));
        }
        if let Some(prevencion_id) = request.prevencion_id {
            update_data.insert("prevencion_id".to_string(), json!(prevencion_id));
        }

        if update_data.is_empty() {
            return Err(PatientError::Validation(
                "No se proporcionaron campos para actualizar".to_string(),
            ));
        }

        let path = format!("/rest/v1/paciente?id=eq.{}", patient_id);
        let updated: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &path,
                Some(Value::Object(update_data)),
                Some(representation_headers()),
            )
            .await?;

        updated
            .into_iter()
            .next()
            .ok_or_else(|| PatientError::Database("No se pudo actualizar el paciente".to_string()))
    }

    pub async fn delete_patient(&self, patient_id: i64) -> Result<(), PatientError> {
        let exists_path = format!("/rest/v1/paciente?id=eq.{}&select=id", patient_id);
        let existing: Vec<Value> = self.supabase.request(Method::GET, &exists_path, None).await?;
        if existing.is_empty() {
            return Err(PatientError::NotFound);
        }

        let path = format!("/rest/v1/paciente?id=eq.{}", patient_id);
        let _: Vec<Value> = self
            .supabase
            .request_with_headers(Method::DELETE, &path, None, Some(representation_headers()))
            .await?;
        Ok(())
    }

    pub async fn list_patients(&self) -> Result<Vec<Value>, PatientError> {
        let path = "/rest/v1/paciente?select=*,prevencion(id,nombre)&order=id.asc";
        let patients: Vec<Value> = self.supabase.request(Method::GET, path, None).await?;
        Ok(patients)
    }

    pub async fn list_prevenciones(&self) -> Result<Vec<Value>, PatientError> {
        let path = "/rest/v1/prevencion?select=*&order=nombre.asc";
        let prevenciones: Vec<Value> = self.supabase.request(Method::GET, path, None).await?;
        Ok(prevenciones)
    }

    pub async fn create_prevencion(
        &self,
        request: CreatePrevencionRequest,
    ) -> Result<Value, PatientError> {
        let dup_path = format!(
            "/rest/v1/prevencion?nombre=eq.{}&select=id",
            urlencoding::encode(&request.nombre)
        );
        let existing: Vec<Value> = self.supabase.request(Method::GET, &dup_path, None).await?;
        if !existing.is_empty() {
            return Err(PatientError::DuplicatePrevencion(request.nombre));
        }

        let created: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/prevencion",
                Some(json!({
                    "nombre": request.nombre,
                    "descuento": request.descuento,
                })),
                Some(representation_headers()),
            )
            .await?;

        created
            .into_iter()
            .next()
            .ok_or_else(|| PatientError::Database("No se pudo crear la previsión".to_string()))
    }
}
