use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, warn};

use shared_config::AppConfig;
use shared_database::supabase::{representation_headers, SupabaseClient};
use shared_utils::time::day_bounds;

use crate::models::{
    AppointmentError, AppointmentListQuery, AppointmentStatus, CreateAppointmentRequest,
    UpdateAppointmentRequest,
};
use crate::services::status::{append_status, appointment_exists, current_status};

const TS_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

pub struct AppointmentService {
    supabase: SupabaseClient,
}

impl AppointmentService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    /// Books an appointment: validates patient, doctor, schedule coverage and
    /// slot availability, then inserts the appointment, its initial status
    /// and its consultation record. Later-insert failures trigger
    /// best-effort compensating deletes.
    pub async fn create_appointment(
        &self,
        request: CreateAppointmentRequest,
    ) -> Result<Value, AppointmentError> {
        let cita = &request.cita;
        debug!(
            "Booking appointment for patient {} with doctor {} at {}",
            cita.paciente_id, cita.doctor_id, cita.fecha_atencion
        );

        let estado_inicial = request.estado_inicial.as_deref().unwrap_or("Pendiente");
        if estado_inicial.parse::<AppointmentStatus>().is_err() {
            return Err(AppointmentError::InvalidStatus(
                AppointmentStatus::valid_values(),
            ));
        }

        let patient_path = format!(
            "/rest/v1/paciente?id=eq.{}&select=id,nombre,apellido_paterno",
            cita.paciente_id
        );
        let patients: Vec<Value> = self.supabase.request(Method::GET, &patient_path, None).await?;
        if patients.is_empty() {
            return Err(AppointmentError::PatientNotFound);
        }

        let doctor_path = format!(
            "/rest/v1/usuario_sistema?id=eq.{}&select=id,nombre,apellido_paterno,rol_id",
            cita.doctor_id
        );
        let doctors: Vec<Value> = self.supabase.request(Method::GET, &doctor_path, None).await?;
        let doctor = doctors.first().ok_or(AppointmentError::DoctorNotFound)?;
        if doctor["rol_id"].as_i64() != Some(2) {
            return Err(AppointmentError::NotADoctor);
        }

        let fecha = cita.fecha_atencion.format(TS_FORMAT).to_string();

        let blocks_path = format!(
            "/rest/v1/horarios_personal?usuario_sistema_id=eq.{}&inicio_bloque=lte.{}&finalizacion_bloque=gte.{}&select=id,inicio_bloque,finalizacion_bloque",
            cita.doctor_id, fecha, fecha
        );
        let blocks: Vec<Value> = self.supabase.request(Method::GET, &blocks_path, None).await?;
        if blocks.is_empty() {
            return Err(AppointmentError::NoScheduleBlock);
        }

        let conflict_path = format!(
            "/rest/v1/cita_medica?doctor_id=eq.{}&fecha_atencion=eq.{}&select=id",
            cita.doctor_id, fecha
        );
        let conflicting: Vec<Value> = self
            .supabase
            .request(Method::GET, &conflict_path, None)
            .await?;
        for existing in &conflicting {
            if let Some(id) = existing["id"].as_i64() {
                let status = current_status(&self.supabase, id).await?;
                if status.as_deref() != Some("Cancelada") {
                    return Err(AppointmentError::SlotTaken);
                }
            }
        }

        let created: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/cita_medica",
                Some(json!({
                    "fecha_atencion": fecha,
                    "paciente_id": cita.paciente_id,
                    "doctor_id": cita.doctor_id
                })),
                Some(representation_headers()),
            )
            .await?;
        let nueva_cita = created
            .into_iter()
            .next()
            .ok_or_else(|| AppointmentError::Database("No se pudo crear la cita.".to_string()))?;
        let cita_id = nueva_cita["id"].as_i64().ok_or_else(|| {
            AppointmentError::Database("La cita creada no tiene id.".to_string())
        })?;

        let estado = match append_status(&self.supabase, cita_id, estado_inicial).await {
            Ok(estado) => estado,
            Err(err) => {
                self.rollback_appointment(cita_id, None).await;
                return Err(AppointmentError::Database(err.to_string()));
            }
        };

        let info = &request.informacion;
        let info_result: Result<Vec<Value>, _> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/informacion_cita",
                Some(json!({
                    "cita_medica_id": cita_id,
                    "motivo_consulta": info.motivo_consulta,
                    "antecedentes": info.antecedentes,
                    "dolores_sintomas": info.dolores_sintomas,
                    "atenciones_quirurgicas": info.atenciones_quirurgicas,
                    "evaluacion_doctor": info.evaluacion_doctor,
                    "tratamiento": info.tratamiento,
                    "diagnostico_id": info.diagnostico_id
                })),
                Some(representation_headers()),
            )
            .await;

        let informacion = match info_result {
            Ok(rows) if !rows.is_empty() => rows.into_iter().next().unwrap_or(Value::Null),
            Ok(_) | Err(_) => {
                self.rollback_appointment(cita_id, estado["id"].as_i64()).await;
                return Err(AppointmentError::Database(
                    "No se pudo crear la información de la cita.".to_string(),
                ));
            }
        };

        Ok(json!({
            "mensaje": "Cita creada exitosamente.",
            "cita": nueva_cita,
            "estado": estado,
            "informacion": informacion
        }))
    }

    /// Compensating deletes for a partially created booking. Failures are
    /// logged and swallowed; there is no transaction to lean on.
    async fn rollback_appointment(&self, cita_id: i64, estado_id: Option<i64>) {
        if let Some(estado_id) = estado_id {
            let path = format!("/rest/v1/estado?id=eq.{}", estado_id);
            if let Err(err) = self
                .supabase
                .request_with_headers::<Vec<Value>>(
                    Method::DELETE,
                    &path,
                    None,
                    Some(representation_headers()),
                )
                .await
            {
                warn!("Rollback of estado {} failed: {}", estado_id, err);
            }
        }
        let path = format!("/rest/v1/cita_medica?id=eq.{}", cita_id);
        if let Err(err) = self
            .supabase
            .request_with_headers::<Vec<Value>>(
                Method::DELETE,
                &path,
                None,
                Some(representation_headers()),
            )
            .await
        {
            warn!("Rollback of cita {} failed: {}", cita_id, err);
        }
    }

    pub async fn list_appointments(
        &self,
        query: AppointmentListQuery,
    ) -> Result<Vec<Value>, AppointmentError> {
        let mut filters = vec![
            "select=id,fecha_atencion,paciente:paciente_id(id,nombre,apellido_paterno,apellido_materno,celular,rut),doctor:doctor_id(id,nombre,apellido_paterno,apellido_materno)".to_string(),
        ];
        if let Some(fecha) = query.fecha.as_deref().and_then(parse_date) {
            let (start, end) = day_bounds(fecha);
            filters.push(format!("fecha_atencion=gte.{}", start));
            filters.push(format!("fecha_atencion=lte.{}", end));
        }
        if let Some(doctor_id) = query.doctor_id {
            filters.push(format!("doctor_id=eq.{}", doctor_id));
        }
        filters.push("order=fecha_atencion.asc".to_string());

        let path = format!("/rest/v1/cita_medica?{}", filters.join("&"));
        let citas: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;

        let mut result = Vec::with_capacity(citas.len());
        for mut cita in citas {
            let id = cita["id"].as_i64().unwrap_or_default();
            let estado = current_status(&self.supabase, id)
                .await?
                .unwrap_or_else(|| "Sin estado".to_string());

            if let Some(wanted) = &query.estado {
                if &estado != wanted {
                    continue;
                }
            }
            cita["estado_actual"] = json!(estado);
            result.push(cita);
        }

        Ok(result)
    }

    pub async fn get_appointment(&self, cita_id: i64) -> Result<Value, AppointmentError> {
        let path = format!(
            "/rest/v1/cita_medica?id=eq.{}&select=id,fecha_atencion,paciente:paciente_id(id,nombre,apellido_paterno,apellido_materno,celular,rut,email),doctor:doctor_id(id,nombre,apellido_paterno,apellido_materno)",
            cita_id
        );
        let citas: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;
        let cita = citas
            .into_iter()
            .next()
            .ok_or(AppointmentError::AppointmentNotFound)?;

        let estado = current_status(&self.supabase, cita_id)
            .await?
            .unwrap_or_else(|| "Sin estado".to_string());

        let info_path = format!(
            "/rest/v1/informacion_cita?cita_medica_id=eq.{}&select=*",
            cita_id
        );
        let info: Vec<Value> = self.supabase.request(Method::GET, &info_path, None).await?;

        Ok(json!({
            "cita": cita,
            "estado_actual": estado,
            "informacion": info.into_iter().next()
        }))
    }

    pub async fn full_detail(&self, cita_id: i64) -> Result<Value, AppointmentError> {
        let path = format!(
            "/rest/v1/cita_medica?id=eq.{}&select=id,fecha_atencion,doctor_id,paciente:paciente_id(*),doctor:doctor_id(id,nombre,apellido_paterno,apellido_materno,rut)",
            cita_id
        );
        let citas: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;
        let cita = citas
            .into_iter()
            .next()
            .ok_or(AppointmentError::AppointmentNotFound)?;

        let estado = current_status(&self.supabase, cita_id)
            .await?
            .unwrap_or_else(|| "Sin estado".to_string());

        let info_path = format!(
            "/rest/v1/informacion_cita?cita_medica_id=eq.{}&select=*",
            cita_id
        );
        let info: Vec<Value> = self.supabase.request(Method::GET, &info_path, None).await?;
        let informacion = info.into_iter().next();

        let recetas: Vec<Value> = match informacion.as_ref().and_then(|i| i["id"].as_i64()) {
            Some(info_id) => {
                let recetas_path =
                    format!("/rest/v1/receta?informacion_cita_id=eq.{}&select=*", info_id);
                self.supabase.request(Method::GET, &recetas_path, None).await?
            }
            None => vec![],
        };

        Ok(json!({
            "cita": cita,
            "estado_actual": estado,
            "informacion_consulta": informacion,
            "recetas": recetas
        }))
    }

    pub async fn update_appointment(
        &self,
        cita_id: i64,
        request: UpdateAppointmentRequest,
    ) -> Result<Value, AppointmentError> {
        if !appointment_exists(&self.supabase, cita_id).await? {
            return Err(AppointmentError::AppointmentNotFound);
        }

        let mut update_data = serde_json::Map::new();
        if let Some(fecha) = request.fecha_atencion {
            update_data.insert(
                "fecha_atencion".to_string(),
                json!(fecha.format(TS_FORMAT).to_string()),
            );
        }
        if let Some(paciente_id) = request.paciente_id {
            let path = format!("/rest/v1/paciente?id=eq.{}&select=id", paciente_id);
            let rows: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;
            if rows.is_empty() {
                return Err(AppointmentError::PatientNotFound);
            }
            update_data.insert("paciente_id".to_string(), json!(paciente_id));
        }
        if let Some(doctor_id) = request.doctor_id {
            let path = format!("/rest/v1/usuario_sistema?id=eq.{}&select=id", doctor_id);
            let rows: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;
            if rows.is_empty() {
                return Err(AppointmentError::DoctorNotFound);
            }
            update_data.insert("doctor_id".to_string(), json!(doctor_id));
        }

        if update_data.is_empty() {
            return Err(AppointmentError::Validation(
                "No hay datos para actualizar.".to_string(),
            ));
        }

        let path = format!("/rest/v1/cita_medica?id=eq.{}", cita_id);
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
            .ok_or_else(|| AppointmentError::Database("No se pudo actualizar la cita.".to_string()))
    }

    /// Appends a new status row after validating against the closed set.
    pub async fn change_status(
        &self,
        cita_id: i64,
        estado: &str,
    ) -> Result<Value, AppointmentError> {
        if !appointment_exists(&self.supabase, cita_id).await? {
            return Err(AppointmentError::AppointmentNotFound);
        }
        if estado.parse::<AppointmentStatus>().is_err() {
            return Err(AppointmentError::InvalidStatus(
                AppointmentStatus::valid_values(),
            ));
        }

        let nuevo = append_status(&self.supabase, cita_id, estado)
            .await
            .map_err(|e| AppointmentError::Database(e.to_string()))?;
        Ok(nuevo)
    }

    pub async fn status_history(&self, cita_id: i64) -> Result<Vec<Value>, AppointmentError> {
        if !appointment_exists(&self.supabase, cita_id).await? {
            return Err(AppointmentError::AppointmentNotFound);
        }

        let path = format!(
            "/rest/v1/estado?cita_medica_id=eq.{}&select=*&order=id.asc",
            cita_id
        );
        let historial: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;
        Ok(historial)
    }

    /// Cancellation appends a `Cancelada` row; the appointment itself is
    /// never deleted.
    pub async fn cancel_appointment(&self, cita_id: i64) -> Result<Value, AppointmentError> {
        if !appointment_exists(&self.supabase, cita_id).await? {
            return Err(AppointmentError::AppointmentNotFound);
        }

        let estado = append_status(&self.supabase, cita_id, "Cancelada")
            .await
            .map_err(|e| AppointmentError::Database(e.to_string()))?;
        Ok(estado)
    }
}

pub(crate) fn parse_date(s: &str) -> Option<chrono::NaiveDate> {
    chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}
