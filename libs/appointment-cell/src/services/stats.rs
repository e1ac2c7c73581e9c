use std::collections::HashSet;

use chrono::Utc;
use reqwest::Method;
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_utils::time::{day_bounds, month_bounds};

use crate::models::{AppointmentError, DoctorAgendaQuery};
use crate::services::booking::parse_date;
use crate::services::status::current_status;

pub struct StatsService {
    supabase: SupabaseClient,
}

impl StatsService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    /// Appointment totals bucketed by current status, optionally restricted
    /// to one day.
    pub async fn appointment_stats(&self, fecha: Option<&str>) -> Result<Value, AppointmentError> {
        let mut path = "/rest/v1/cita_medica?select=id".to_string();
        if let Some(fecha) = fecha.and_then(parse_date) {
            let (start, end) = day_bounds(fecha);
            path.push_str(&format!(
                "&fecha_atencion=gte.{}&fecha_atencion=lte.{}",
                start, end
            ));
        }

        let citas: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;

        let mut confirmadas = 0;
        let mut pendientes = 0;
        let mut en_consulta = 0;
        let mut completadas = 0;
        let mut canceladas = 0;

        for cita in &citas {
            let Some(id) = cita["id"].as_i64() else { continue };
            match current_status(&self.supabase, id).await?.as_deref() {
                Some("Confirmada") => confirmadas += 1,
                Some("Pendiente") => pendientes += 1,
                Some("En Consulta") => en_consulta += 1,
                Some("Completada") => completadas += 1,
                Some("Cancelada") => canceladas += 1,
                _ => {}
            }
        }

        Ok(json!({
            "total": citas.len(),
            "confirmadas": confirmadas,
            "pendientes": pendientes,
            "en_consulta": en_consulta,
            "completadas": completadas,
            "canceladas": canceladas
        }))
    }

    /// A doctor's appointments for one day, enriched with current status and
    /// consultation motive, optionally filtered to a status list.
    pub async fn doctor_agenda(
        &self,
        doctor_id: i64,
        query: DoctorAgendaQuery,
    ) -> Result<Vec<Value>, AppointmentError> {
        let mut path = format!(
            "/rest/v1/cita_medica?doctor_id=eq.{}&select=id,fecha_atencion,paciente:paciente_id(*)",
            doctor_id
        );
        if let Some(fecha) = query.fecha.as_deref().and_then(parse_date) {
            let (start, end) = day_bounds(fecha);
            path.push_str(&format!(
                "&fecha_atencion=gte.{}&fecha_atencion=lte.{}",
                start, end
            ));
        }
        path.push_str("&order=fecha_atencion.asc");

        let citas: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;

        let wanted: Vec<&str> = query
            .estados
            .as_deref()
            .map(|s| s.split(',').map(str::trim).collect())
            .unwrap_or_default();

        let mut result = Vec::new();
        for mut cita in citas {
            let Some(id) = cita["id"].as_i64() else { continue };
            let estado = current_status(&self.supabase, id)
                .await?
                .unwrap_or_else(|| "Sin estado".to_string());

            if !wanted.is_empty() && !wanted.contains(&estado.as_str()) {
                continue;
            }

            let info_path = format!(
                "/rest/v1/informacion_cita?cita_medica_id=eq.{}&select=motivo_consulta",
                id
            );
            let info: Vec<Value> = self.supabase.request(Method::GET, &info_path, None).await?;

            cita["estado_actual"] = json!(estado);
            cita["motivo_consulta"] = info
                .first()
                .map(|i| i["motivo_consulta"].clone())
                .unwrap_or(Value::Null);
            result.push(cita);
        }

        Ok(result)
    }

    /// Day counters for the doctor dashboard plus unique patients seen in
    /// the month of the reference date.
    pub async fn doctor_stats(
        &self,
        doctor_id: i64,
        fecha: Option<&str>,
    ) -> Result<Value, AppointmentError> {
        let fecha_actual = fecha
            .and_then(parse_date)
            .unwrap_or_else(|| Utc::now().date_naive());
        let (day_start, day_end) = day_bounds(fecha_actual);

        let citas_path = format!(
            "/rest/v1/cita_medica?doctor_id=eq.{}&fecha_atencion=gte.{}&fecha_atencion=lte.{}&select=id",
            doctor_id, day_start, day_end
        );
        let citas_hoy: Vec<Value> = self.supabase.request(Method::GET, &citas_path, None).await?;

        let mut total_hoy = 0;
        let mut atendidos_hoy = 0;
        let mut pendientes_hoy = 0;
        let mut cancelados_hoy = 0;

        for cita in &citas_hoy {
            let Some(id) = cita["id"].as_i64() else { continue };
            if let Some(estado) = current_status(&self.supabase, id).await? {
                total_hoy += 1;
                match estado.as_str() {
                    "Completada" => atendidos_hoy += 1,
                    "Pendiente" | "Confirmada" | "En Consulta" => pendientes_hoy += 1,
                    "Cancelada" => cancelados_hoy += 1,
                    _ => {}
                }
            }
        }

        let (month_first, month_last) = month_bounds(fecha_actual);
        let (month_start, _) = day_bounds(month_first);
        let (_, month_end) = day_bounds(month_last);
        let mes_path = format!(
            "/rest/v1/cita_medica?doctor_id=eq.{}&fecha_atencion=gte.{}&fecha_atencion=lte.{}&select=paciente_id",
            doctor_id, month_start, month_end
        );
        let citas_mes: Vec<Value> = self.supabase.request(Method::GET, &mes_path, None).await?;

        let pacientes_unicos: HashSet<i64> = citas_mes
            .iter()
            .filter_map(|c| c["paciente_id"].as_i64())
            .collect();

        Ok(json!({
            "citas_hoy": total_hoy,
            "atendidos_hoy": atendidos_hoy,
            "pendientes_hoy": pendientes_hoy,
            "cancelados_hoy": cancelados_hoy,
            "total_pacientes_mes": pacientes_unicos.len()
        }))
    }

    /// The appointment currently in consultation for a doctor, if any.
    pub async fn current_in_consultation(
        &self,
        doctor_id: i64,
    ) -> Result<Option<i64>, AppointmentError> {
        let path = format!(
            "/rest/v1/cita_medica?doctor_id=eq.{}&select=id,fecha_atencion",
            doctor_id
        );
        let citas: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;

        for cita in &citas {
            let Some(id) = cita["id"].as_i64() else { continue };
            if current_status(&self.supabase, id).await?.as_deref() == Some("En Consulta") {
                return Ok(Some(id));
            }
        }
        Ok(None)
    }
}
