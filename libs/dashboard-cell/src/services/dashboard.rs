use chrono::{Duration, NaiveDate, NaiveDateTime, Utc};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::warn;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_utils::time::{day_bounds, month_bounds};

use crate::models::{DashboardError, RecentAppointmentsQuery};

const MAX_RECENT: u64 = 20;

pub struct DashboardService {
    supabase: SupabaseClient,
}

impl DashboardService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    /// Admin dashboard headline numbers. Prefers the server-side
    /// aggregation function; falls back to direct queries when the
    /// function is not installed.
    pub async fn stats(&self) -> Result<Value, DashboardError> {
        match self
            .supabase
            .rpc::<Value>("dashboard_estadisticas", json!({}))
            .await
        {
            Ok(estadisticas) if estadisticas.is_object() => {
                Ok(json!({ "estadisticas": estadisticas }))
            }
            Ok(_) => self.stats_fallback().await,
            Err(err) => {
                warn!("dashboard_estadisticas RPC unavailable, aggregating client-side: {}", err);
                self.stats_fallback().await
            }
        }
    }

    async fn stats_fallback(&self) -> Result<Value, DashboardError> {
        let hoy = Utc::now().date_naive();

        let (_, total_pacientes): (Vec<Value>, u64) = self
            .supabase
            .request_with_total("/rest/v1/paciente?select=id&limit=1")
            .await?;

        let citas_hoy = self.appointment_count(hoy).await?;

        let (_, doctores_activos): (Vec<Value>, u64) = self
            .supabase
            .request_with_total("/rest/v1/usuario_sistema?rol_id=eq.2&select=id&limit=1")
            .await?;

        let (inicio_mes, fin_mes) = month_bounds(hoy);
        let ingresos_mes = self.income_between(inicio_mes, fin_mes).await?;

        let mes_anterior = inicio_mes - Duration::days(1);
        let (inicio_anterior, fin_anterior) = month_bounds(mes_anterior);
        let ingresos_mes_anterior = self.income_between(inicio_anterior, fin_anterior).await?;

        let citas_dia_anterior = self.appointment_count(hoy - Duration::days(30)).await?;

        let cambio_citas = percent_change(citas_hoy as f64, citas_dia_anterior as f64);
        let cambio_ingresos = percent_change(ingresos_mes, ingresos_mes_anterior);

        Ok(json!({
            "estadisticas": {
                "total_pacientes": total_pacientes,
                "citas_hoy": citas_hoy,
                "cambio_citas": cambio_citas,
                "doctores_activos": doctores_activos,
                "ingresos_mes": ingresos_mes,
                "cambio_ingresos": cambio_ingresos
            }
        }))
    }

    async fn appointment_count(&self, fecha: NaiveDate) -> Result<u64, DashboardError> {
        let (inicio, fin) = day_bounds(fecha);
        let path = format!(
            "/rest/v1/cita_medica?fecha_atencion=gte.{}&fecha_atencion=lte.{}&select=id&limit=1",
            inicio, fin
        );
        let (_, total): (Vec<Value>, u64) = self.supabase.request_with_total(&path).await?;
        Ok(total)
    }

    async fn income_between(
        &self,
        desde: NaiveDate,
        hasta: NaiveDate,
    ) -> Result<f64, DashboardError> {
        let path = format!(
            "/rest/v1/pagos?fecha_pago=gte.{}T00:00:00&fecha_pago=lte.{}T23:59:59&select=total",
            desde.format("%Y-%m-%d"),
            hasta.format("%Y-%m-%d")
        );
        let pagos: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;
        Ok(pagos.iter().filter_map(|p| p["total"].as_f64()).sum())
    }

    /// Upcoming appointments with patient, doctor and current status,
    /// resolved through embeds in a single query.
    pub async fn recent_appointments(
        &self,
        query: RecentAppointmentsQuery,
    ) -> Result<Value, DashboardError> {
        let limite = query.limite.clamp(1, MAX_RECENT);
        let hoy = Utc::now().date_naive();

        let path = format!(
            "/rest/v1/cita_medica?fecha_atencion=gte.{}&select=id,fecha_atencion,paciente:paciente_id(nombre,apellido_paterno),doctor:doctor_id(nombre,apellido_paterno),estado(estado)&order=fecha_atencion.asc&estado.order=id.asc&limit={}",
            hoy.format("%Y-%m-%d"),
            limite
        );
        let citas: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;

        let formateadas: Vec<Value> = citas.iter().map(format_appointment).collect();
        Ok(json!({ "citas": formateadas }))
    }
}

fn percent_change(actual: f64, anterior: f64) -> String {
    if anterior <= 0.0 {
        return "+0.0%".to_string();
    }
    let cambio = (actual - anterior) / anterior * 100.0;
    if cambio >= 0.0 {
        format!("+{:.1}%", cambio)
    } else {
        format!("{:.1}%", cambio)
    }
}

fn format_appointment(cita: &Value) -> Value {
    let paciente = short_name(&cita["paciente"]);
    let doctor = short_name(&cita["doctor"]);

    // The last status row reflects the appointment's current state.
    let estado = cita["estado"]
        .as_array()
        .and_then(|filas| filas.last())
        .and_then(|fila| fila["estado"].as_str())
        .unwrap_or("En espera");

    let hora = cita["fecha_atencion"]
        .as_str()
        .and_then(|f| {
            NaiveDateTime::parse_from_str(f.trim_end_matches('Z'), "%Y-%m-%dT%H:%M:%S").ok()
        })
        .map(|ts| ts.format("%I:%M %p").to_string())
        .unwrap_or_default();

    json!({
        "id": cita["id"],
        "patient": if paciente.is_empty() { "Paciente desconocido".to_string() } else { paciente },
        "doctor": if doctor.is_empty() { "Doctor desconocido".to_string() } else { format!("Dr. {}", doctor) },
        "time": hora,
        "status": estado
    })
}

fn short_name(persona: &Value) -> String {
    format!(
        "{} {}",
        persona["nombre"].as_str().unwrap_or_default(),
        persona["apellido_paterno"].as_str().unwrap_or_default()
    )
    .trim()
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_change_formats_sign() {
        assert_eq!(percent_change(12.0, 10.0), "+20.0%");
        assert_eq!(percent_change(8.0, 10.0), "-20.0%");
        assert_eq!(percent_change(5.0, 0.0), "+0.0%");
    }

    #[test]
    fn appointment_formatting_uses_last_status_row() {
        let cita = json!({
            "id": 4,
            "fecha_atencion": "2025-06-16T15:30:00",
            "paciente": {"nombre": "Ana", "apellido_paterno": "Reyes"},
            "doctor": {"nombre": "Pedro", "apellido_paterno": "Rojas"},
            "estado": [{"estado": "Pendiente"}, {"estado": "Confirmada"}]
        });

        let formateada = format_appointment(&cita);

        assert_eq!(formateada["patient"], "Ana Reyes");
        assert_eq!(formateada["doctor"], "Dr. Pedro Rojas");
        assert_eq!(formateada["time"], "03:30 PM");
        assert_eq!(formateada["status"], "Confirmada");
    }

    #[test]
    fn appointment_formatting_defaults_missing_fields() {
        let cita = json!({
            "id": 5,
            "fecha_atencion": "2025-06-16T09:00:00",
            "paciente": {},
            "doctor": {},
            "estado": []
        });

        let formateada = format_appointment(&cita);

        assert_eq!(formateada["patient"], "Paciente desconocido");
        assert_eq!(formateada["doctor"], "Doctor desconocido");
        assert_eq!(formateada["status"], "En espera");
    }
}
