use std::collections::HashSet;

use chrono::NaiveDateTime;
use reqwest::Method;
use serde_json::Value;

use shared_config::AppConfig;
use shared_database::SupabaseClient;

use crate::models::{AvailabilityQuery, ScheduleBlock, ScheduleError};

const TS_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

pub struct AvailabilityService {
    supabase: SupabaseClient,
}

impl AvailabilityService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    /// Free blocks for a doctor in a date range: their schedule blocks minus
    /// the ones already holding a non-cancelled appointment.
    pub async fn available_blocks(
        &self,
        query: AvailabilityQuery,
    ) -> Result<Vec<ScheduleBlock>, ScheduleError> {
        let desde = format!("{}T00:00:00", query.fecha_inicio);
        let hasta = format!("{}T23:59:59", query.fecha_fin);

        if let Some(especialidad_id) = query.especialidad_id {
            let path = format!(
                "/rest/v1/especialidades_doctor?usuario_sistema_id=eq.{}&especialidad_id=eq.{}&select=id",
                query.doctor_id, especialidad_id
            );
            let rows: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;
            if rows.is_empty() {
                return Err(ScheduleError::Validation(
                    "El doctor no atiende la especialidad indicada.".to_string(),
                ));
            }
        }

        let blocks_path = format!(
            "/rest/v1/horarios_personal?usuario_sistema_id=eq.{}&inicio_bloque=lte.{}&finalizacion_bloque=gte.{}&select=id,inicio_bloque,finalizacion_bloque,usuario_sistema_id&order=inicio_bloque.asc",
            query.doctor_id, hasta, desde
        );
        let bloques: Vec<ScheduleBlock> = self
            .supabase
            .request(Method::GET, &blocks_path, None)
            .await?;

        let citas_path = format!(
            "/rest/v1/cita_medica?doctor_id=eq.{}&fecha_atencion=gte.{}&fecha_atencion=lte.{}&select=id,fecha_atencion,estado(estado)&order=id.asc&estado.order=id.asc",
            query.doctor_id, desde, hasta
        );
        let citas: Vec<Value> = self.supabase.request(Method::GET, &citas_path, None).await?;

        let ocupados = occupied_timestamps(&citas);
        Ok(filter_available(bloques, &ocupados))
    }
}

/// Timestamps of appointments still holding a slot. Status rows are
/// append-only, so the last embedded row is the current one; cancelled
/// appointments free their slot.
pub fn occupied_timestamps(citas: &[Value]) -> HashSet<NaiveDateTime> {
    citas
        .iter()
        .filter_map(|cita| {
            let fecha = cita["fecha_atencion"].as_str()?;
            let fecha = NaiveDateTime::parse_from_str(fecha, TS_FORMAT).ok()?;
            let actual = cita["estado"]
                .as_array()
                .and_then(|estados| estados.last())
                .and_then(|e| e["estado"].as_str());
            match actual {
                Some("Cancelada") => None,
                _ => Some(fecha),
            }
        })
        .collect()
}

/// Keeps blocks with no occupying appointment. A block is taken when an
/// occupied timestamp falls in `[inicio_bloque, finalizacion_bloque)`.
pub fn filter_available(
    bloques: Vec<ScheduleBlock>,
    ocupados: &HashSet<NaiveDateTime>,
) -> Vec<ScheduleBlock> {
    bloques
        .into_iter()
        .filter(|bloque| {
            !ocupados
                .iter()
                .any(|ts| *ts >= bloque.inicio_bloque && *ts < bloque.finalizacion_bloque)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ts(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, TS_FORMAT).unwrap()
    }

    fn bloque(id: i64, inicio: &str, fin: &str) -> ScheduleBlock {
        ScheduleBlock {
            id,
            inicio_bloque: ts(inicio),
            finalizacion_bloque: ts(fin),
            usuario_sistema_id: 2,
        }
    }

    #[test]
    fn cancelled_appointments_do_not_occupy() {
        let citas = vec![
            json!({
                "id": 1,
                "fecha_atencion": "2025-06-16T10:00:00",
                "estado": [{"estado": "Pendiente"}, {"estado": "Cancelada"}]
            }),
            json!({
                "id": 2,
                "fecha_atencion": "2025-06-16T11:00:00",
                "estado": [{"estado": "Pendiente"}, {"estado": "Confirmada"}]
            }),
        ];
        let ocupados = occupied_timestamps(&citas);
        assert!(!ocupados.contains(&ts("2025-06-16T10:00:00")));
        assert!(ocupados.contains(&ts("2025-06-16T11:00:00")));
    }

    #[test]
    fn appointment_without_status_rows_occupies() {
        let citas = vec![json!({
            "id": 3,
            "fecha_atencion": "2025-06-16T12:00:00",
            "estado": []
        })];
        let ocupados = occupied_timestamps(&citas);
        assert!(ocupados.contains(&ts("2025-06-16T12:00:00")));
    }

    #[test]
    fn block_is_taken_when_timestamp_falls_inside() {
        let bloques = vec![
            bloque(1, "2025-06-16T10:00:00", "2025-06-16T10:30:00"),
            bloque(2, "2025-06-16T10:30:00", "2025-06-16T11:00:00"),
        ];
        let ocupados: HashSet<_> = [ts("2025-06-16T10:00:00")].into_iter().collect();

        let libres = filter_available(bloques, &ocupados);
        assert_eq!(libres.len(), 1);
        assert_eq!(libres[0].id, 2);
    }

    #[test]
    fn block_end_is_exclusive() {
        let bloques = vec![bloque(1, "2025-06-16T10:00:00", "2025-06-16T10:30:00")];
        let ocupados: HashSet<_> = [ts("2025-06-16T10:30:00")].into_iter().collect();

        let libres = filter_available(bloques, &ocupados);
        assert_eq!(libres.len(), 1);
    }
}
