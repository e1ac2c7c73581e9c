use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::debug;

use shared_config::AppConfig;
use shared_database::supabase::{representation_headers, SupabaseClient};
use shared_utils::time::clinic_local_to_utc;

use crate::models::{
    CreateBlockRequest, ScheduleError, ScheduleListQuery, UpdateBlockRequest, WeeklyScheduleRequest,
};

const TS_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

pub struct ScheduleService {
    supabase: SupabaseClient,
}

impl ScheduleService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    async fn ensure_doctor(&self, usuario_id: i64) -> Result<(), ScheduleError> {
        let path = format!(
            "/rest/v1/usuario_sistema?id=eq.{}&select=id,rol_id",
            usuario_id
        );
        let rows: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;
        let usuario = rows.first().ok_or(ScheduleError::UserNotFound)?;
        if usuario["rol_id"].as_i64() != Some(2) {
            return Err(ScheduleError::NotADoctor);
        }
        Ok(())
    }

    /// Any stored block whose range intersects `[inicio, fin]` counts as an
    /// overlap. `exclude_id` skips the block being edited.
    async fn has_overlap(
        &self,
        usuario_id: i64,
        inicio: NaiveDateTime,
        fin: NaiveDateTime,
        exclude_id: Option<i64>,
    ) -> Result<bool, ScheduleError> {
        let mut path = format!(
            "/rest/v1/horarios_personal?usuario_sistema_id=eq.{}&or=(and(inicio_bloque.lte.{},finalizacion_bloque.gte.{}))&select=id",
            usuario_id,
            fin.format(TS_FORMAT),
            inicio.format(TS_FORMAT)
        );
        if let Some(id) = exclude_id {
            path.push_str(&format!("&id=neq.{}", id));
        }
        let rows: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;
        Ok(!rows.is_empty())
    }

    pub async fn create_block(
        &self,
        request: CreateBlockRequest,
    ) -> Result<Value, ScheduleError> {
        if request.inicio_bloque >= request.finalizacion_bloque {
            return Err(ScheduleError::Validation(
                "El inicio del bloque debe ser anterior a su finalización.".to_string(),
            ));
        }
        self.ensure_doctor(request.usuario_sistema_id).await?;

        if self
            .has_overlap(
                request.usuario_sistema_id,
                request.inicio_bloque,
                request.finalizacion_bloque,
                None,
            )
            .await?
        {
            return Err(ScheduleError::Overlap);
        }

        let created: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/horarios_personal",
                Some(json!({
                    "inicio_bloque": request.inicio_bloque.format(TS_FORMAT).to_string(),
                    "finalizacion_bloque": request.finalizacion_bloque.format(TS_FORMAT).to_string(),
                    "usuario_sistema_id": request.usuario_sistema_id
                })),
                Some(representation_headers()),
            )
            .await?;

        created
            .into_iter()
            .next()
            .ok_or_else(|| ScheduleError::Database("No se pudo crear el horario.".to_string()))
    }

    /// Generates blocks for every matching weekday across the requested date
    /// range. Existing blocks are fetched once up front and overlapping
    /// candidates are skipped instead of failing the whole batch.
    pub async fn create_weekly(
        &self,
        request: WeeklyScheduleRequest,
    ) -> Result<Value, ScheduleError> {
        self.ensure_doctor(request.usuario_sistema_id).await?;

        let candidatos = weekly_blocks(&request)?;
        if candidatos.is_empty() {
            return Err(ScheduleError::Validation(
                "El rango de fechas no contiene el día de la semana indicado.".to_string(),
            ));
        }

        let range_start = candidatos
            .first()
            .map(|b| b.0)
            .unwrap_or_else(|| Utc::now().naive_utc());
        let range_end = candidatos
            .last()
            .map(|b| b.1)
            .unwrap_or_else(|| Utc::now().naive_utc());
        let existing_path = format!(
            "/rest/v1/horarios_personal?usuario_sistema_id=eq.{}&inicio_bloque=lte.{}&finalizacion_bloque=gte.{}&select=inicio_bloque,finalizacion_bloque",
            request.usuario_sistema_id,
            range_end.format(TS_FORMAT),
            range_start.format(TS_FORMAT)
        );
        let existing: Vec<Value> = self
            .supabase
            .request(Method::GET, &existing_path, None)
            .await?;
        let existing: Vec<(NaiveDateTime, NaiveDateTime)> = existing
            .iter()
            .filter_map(|row| {
                let inicio = parse_ts(row["inicio_bloque"].as_str()?)?;
                let fin = parse_ts(row["finalizacion_bloque"].as_str()?)?;
                Some((inicio, fin))
            })
            .collect();

        let mut creados = 0usize;
        let mut omitidos = 0usize;
        for (inicio, fin) in candidatos {
            if existing.iter().any(|(ei, ef)| *ei <= fin && *ef >= inicio) {
                omitidos += 1;
                continue;
            }
            debug!(
                "Creating weekly block {} - {} for user {}",
                inicio, fin, request.usuario_sistema_id
            );
            let _: Vec<Value> = self
                .supabase
                .request_with_headers(
                    Method::POST,
                    "/rest/v1/horarios_personal",
                    Some(json!({
                        "inicio_bloque": inicio.format(TS_FORMAT).to_string(),
                        "finalizacion_bloque": fin.format(TS_FORMAT).to_string(),
                        "usuario_sistema_id": request.usuario_sistema_id
                    })),
                    Some(representation_headers()),
                )
                .await?;
            creados += 1;
        }

        Ok(json!({
            "mensaje": "Horario semanal generado exitosamente.",
            "bloques_creados": creados,
            "bloques_omitidos": omitidos
        }))
    }

    pub async fn list_blocks(
        &self,
        query: ScheduleListQuery,
    ) -> Result<Vec<Value>, ScheduleError> {
        let mut filters = vec![
            "select=id,inicio_bloque,finalizacion_bloque,usuario_sistema_id,usuario:usuario_sistema_id(id,nombre,apellido_paterno)".to_string(),
        ];
        if let Some(usuario_id) = query.usuario_sistema_id {
            filters.push(format!("usuario_sistema_id=eq.{}", usuario_id));
        }
        if let Some(fecha) = &query.fecha_inicio {
            filters.push(format!("inicio_bloque=gte.{}T00:00:00", fecha));
        }
        if let Some(fecha) = &query.fecha_fin {
            filters.push(format!("finalizacion_bloque=lte.{}T23:59:59", fecha));
        }
        filters.push("order=inicio_bloque.asc".to_string());

        let path = format!("/rest/v1/horarios_personal?{}", filters.join("&"));
        let horarios: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;
        Ok(horarios)
    }

    pub async fn get_block(&self, horario_id: i64) -> Result<Value, ScheduleError> {
        let path = format!(
            "/rest/v1/horarios_personal?id=eq.{}&select=*",
            horario_id
        );
        let rows: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;
        rows.into_iter().next().ok_or(ScheduleError::BlockNotFound)
    }

    pub async fn update_block(
        &self,
        horario_id: i64,
        request: UpdateBlockRequest,
    ) -> Result<Value, ScheduleError> {
        if request.inicio_bloque >= request.finalizacion_bloque {
            return Err(ScheduleError::Validation(
                "El inicio del bloque debe ser anterior a su finalización.".to_string(),
            ));
        }

        let actual = self.get_block(horario_id).await?;
        let usuario_id = actual["usuario_sistema_id"]
            .as_i64()
            .ok_or_else(|| ScheduleError::Database("Horario sin usuario asociado.".to_string()))?;

        if self
            .has_overlap(
                usuario_id,
                request.inicio_bloque,
                request.finalizacion_bloque,
                Some(horario_id),
            )
            .await?
        {
            return Err(ScheduleError::Overlap);
        }

        let path = format!("/rest/v1/horarios_personal?id=eq.{}", horario_id);
        let updated: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &path,
                Some(json!({
                    "inicio_bloque": request.inicio_bloque.format(TS_FORMAT).to_string(),
                    "finalizacion_bloque": request.finalizacion_bloque.format(TS_FORMAT).to_string()
                })),
                Some(representation_headers()),
            )
            .await?;

        updated
            .into_iter()
            .next()
            .ok_or_else(|| ScheduleError::Database("No se pudo actualizar el horario.".to_string()))
    }

    pub async fn delete_block(&self, horario_id: i64) -> Result<(), ScheduleError> {
        self.get_block(horario_id).await?;

        let path = format!("/rest/v1/horarios_personal?id=eq.{}", horario_id);
        let _: Vec<Value> = self
            .supabase
            .request_with_headers(Method::DELETE, &path, None, Some(representation_headers()))
            .await?;
        Ok(())
    }

    /// Deletes a doctor's blocks in a date range. Without an explicit start
    /// the range begins now, so past blocks are preserved.
    pub async fn delete_doctor_blocks(
        &self,
        usuario_id: i64,
        fecha_inicio: Option<&str>,
        fecha_fin: Option<&str>,
    ) -> Result<usize, ScheduleError> {
        self.ensure_doctor(usuario_id).await?;

        let desde = match fecha_inicio {
            Some(fecha) => format!("{}T00:00:00", fecha),
            None => Utc::now().naive_utc().format(TS_FORMAT).to_string(),
        };

        let mut path = format!(
            "/rest/v1/horarios_personal?usuario_sistema_id=eq.{}&inicio_bloque=gte.{}",
            usuario_id, desde
        );
        if let Some(fecha) = fecha_fin {
            path.push_str(&format!("&inicio_bloque=lte.{}T23:59:59", fecha));
        }

        let deleted: Vec<Value> = self
            .supabase
            .request_with_headers(Method::DELETE, &path, None, Some(representation_headers()))
            .await?;
        Ok(deleted.len())
    }

    pub async fn doctors_with_schedules(&self) -> Result<Vec<Value>, ScheduleError> {
        let horarios: Vec<Value> = self
            .supabase
            .request(
                Method::GET,
                "/rest/v1/horarios_personal?select=usuario_sistema_id",
                None,
            )
            .await?;

        let mut ids: Vec<i64> = horarios
            .iter()
            .filter_map(|row| row["usuario_sistema_id"].as_i64())
            .collect();
        ids.sort_unstable();
        ids.dedup();
        if ids.is_empty() {
            return Ok(vec![]);
        }

        let id_list = ids
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(",");
        let path = format!(
            "/rest/v1/usuario_sistema?id=in.({})&rol_id=eq.2&select=id,nombre,apellido_paterno,apellido_materno",
            id_list
        );
        let doctores: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;
        Ok(doctores)
    }
}

fn parse_ts(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, TS_FORMAT).ok()
}

/// Expands a weekly request into concrete UTC blocks. Times in the request
/// are clinic-local; the default range is 90 days from `fecha_inicio`.
pub(crate) fn weekly_blocks(
    request: &WeeklyScheduleRequest,
) -> Result<Vec<(NaiveDateTime, NaiveDateTime)>, ScheduleError> {
    if request.dia_semana > 6 {
        return Err(ScheduleError::Validation(
            "dia_semana debe estar entre 0 (lunes) y 6 (domingo).".to_string(),
        ));
    }
    if request.duracion_bloque_minutos <= 0 {
        return Err(ScheduleError::Validation(
            "La duración del bloque debe ser positiva.".to_string(),
        ));
    }

    let hora_inicio = NaiveTime::parse_from_str(&request.hora_inicio, "%H:%M")
        .map_err(|_| ScheduleError::Validation("hora_inicio debe tener formato HH:MM.".to_string()))?;
    let hora_fin = NaiveTime::parse_from_str(&request.hora_fin, "%H:%M")
        .map_err(|_| ScheduleError::Validation("hora_fin debe tener formato HH:MM.".to_string()))?;
    if hora_inicio >= hora_fin {
        return Err(ScheduleError::Validation(
            "hora_inicio debe ser anterior a hora_fin.".to_string(),
        ));
    }

    let fecha_inicio = NaiveDate::parse_from_str(&request.fecha_inicio, "%Y-%m-%d")
        .map_err(|_| ScheduleError::Validation("fecha_inicio debe tener formato YYYY-MM-DD.".to_string()))?;
    let fecha_fin = match &request.fecha_fin {
        Some(fecha) => NaiveDate::parse_from_str(fecha, "%Y-%m-%d").map_err(|_| {
            ScheduleError::Validation("fecha_fin debe tener formato YYYY-MM-DD.".to_string())
        })?,
        None => fecha_inicio + Duration::days(90),
    };
    if fecha_fin < fecha_inicio {
        return Err(ScheduleError::Validation(
            "fecha_fin debe ser posterior a fecha_inicio.".to_string(),
        ));
    }

    let paso = Duration::minutes(request.duracion_bloque_minutos);
    let mut bloques = Vec::new();
    let mut dia = fecha_inicio;
    while dia <= fecha_fin {
        if dia.weekday().num_days_from_monday() == u32::from(request.dia_semana) {
            // Full datetimes: NaiveTime addition wraps at midnight, which
            // would never reach hora_fin for steps that cross the day end.
            let fin_dia = dia.and_time(hora_fin);
            let mut cursor = dia.and_time(hora_inicio);
            while cursor + paso <= fin_dia {
                let fin_local = cursor + paso;
                let inicio = clinic_local_to_utc(dia, cursor.time()).naive_utc();
                let fin = clinic_local_to_utc(fin_local.date(), fin_local.time()).naive_utc();
                bloques.push((inicio, fin));
                cursor = fin_local;
            }
        }
        dia += Duration::days(1);
    }

    Ok(bloques)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_request() -> WeeklyScheduleRequest {
        WeeklyScheduleRequest {
            usuario_sistema_id: 2,
            dia_semana: 0,
            hora_inicio: "09:00".to_string(),
            hora_fin: "11:00".to_string(),
            duracion_bloque_minutos: 30,
            fecha_inicio: "2025-06-16".to_string(),
            fecha_fin: Some("2025-06-22".to_string()),
        }
    }

    #[test]
    fn weekly_blocks_cover_one_monday() {
        let bloques = weekly_blocks(&base_request()).unwrap();
        // 2025-06-16 is a Monday; 09:00-11:00 in 30-minute steps.
        assert_eq!(bloques.len(), 4);
        // Stored in UTC, three hours ahead of clinic time.
        assert_eq!(bloques[0].0.to_string(), "2025-06-16 12:00:00");
        assert_eq!(bloques[3].1.to_string(), "2025-06-16 14:00:00");
    }

    #[test]
    fn weekly_blocks_span_multiple_weeks() {
        let mut request = base_request();
        request.fecha_fin = Some("2025-06-29".to_string());
        let bloques = weekly_blocks(&request).unwrap();
        assert_eq!(bloques.len(), 8);
    }

    #[test]
    fn weekly_blocks_drop_partial_trailing_block() {
        let mut request = base_request();
        request.hora_fin = "10:45".to_string();
        let bloques = weekly_blocks(&request).unwrap();
        assert_eq!(bloques.len(), 3);
    }

    #[test]
    fn weekly_blocks_stop_at_day_end_with_large_steps() {
        let mut request = base_request();
        request.hora_inicio = "09:00".to_string();
        request.hora_fin = "23:00".to_string();
        request.duracion_bloque_minutos = 180;
        let bloques = weekly_blocks(&request).unwrap();
        // 09-12, 12-15, 15-18, 18-21; 21:00 + 180min crosses midnight and
        // must be dropped, not wrapped back into the same day.
        assert_eq!(bloques.len(), 4);
        assert_eq!(bloques[3].1.to_string(), "2025-06-17 00:00:00");
    }

    #[test]
    fn weekly_blocks_reject_bad_weekday() {
        let mut request = base_request();
        request.dia_semana = 7;
        assert!(matches!(
            weekly_blocks(&request),
            Err(ScheduleError::Validation(_))
        ));
    }

    #[test]
    fn weekly_blocks_reject_inverted_hours() {
        let mut request = base_request();
        request.hora_inicio = "12:00".to_string();
        assert!(matches!(
            weekly_blocks(&request),
            Err(ScheduleError::Validation(_))
        ));
    }

    #[test]
    fn weekly_blocks_default_to_ninety_days() {
        let mut request = base_request();
        request.fecha_fin = None;
        let bloques = weekly_blocks(&request).unwrap();
        // 90 days from 2025-06-16 contain 13 Mondays.
        assert_eq!(bloques.len(), 13 * 4);
    }
}
