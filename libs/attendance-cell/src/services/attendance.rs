use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{NaiveDate, NaiveDateTime, Utc};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::debug;

use shared_config::AppConfig;
use shared_database::supabase::{representation_headers, SupabaseClient};
use shared_utils::time::day_bounds;

use crate::models::{AttendanceError, AttendanceStatus};
use crate::services::derivation::derive_shift_status;

pub(crate) const TS_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

pub(crate) fn parse_ts(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s.trim_end_matches('Z'), TS_FORMAT).ok()
}

pub(crate) fn parse_date(s: &str) -> Result<NaiveDate, AttendanceError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| AttendanceError::Validation("La fecha debe tener formato YYYY-MM-DD.".to_string()))
}

pub(crate) fn id_list(ids: &[i64]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

pub(crate) fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// A doctor's shift for one day, merged from consecutive schedule blocks.
struct DayShift {
    doctor: Value,
    primer_bloque_id: i64,
    inicio: String,
    fin: String,
    bloques: usize,
}

pub struct AttendanceService {
    supabase: SupabaseClient,
}

impl AttendanceService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    /// Daily attendance board: every doctor with scheduled blocks that day,
    /// with a derived state per shift. Related rows are fetched in bulk
    /// instead of per doctor.
    pub async fn daily_summary(&self, fecha: Option<&str>) -> Result<Value, AttendanceError> {
        let fecha_consulta = match fecha {
            Some(f) => parse_date(f)?,
            None => Utc::now().date_naive(),
        };
        let (inicio_dia, fin_dia) = day_bounds(fecha_consulta);

        let horarios_path = format!(
            "/rest/v1/horarios_personal?inicio_bloque=gte.{}&inicio_bloque=lte.{}&select=*,usuario:usuario_sistema_id(id,nombre,apellido_paterno,apellido_materno,rut,email,celular)&order=inicio_bloque.asc",
            inicio_dia, fin_dia
        );
        let horarios: Vec<Value> = self
            .supabase
            .request(Method::GET, &horarios_path, None)
            .await?;

        let mut turnos: BTreeMap<i64, DayShift> = BTreeMap::new();
        for horario in &horarios {
            let usuario = &horario["usuario"];
            let Some(doctor_id) = usuario["id"].as_i64() else {
                continue;
            };
            let inicio = horario["inicio_bloque"].as_str().unwrap_or_default();
            let fin = horario["finalizacion_bloque"].as_str().unwrap_or_default();
            match turnos.get_mut(&doctor_id) {
                Some(turno) => {
                    turno.fin = fin.to_string();
                    turno.bloques += 1;
                }
                None => {
                    turnos.insert(
                        doctor_id,
                        DayShift {
                            doctor: usuario.clone(),
                            primer_bloque_id: horario["id"].as_i64().unwrap_or_default(),
                            inicio: inicio.to_string(),
                            fin: fin.to_string(),
                            bloques: 1,
                        },
                    );
                }
            }
        }

        if turnos.is_empty() {
            return Ok(empty_summary(fecha_consulta));
        }

        let doctor_ids: Vec<i64> = turnos.keys().copied().collect();
        let ids = id_list(&doctor_ids);

        let asistencias_path = format!(
            "/rest/v1/asistencia?usuario_sistema_id=in.({})&inicio_turno=gte.{}&inicio_turno=lte.{}&select=*",
            ids, inicio_dia, fin_dia
        );
        let asistencias: Vec<Value> = self
            .supabase
            .request(Method::GET, &asistencias_path, None)
            .await?;
        let mut asistencias_por_doctor: HashMap<i64, &Value> = HashMap::new();
        for asistencia in &asistencias {
            if let Some(doctor_id) = asistencia["usuario_sistema_id"].as_i64() {
                asistencias_por_doctor.entry(doctor_id).or_insert(asistencia);
            }
        }

        let asistencia_ids: Vec<i64> = asistencias
            .iter()
            .filter_map(|a| a["id"].as_i64())
            .collect();
        let justificadas: HashSet<i64> = if asistencia_ids.is_empty() {
            HashSet::new()
        } else {
            let path = format!(
                "/rest/v1/asistencia_estados?asistencia_id=in.({})&estado=eq.JUSTIFICADO&select=asistencia_id",
                id_list(&asistencia_ids)
            );
            let rows: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;
            rows.iter()
                .filter_map(|r| r["asistencia_id"].as_i64())
                .collect()
        };

        let especialidades_path = format!(
            "/rest/v1/especialidades_doctor?usuario_sistema_id=in.({})&select=usuario_sistema_id,especialidad:especialidad_id(nombre)",
            ids
        );
        let especialidades_rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &especialidades_path, None)
            .await?;
        let mut especialidades: HashMap<i64, Vec<String>> = HashMap::new();
        for row in &especialidades_rows {
            if let (Some(doctor_id), Some(nombre)) = (
                row["usuario_sistema_id"].as_i64(),
                row["especialidad"]["nombre"].as_str(),
            ) {
                especialidades
                    .entry(doctor_id)
                    .or_default()
                    .push(nombre.to_string());
            }
        }

        let citas_path = format!(
            "/rest/v1/cita_medica?doctor_id=in.({})&fecha_atencion=gte.{}&fecha_atencion=lte.{}&select=doctor_id",
            ids, inicio_dia, fin_dia
        );
        let citas: Vec<Value> = self.supabase.request(Method::GET, &citas_path, None).await?;
        let mut pacientes_por_doctor: HashMap<i64, usize> = HashMap::new();
        for cita in &citas {
            if let Some(doctor_id) = cita["doctor_id"].as_i64() {
                *pacientes_por_doctor.entry(doctor_id).or_default() += 1;
            }
        }

        let ahora = Utc::now().naive_utc();
        let mut en_turno = 0usize;
        let mut asistieron = 0usize;
        let mut con_atraso = 0usize;
        let mut ausentes = 0usize;
        let mut justificados = 0usize;
        let mut detalle = Vec::with_capacity(turnos.len());

        for (doctor_id, turno) in &turnos {
            let asistencia = asistencias_por_doctor.get(doctor_id);
            let entrada = asistencia
                .and_then(|a| a["inicio_turno"].as_str())
                .and_then(parse_ts);
            let salida = asistencia
                .and_then(|a| a["finalizacion_turno"].as_str())
                .and_then(parse_ts);
            let justificado = asistencia
                .and_then(|a| a["id"].as_i64())
                .is_some_and(|id| justificadas.contains(&id));

            let inicio_prog = parse_ts(&turno.inicio).ok_or_else(|| {
                AttendanceError::Database("Bloque de horario con fecha inválida.".to_string())
            })?;
            let fin_prog = parse_ts(&turno.fin).ok_or_else(|| {
                AttendanceError::Database("Bloque de horario con fecha inválida.".to_string())
            })?;

            let derivado =
                derive_shift_status(inicio_prog, fin_prog, entrada, salida, justificado, ahora);
            match derivado.estado {
                AttendanceStatus::Programado | AttendanceStatus::EnTurno => en_turno += 1,
                AttendanceStatus::Asistio => asistieron += 1,
                AttendanceStatus::Atraso => con_atraso += 1,
                AttendanceStatus::Ausente => ausentes += 1,
                AttendanceStatus::Justificado => justificados += 1,
            }

            let doctor = &turno.doctor;
            let nombre_completo = format!(
                "{} {} {}",
                doctor["nombre"].as_str().unwrap_or_default(),
                doctor["apellido_paterno"].as_str().unwrap_or_default(),
                doctor["apellido_materno"].as_str().unwrap_or_default()
            )
            .trim()
            .to_string();

            detalle.push(json!({
                "id": asistencia.and_then(|a| a["id"].as_i64()).unwrap_or(turno.primer_bloque_id),
                "horario_id": turno.primer_bloque_id,
                "inicio_turno": turno.inicio,
                "finalizacion_turno": turno.fin,
                "doctor": {
                    "id": doctor_id,
                    "nombre": doctor["nombre"],
                    "apellido_paterno": doctor["apellido_paterno"],
                    "apellido_materno": doctor["apellido_materno"],
                    "nombre_completo": nombre_completo,
                    "rut": doctor["rut"],
                    "email": doctor["email"],
                    "celular": doctor["celular"],
                    "especialidades": especialidades.get(doctor_id).cloned().unwrap_or_default()
                },
                "estado_asistencia": derivado.estado.as_str(),
                "minutos_atraso": derivado.minutos_atraso,
                "minutos_trabajados": derivado.minutos_trabajados,
                "marca_entrada": entrada.map(|e| e.format(TS_FORMAT).to_string()),
                "marca_salida": salida.map(|s| s.format(TS_FORMAT).to_string()),
                "bloques": turno.bloques,
                "pacientes_agendados": pacientes_por_doctor.get(doctor_id).copied().unwrap_or(0)
            }));
        }

        Ok(json!({
            "fecha": fecha_consulta.format("%Y-%m-%d").to_string(),
            "total_turnos": detalle.len(),
            "en_turno": en_turno,
            "asistieron": asistieron,
            "con_atraso": con_atraso,
            "ausentes": ausentes,
            "justificados": justificados,
            "turnos": detalle
        }))
    }

    /// Administrative entry mark. Rejects a second open shift for the same
    /// user regardless of date.
    pub async fn register_entry(&self, usuario_id: i64) -> Result<Value, AttendanceError> {
        let path = format!(
            "/rest/v1/asistencia?usuario_sistema_id=eq.{}&finalizacion_turno=is.null&select=id",
            usuario_id
        );
        let abiertos: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;
        if !abiertos.is_empty() {
            return Err(AttendanceError::ActiveShift);
        }

        let ahora = Utc::now().naive_utc().format(TS_FORMAT).to_string();
        debug!("Registering shift entry for user {} at {}", usuario_id, ahora);
        let creados: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/asistencia",
                Some(json!({
                    "usuario_sistema_id": usuario_id,
                    "inicio_turno": ahora
                })),
                Some(representation_headers()),
            )
            .await?;

        creados.into_iter().next().ok_or_else(|| {
            AttendanceError::Database("No se pudo registrar la entrada.".to_string())
        })
    }

    /// Administrative exit mark on an existing attendance row.
    pub async fn register_exit(&self, asistencia_id: i64) -> Result<Value, AttendanceError> {
        let path = format!("/rest/v1/asistencia?id=eq.{}&select=*", asistencia_id);
        let registros: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;
        let registro = registros
            .into_iter()
            .next()
            .ok_or(AttendanceError::RecordNotFound)?;
        if !registro["finalizacion_turno"].is_null() {
            return Err(AttendanceError::ShiftFinished);
        }

        let ahora = Utc::now().naive_utc().format(TS_FORMAT).to_string();
        let update_path = format!("/rest/v1/asistencia?id=eq.{}", asistencia_id);
        let actualizados: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &update_path,
                Some(json!({ "finalizacion_turno": ahora })),
                Some(representation_headers()),
            )
            .await?;

        actualizados.into_iter().next().ok_or_else(|| {
            AttendanceError::Database("No se pudo registrar la salida.".to_string())
        })
    }

    /// Self-service view: the doctor's scheduled shift for the day plus
    /// their marks so far.
    pub async fn my_shift_today(
        &self,
        usuario_id: i64,
        fecha: Option<&str>,
    ) -> Result<Value, AttendanceError> {
        let fecha_consulta = match fecha {
            Some(f) => parse_date(f)?,
            None => Utc::now().date_naive(),
        };
        let (inicio_dia, fin_dia) = day_bounds(fecha_consulta);

        let horarios_path = format!(
            "/rest/v1/horarios_personal?usuario_sistema_id=eq.{}&inicio_bloque=gte.{}&inicio_bloque=lte.{}&select=*&order=inicio_bloque.asc",
            usuario_id, inicio_dia, fin_dia
        );
        let horarios: Vec<Value> = self
            .supabase
            .request(Method::GET, &horarios_path, None)
            .await?;
        if horarios.is_empty() {
            return Ok(json!({
                "tiene_turno": false,
                "mensaje": "No tienes turno programado para hoy"
            }));
        }

        let inicio_turno = horarios[0]["inicio_bloque"].clone();
        let fin_turno = horarios[horarios.len() - 1]["finalizacion_bloque"].clone();

        let asistencia_path = format!(
            "/rest/v1/asistencia?usuario_sistema_id=eq.{}&inicio_turno=gte.{}&inicio_turno=lte.{}&select=*",
            usuario_id, inicio_dia, fin_dia
        );
        let asistencias: Vec<Value> = self
            .supabase
            .request(Method::GET, &asistencia_path, None)
            .await?;
        let asistencia = asistencias.first();

        let ahora = Utc::now().naive_utc();
        let inicio_prog = inicio_turno.as_str().and_then(parse_ts);

        let (tiene_entrada, tiene_salida, minutos_atraso, horas_trabajadas) = match asistencia {
            Some(asistencia) => {
                let entrada = asistencia["inicio_turno"].as_str().and_then(parse_ts);
                let salida = asistencia["finalizacion_turno"].as_str().and_then(parse_ts);
                let atraso = match (entrada, inicio_prog) {
                    (Some(e), Some(p)) => ((e - p).num_minutes()).max(0),
                    _ => 0,
                };
                let horas = match (entrada, salida) {
                    (Some(e), Some(s)) => (s - e).num_seconds() as f64 / 3600.0,
                    (Some(e), None) => (ahora - e).num_seconds() as f64 / 3600.0,
                    _ => 0.0,
                };
                (true, salida.is_some(), atraso, horas)
            }
            None => (false, false, 0, 0.0),
        };

        Ok(json!({
            "tiene_turno": true,
            "turno_programado": {
                "inicio": inicio_turno,
                "fin": fin_turno,
                "total_bloques": horarios.len()
            },
            "asistencia": {
                "id": asistencia.and_then(|a| a["id"].as_i64()),
                "tiene_entrada": tiene_entrada,
                "tiene_salida": tiene_salida,
                "hora_entrada": asistencia.map(|a| a["inicio_turno"].clone()),
                "hora_salida": asistencia.map(|a| a["finalizacion_turno"].clone()),
                "minutos_atraso": minutos_atraso,
                "horas_trabajadas": round2(horas_trabajadas)
            },
            "puede_marcar_entrada": !tiene_entrada,
            "puede_marcar_salida": tiene_entrada && !tiene_salida
        }))
    }

    /// Self-service entry mark. Requires a scheduled shift today and no
    /// prior entry that day.
    pub async fn mark_entry(&self, usuario_id: i64) -> Result<Value, AttendanceError> {
        let hoy = Utc::now().date_naive();
        let (inicio_dia, fin_dia) = day_bounds(hoy);

        let horarios_path = format!(
            "/rest/v1/horarios_personal?usuario_sistema_id=eq.{}&inicio_bloque=gte.{}&inicio_bloque=lte.{}&select=id",
            usuario_id, inicio_dia, fin_dia
        );
        let horarios: Vec<Value> = self
            .supabase
            .request(Method::GET, &horarios_path, None)
            .await?;
        if horarios.is_empty() {
            return Err(AttendanceError::NoShiftToday);
        }

        let asistencia_path = format!(
            "/rest/v1/asistencia?usuario_sistema_id=eq.{}&inicio_turno=gte.{}&inicio_turno=lte.{}&select=id",
            usuario_id, inicio_dia, fin_dia
        );
        let asistencias: Vec<Value> = self
            .supabase
            .request(Method::GET, &asistencia_path, None)
            .await?;
        if !asistencias.is_empty() {
            return Err(AttendanceError::AlreadyMarkedEntry);
        }

        let ahora = Utc::now().naive_utc().format(TS_FORMAT).to_string();
        let creados: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/asistencia",
                Some(json!({
                    "usuario_sistema_id": usuario_id,
                    "inicio_turno": ahora,
                    "finalizacion_turno": null
                })),
                Some(representation_headers()),
            )
            .await?;
        let asistencia_id = creados
            .first()
            .and_then(|a| a["id"].as_i64())
            .ok_or_else(|| {
                AttendanceError::Database("No se pudo registrar la entrada.".to_string())
            })?;

        Ok(json!({
            "mensaje": "Entrada registrada exitosamente",
            "hora": ahora,
            "asistencia_id": asistencia_id
        }))
    }

    /// Self-service exit mark for today's open shift.
    pub async fn mark_exit(&self, usuario_id: i64) -> Result<Value, AttendanceError> {
        let hoy = Utc::now().date_naive();
        let (inicio_dia, fin_dia) = day_bounds(hoy);

        let asistencia_path = format!(
            "/rest/v1/asistencia?usuario_sistema_id=eq.{}&inicio_turno=gte.{}&inicio_turno=lte.{}&select=*",
            usuario_id, inicio_dia, fin_dia
        );
        let asistencias: Vec<Value> = self
            .supabase
            .request(Method::GET, &asistencia_path, None)
            .await?;
        let asistencia = asistencias.first().ok_or(AttendanceError::NoEntryToday)?;
        if !asistencia["finalizacion_turno"].is_null() {
            return Err(AttendanceError::AlreadyMarkedExit);
        }
        let asistencia_id = asistencia["id"].as_i64().ok_or_else(|| {
            AttendanceError::Database("Registro de asistencia sin id.".to_string())
        })?;

        let ahora = Utc::now().naive_utc();
        let update_path = format!("/rest/v1/asistencia?id=eq.{}", asistencia_id);
        let _: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &update_path,
                Some(json!({ "finalizacion_turno": ahora.format(TS_FORMAT).to_string() })),
                Some(representation_headers()),
            )
            .await?;

        let horas_trabajadas = asistencia["inicio_turno"]
            .as_str()
            .and_then(parse_ts)
            .map(|entrada| (ahora - entrada).num_seconds() as f64 / 3600.0)
            .unwrap_or(0.0);

        Ok(json!({
            "mensaje": "Salida registrada exitosamente",
            "hora": ahora.format(TS_FORMAT).to_string(),
            "horas_trabajadas": round2(horas_trabajadas)
        }))
    }
}

fn empty_summary(fecha: NaiveDate) -> Value {
    json!({
        "fecha": fecha.format("%Y-%m-%d").to_string(),
        "total_turnos": 0,
        "en_turno": 0,
        "asistieron": 0,
        "con_atraso": 0,
        "ausentes": 0,
        "justificados": 0,
        "turnos": []
    })
}
