use std::collections::{HashMap, HashSet};

use chrono::{Duration, NaiveDate, Utc};
use reqwest::Method;
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_database::supabase::{representation_headers, SupabaseClient};
use shared_utils::time::{day_bounds, month_bounds, week_bounds};

use crate::models::{AttendanceError, HistoryQuery, JustificationRequest};
use crate::services::attendance::{id_list, parse_date, parse_ts, round2, TS_FORMAT};

const MAX_HISTORY_ROWS: usize = 100;

pub struct ReportService {
    supabase: SupabaseClient,
}

impl ReportService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    async fn doctor_row(&self, doctor_id: i64) -> Result<Value, AttendanceError> {
        let path = format!(
            "/rest/v1/usuario_sistema?id=eq.{}&select=id,nombre,apellido_paterno,apellido_materno,rut,email",
            doctor_id
        );
        let rows: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;
        rows.into_iter().next().ok_or(AttendanceError::DoctorNotFound)
    }

    async fn doctor_specialties(&self, doctor_id: i64) -> Result<Vec<String>, AttendanceError> {
        let path = format!(
            "/rest/v1/especialidades_doctor?usuario_sistema_id=eq.{}&select=especialidad:especialidad_id(nombre)",
            doctor_id
        );
        let rows: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;
        Ok(rows
            .iter()
            .filter_map(|r| r["especialidad"]["nombre"].as_str().map(String::from))
            .collect())
    }

    /// Shift window per day, merged from that day's schedule blocks.
    async fn scheduled_days(
        &self,
        doctor_id: i64,
        desde: &str,
        hasta: &str,
    ) -> Result<HashMap<String, (String, String)>, AttendanceError> {
        let path = format!(
            "/rest/v1/horarios_personal?usuario_sistema_id=eq.{}&inicio_bloque=gte.{}&inicio_bloque=lte.{}&select=inicio_bloque,finalizacion_bloque&order=inicio_bloque.asc",
            doctor_id, desde, hasta
        );
        let horarios: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;

        let mut dias: HashMap<String, (String, String)> = HashMap::new();
        for horario in &horarios {
            let Some(inicio) = horario["inicio_bloque"].as_str() else {
                continue;
            };
            let Some(fin) = horario["finalizacion_bloque"].as_str() else {
                continue;
            };
            let dia = inicio.chars().take(10).collect::<String>();
            dias.entry(dia)
                .and_modify(|(_, f)| *f = fin.to_string())
                .or_insert((inicio.to_string(), fin.to_string()));
        }
        Ok(dias)
    }

    async fn completed_count(&self, cita_ids: &[i64]) -> Result<usize, AttendanceError> {
        if cita_ids.is_empty() {
            return Ok(0);
        }
        let path = format!(
            "/rest/v1/estado?cita_medica_id=in.({})&estado=eq.Completada&select=cita_medica_id",
            id_list(cita_ids)
        );
        let rows: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;
        Ok(rows.len())
    }

    /// Side-panel detail for one doctor and day: shift, marks, patients and
    /// a small event timeline.
    pub async fn doctor_detail(
        &self,
        doctor_id: i64,
        fecha: Option<&str>,
    ) -> Result<Value, AttendanceError> {
        let fecha_consulta = match fecha {
            Some(f) => parse_date(f)?,
            None => Utc::now().date_naive(),
        };
        let (inicio_dia, fin_dia) = day_bounds(fecha_consulta);

        let doctor = self.doctor_row(doctor_id).await?;
        let especialidades = self.doctor_specialties(doctor_id).await?;

        let horarios_path = format!(
            "/rest/v1/horarios_personal?usuario_sistema_id=eq.{}&inicio_bloque=gte.{}&inicio_bloque=lte.{}&select=*&order=inicio_bloque.asc",
            doctor_id, inicio_dia, fin_dia
        );
        let horarios: Vec<Value> = self
            .supabase
            .request(Method::GET, &horarios_path, None)
            .await?;
        let turno_programado = if horarios.is_empty() {
            None
        } else {
            Some(json!({
                "inicio": horarios[0]["inicio_bloque"],
                "fin": horarios[horarios.len() - 1]["finalizacion_bloque"],
                "total_bloques": horarios.len()
            }))
        };

        let asistencia_path = format!(
            "/rest/v1/asistencia?usuario_sistema_id=eq.{}&inicio_turno=gte.{}&inicio_turno=lte.{}&select=*",
            doctor_id, inicio_dia, fin_dia
        );
        let asistencias: Vec<Value> = self
            .supabase
            .request(Method::GET, &asistencia_path, None)
            .await?;
        let asistencia_hoy = asistencias.first();

        let mut estado_actual = "FUERA_DE_TURNO";
        let mut minutos_atraso = 0i64;
        let mut minutos_trabajados: Option<i64> = None;

        if let Some(asistencia) = asistencia_hoy {
            let entrada = asistencia["inicio_turno"].as_str().and_then(parse_ts);
            let salida = asistencia["finalizacion_turno"].as_str().and_then(parse_ts);

            if let (Some(entrada), Some(turno)) = (entrada, turno_programado.as_ref()) {
                if let Some(inicio_prog) = turno["inicio"].as_str().and_then(parse_ts) {
                    minutos_atraso = ((entrada - inicio_prog).num_minutes()).max(0);
                }
            }
            match (entrada, salida) {
                (Some(entrada), Some(salida)) => {
                    minutos_trabajados = Some((salida - entrada).num_minutes());
                }
                (Some(entrada), None) => {
                    estado_actual = "EN_TURNO";
                    minutos_trabajados = Some((Utc::now().naive_utc() - entrada).num_minutes());
                }
                _ => {}
            }
        }

        let citas_path = format!(
            "/rest/v1/cita_medica?doctor_id=eq.{}&fecha_atencion=gte.{}&fecha_atencion=lte.{}&select=id,fecha_atencion,paciente:paciente_id(nombre,apellido_paterno)",
            doctor_id, inicio_dia, fin_dia
        );
        let citas: Vec<Value> = self.supabase.request(Method::GET, &citas_path, None).await?;
        let cita_ids: Vec<i64> = citas.iter().filter_map(|c| c["id"].as_i64()).collect();
        let atendidos = self.completed_count(&cita_ids).await?;
        let agendados = citas.len();

        let mut timeline = Vec::new();
        if let Some(asistencia) = asistencia_hoy {
            let descripcion = if minutos_atraso > 0 {
                format!("Entrada a turno ({} min atraso)", minutos_atraso)
            } else {
                "Entrada a turno".to_string()
            };
            timeline.push(json!({
                "hora": asistencia["inicio_turno"],
                "tipo": "ENTRADA",
                "descripcion": descripcion
            }));
            if !asistencia["finalizacion_turno"].is_null() {
                timeline.push(json!({
                    "hora": asistencia["finalizacion_turno"],
                    "tipo": "SALIDA",
                    "descripcion": "Salida de turno"
                }));
            }
        }

        let nombre_completo = format!(
            "{} {} {}",
            doctor["nombre"].as_str().unwrap_or_default(),
            doctor["apellido_paterno"].as_str().unwrap_or_default(),
            doctor["apellido_materno"].as_str().unwrap_or_default()
        )
        .trim()
        .to_string();

        Ok(json!({
            "doctor": {
                "id": doctor["id"],
                "nombre_completo": nombre_completo,
                "nombre": doctor["nombre"],
                "apellido_paterno": doctor["apellido_paterno"],
                "apellido_materno": doctor["apellido_materno"],
                "rut": doctor["rut"],
                "email": doctor["email"],
                "especialidades": especialidades
            },
            "turno_hoy": {
                "programado": turno_programado,
                "asistencia": asistencia_hoy,
                "estado_actual": estado_actual,
                "minutos_atraso": minutos_atraso,
                "minutos_trabajados": minutos_trabajados
            },
            "pacientes_hoy": {
                "agendados": agendados,
                "atendidos": atendidos,
                "pendientes": agendados.saturating_sub(atendidos)
            },
            "timeline": timeline
        }))
    }

    /// Attendance, punctuality, hours and patient KPIs for a doctor over a
    /// day, week or month.
    pub async fn period_stats(
        &self,
        doctor_id: i64,
        periodo: &str,
        fecha_referencia: Option<&str>,
    ) -> Result<Value, AttendanceError> {
        let fecha_ref = match fecha_referencia {
            Some(f) => parse_date(f)?,
            None => Utc::now().date_naive(),
        };
        let (fecha_inicio, fecha_fin) = match periodo {
            "hoy" => (fecha_ref, fecha_ref),
            "semana" => week_bounds(fecha_ref),
            "mes" => month_bounds(fecha_ref),
            _ => return Err(AttendanceError::InvalidPeriod),
        };
        self.doctor_row(doctor_id).await?;

        let desde = format!("{}T00:00:00", fecha_inicio.format("%Y-%m-%d"));
        let hasta = format!("{}T23:59:59", fecha_fin.format("%Y-%m-%d"));

        let dias_programados = self.scheduled_days(doctor_id, &desde, &hasta).await?;
        let total_dias_turno = dias_programados.len();

        let asistencias_path = format!(
            "/rest/v1/asistencia?usuario_sistema_id=eq.{}&inicio_turno=gte.{}&inicio_turno=lte.{}&select=*",
            doctor_id, desde, hasta
        );
        let asistencias: Vec<Value> = self
            .supabase
            .request(Method::GET, &asistencias_path, None)
            .await?;
        let dias_asistio = asistencias.len();

        let asistencia_ids: Vec<i64> = asistencias
            .iter()
            .filter_map(|a| a["id"].as_i64())
            .collect();
        let ausencias_justificadas = if asistencia_ids.is_empty() {
            0
        } else {
            let path = format!(
                "/rest/v1/asistencia_estados?asistencia_id=in.({})&estado=eq.JUSTIFICADO&select=id",
                id_list(&asistencia_ids)
            );
            let rows: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;
            rows.len()
        };

        let ahora = Utc::now().naive_utc();
        let mut atrasos: Vec<i64> = Vec::new();
        let mut horas_programadas_total = 0.0f64;
        let mut horas_efectivas_total = 0.0f64;

        for asistencia in &asistencias {
            let Some(entrada) = asistencia["inicio_turno"].as_str().and_then(parse_ts) else {
                continue;
            };
            let dia = entrada.format("%Y-%m-%d").to_string();
            let Some((inicio_prog, fin_prog)) = dias_programados.get(&dia) else {
                continue;
            };
            let (Some(inicio_prog), Some(fin_prog)) =
                (parse_ts(inicio_prog), parse_ts(fin_prog))
            else {
                continue;
            };

            let salida = asistencia["finalizacion_turno"]
                .as_str()
                .and_then(parse_ts)
                .unwrap_or(ahora);

            let minutos_atraso = ((entrada - inicio_prog).num_minutes()).max(0);
            if minutos_atraso > 0 {
                atrasos.push(minutos_atraso);
            }
            horas_programadas_total += (fin_prog - inicio_prog).num_seconds() as f64 / 3600.0;
            horas_efectivas_total += (salida - entrada).num_seconds() as f64 / 3600.0;
        }

        let total_atrasos = atrasos.len();
        let atraso_promedio = if atrasos.is_empty() {
            0
        } else {
            atrasos.iter().sum::<i64>() / atrasos.len() as i64
        };
        let peor_atraso = atrasos.iter().copied().max().unwrap_or(0);

        let citas_path = format!(
            "/rest/v1/cita_medica?doctor_id=eq.{}&fecha_atencion=gte.{}&fecha_atencion=lte.{}&select=id,fecha_atencion",
            doctor_id, desde, hasta
        );
        let citas: Vec<Value> = self.supabase.request(Method::GET, &citas_path, None).await?;
        let cita_ids: Vec<i64> = citas.iter().filter_map(|c| c["id"].as_i64()).collect();
        let atendidos = self.completed_count(&cita_ids).await?;
        let agendados = citas.len();

        let ausencias_injustificadas = total_dias_turno
            .saturating_sub(dias_asistio)
            .saturating_sub(ausencias_justificadas);

        Ok(json!({
            "periodo": periodo,
            "fecha_inicio": fecha_inicio.format("%Y-%m-%d").to_string(),
            "fecha_fin": fecha_fin.format("%Y-%m-%d").to_string(),
            "asistencia": {
                "dias_con_turno": total_dias_turno,
                "asistencias": dias_asistio,
                "ausencias_injustificadas": ausencias_injustificadas,
                "ausencias_justificadas": ausencias_justificadas
            },
            "puntualidad": {
                "total_atrasos": total_atrasos,
                "atraso_promedio_min": atraso_promedio,
                "peor_atraso_min": peor_atraso
            },
            "horas": {
                "programadas": round2(horas_programadas_total),
                "efectivas": round2(horas_efectivas_total),
                "diferencia": round2(horas_efectivas_total - horas_programadas_total)
            },
            "pacientes": {
                "agendados": agendados,
                "atendidos": atendidos,
                "pendientes": agendados.saturating_sub(atendidos)
            }
        }))
    }

    /// Day-by-day history table for one doctor, newest first.
    pub async fn daily_history(
        &self,
        doctor_id: i64,
        query: HistoryQuery,
    ) -> Result<Value, AttendanceError> {
        let hoy = Utc::now().date_naive();
        let fecha_desde = match &query.fecha_desde {
            Some(f) => parse_date(f)?,
            None => hoy - Duration::days(30),
        };
        let fecha_hasta = match &query.fecha_hasta {
            Some(f) => parse_date(f)?,
            None => hoy,
        };
        let limit = query.limit.min(MAX_HISTORY_ROWS);

        let desde = format!("{}T00:00:00", fecha_desde.format("%Y-%m-%d"));
        let hasta = format!("{}T23:59:59", fecha_hasta.format("%Y-%m-%d"));

        let asistencias_path = format!(
            "/rest/v1/asistencia?usuario_sistema_id=eq.{}&inicio_turno=gte.{}&inicio_turno=lte.{}&select=*&order=inicio_turno.desc&limit={}",
            doctor_id, desde, hasta, limit
        );
        let asistencias: Vec<Value> = self
            .supabase
            .request(Method::GET, &asistencias_path, None)
            .await?;

        let dias_programados = self.scheduled_days(doctor_id, &desde, &hasta).await?;

        let asistencia_ids: Vec<i64> = asistencias
            .iter()
            .filter_map(|a| a["id"].as_i64())
            .collect();
        let mut justificaciones: HashMap<i64, Value> = HashMap::new();
        if !asistencia_ids.is_empty() {
            let path = format!(
                "/rest/v1/asistencia_estados?asistencia_id=in.({})&estado=eq.JUSTIFICADO&select=*",
                id_list(&asistencia_ids)
            );
            let rows: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;
            for row in rows {
                if let Some(id) = row["asistencia_id"].as_i64() {
                    justificaciones.insert(id, row);
                }
            }
        }

        let citas_path = format!(
            "/rest/v1/cita_medica?doctor_id=eq.{}&fecha_atencion=gte.{}&fecha_atencion=lte.{}&select=id,fecha_atencion",
            doctor_id, desde, hasta
        );
        let citas: Vec<Value> = self.supabase.request(Method::GET, &citas_path, None).await?;
        let cita_ids: Vec<i64> = citas.iter().filter_map(|c| c["id"].as_i64()).collect();
        let completadas: HashSet<i64> = if cita_ids.is_empty() {
            HashSet::new()
        } else {
            let path = format!(
                "/rest/v1/estado?cita_medica_id=in.({})&estado=eq.Completada&select=cita_medica_id",
                id_list(&cita_ids)
            );
            let rows: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;
            rows.iter()
                .filter_map(|r| r["cita_medica_id"].as_i64())
                .collect()
        };

        let mut agendados_por_dia: HashMap<String, usize> = HashMap::new();
        let mut atendidos_por_dia: HashMap<String, usize> = HashMap::new();
        for cita in &citas {
            let Some(fecha) = cita["fecha_atencion"].as_str() else {
                continue;
            };
            let dia = fecha.chars().take(10).collect::<String>();
            *agendados_por_dia.entry(dia.clone()).or_default() += 1;
            if cita["id"].as_i64().is_some_and(|id| completadas.contains(&id)) {
                *atendidos_por_dia.entry(dia).or_default() += 1;
            }
        }

        let mut historial = Vec::with_capacity(asistencias.len());
        for asistencia in &asistencias {
            let Some(entrada_str) = asistencia["inicio_turno"].as_str() else {
                continue;
            };
            let dia = entrada_str.chars().take(10).collect::<String>();
            let programado = dias_programados.get(&dia);

            let minutos_atraso = match (programado, parse_ts(entrada_str)) {
                (Some((inicio_prog, _)), Some(entrada)) => parse_ts(inicio_prog)
                    .map(|p| ((entrada - p).num_minutes()).max(0))
                    .unwrap_or(0),
                _ => 0,
            };

            let asistencia_id = asistencia["id"].as_i64().unwrap_or_default();
            let justificacion = justificaciones.get(&asistencia_id);
            let estado_dia = if justificacion.is_some() {
                "JUSTIFICADO"
            } else if asistencia["finalizacion_turno"].is_null() {
                "EN_TURNO"
            } else {
                "ASISTIO"
            };

            historial.push(json!({
                "fecha": dia,
                "turno_programado": {
                    "inicio": programado.map(|(i, _)| i.clone()),
                    "fin": programado.map(|(_, f)| f.clone())
                },
                "entrada_real": asistencia["inicio_turno"],
                "salida_real": asistencia["finalizacion_turno"],
                "minutos_atraso": minutos_atraso,
                "estado_dia": estado_dia,
                "justificacion": justificacion.map(|j| j["justificacion"].clone()),
                "pacientes": {
                    "agendados": agendados_por_dia.get(&dia).copied().unwrap_or(0),
                    "atendidos": atendidos_por_dia.get(&dia).copied().unwrap_or(0)
                },
                "asistencia_id": asistencia_id
            }));
        }

        Ok(json!({
            "doctor_id": doctor_id,
            "fecha_desde": fecha_desde.format("%Y-%m-%d").to_string(),
            "fecha_hasta": fecha_hasta.format("%Y-%m-%d").to_string(),
            "total_registros": historial.len(),
            "historial": historial
        }))
    }

    /// All justifications recorded for a doctor, newest first.
    pub async fn justifications(&self, doctor_id: i64) -> Result<Value, AttendanceError> {
        let asistencias_path = format!(
            "/rest/v1/asistencia?usuario_sistema_id=eq.{}&select=id,inicio_turno",
            doctor_id
        );
        let asistencias: Vec<Value> = self
            .supabase
            .request(Method::GET, &asistencias_path, None)
            .await?;
        if asistencias.is_empty() {
            return Ok(json!({ "justificaciones": [] }));
        }

        let asistencia_ids: Vec<i64> = asistencias
            .iter()
            .filter_map(|a| a["id"].as_i64())
            .collect();
        let estados_path = format!(
            "/rest/v1/asistencia_estados?asistencia_id=in.({})&estado=eq.JUSTIFICADO&select=*&order=fecha_justificacion.desc",
            id_list(&asistencia_ids)
        );
        let estados: Vec<Value> = self
            .supabase
            .request(Method::GET, &estados_path, None)
            .await?;

        let fechas: HashMap<i64, String> = asistencias
            .iter()
            .filter_map(|a| {
                let id = a["id"].as_i64()?;
                let fecha = a["inicio_turno"].as_str()?.chars().take(10).collect();
                Some((id, fecha))
            })
            .collect();

        let justificaciones: Vec<Value> = estados
            .iter()
            .map(|estado| {
                let asistencia_id = estado["asistencia_id"].as_i64().unwrap_or_default();
                json!({
                    "id": estado["id"],
                    "fecha": fechas.get(&asistencia_id),
                    "tipo": estado["tipo_justificacion"],
                    "descripcion": estado["justificacion"],
                    "justificado_por": estado["justificado_por"],
                    "fecha_justificacion": estado["fecha_justificacion"],
                    "asistencia_id": asistencia_id
                })
            })
            .collect();

        Ok(json!({ "justificaciones": justificaciones }))
    }

    /// Records a justification over an attendance row. One row per
    /// attendance: an existing state is overwritten.
    pub async fn add_justification(
        &self,
        doctor_id: i64,
        request: JustificationRequest,
    ) -> Result<Value, AttendanceError> {
        let asistencia_path = format!(
            "/rest/v1/asistencia?id=eq.{}&usuario_sistema_id=eq.{}&select=id",
            request.asistencia_id, doctor_id
        );
        let asistencias: Vec<Value> = self
            .supabase
            .request(Method::GET, &asistencia_path, None)
            .await?;
        if asistencias.is_empty() {
            return Err(AttendanceError::RecordNotFound);
        }

        let estado_data = json!({
            "asistencia_id": request.asistencia_id,
            "estado": "JUSTIFICADO",
            "tipo_justificacion": request.tipo_justificacion,
            "justificacion": request.justificacion,
            "justificado_por": request.justificado_por,
            "fecha_justificacion": Utc::now().naive_utc().format(TS_FORMAT).to_string()
        });

        let existing_path = format!(
            "/rest/v1/asistencia_estados?asistencia_id=eq.{}&select=id",
            request.asistencia_id
        );
        let existentes: Vec<Value> = self
            .supabase
            .request(Method::GET, &existing_path, None)
            .await?;

        let resultado: Vec<Value> = if existentes.is_empty() {
            self.supabase
                .request_with_headers(
                    Method::POST,
                    "/rest/v1/asistencia_estados",
                    Some(estado_data),
                    Some(representation_headers()),
                )
                .await?
        } else {
            let update_path = format!(
                "/rest/v1/asistencia_estados?asistencia_id=eq.{}",
                request.asistencia_id
            );
            self.supabase
                .request_with_headers(
                    Method::PATCH,
                    &update_path,
                    Some(estado_data),
                    Some(representation_headers()),
                )
                .await?
        };

        resultado.into_iter().next().ok_or_else(|| {
            AttendanceError::Database("No se pudo guardar la justificación.".to_string())
        })
    }
}
