use std::collections::{HashMap, HashSet};

use chrono::{Datelike, NaiveDate, Utc};
use reqwest::Method;
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_database::supabase::{representation_headers, SupabaseClient};
use shared_utils::rut::normalize_rut;

use crate::models::{
    ChangePasswordRequest, DoctorProfileUpdateRequest, ProfileUpdateRequest, UserError,
};

pub struct ProfileService {
    supabase: SupabaseClient,
}

impl ProfileService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    pub async fn get_profile(&self, usuario_id: i64) -> Result<Value, UserError> {
        let path = format!(
            "/rest/v1/usuario_sistema?id=eq.{}&select=id,nombre,apellido_paterno,apellido_materno,rut,email,celular,cel_secundario,direccion,rol_id,rol(nombre)",
            usuario_id
        );
        let rows: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;
        let perfil = rows.into_iter().next().ok_or(UserError::UserNotFound)?;
        Ok(json!({ "perfil": perfil }))
    }

    pub async fn update_profile(
        &self,
        usuario_id: i64,
        request: ProfileUpdateRequest,
    ) -> Result<Value, UserError> {
        let path = format!("/rest/v1/usuario_sistema?id=eq.{}&select=id", usuario_id);
        let existentes: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;
        if existentes.is_empty() {
            return Err(UserError::UserNotFound);
        }

        let rut = normalize_rut(&request.rut);
        let dup_path = format!(
            "/rest/v1/usuario_sistema?or=(rut.eq.{},email.eq.{})&id=neq.{}&select=id",
            urlencoding::encode(&rut),
            urlencoding::encode(&request.email),
            usuario_id
        );
        let duplicados: Vec<Value> = self.supabase.request(Method::GET, &dup_path, None).await?;
        if !duplicados.is_empty() {
            return Err(UserError::DuplicateUser);
        }

        let update_path = format!("/rest/v1/usuario_sistema?id=eq.{}", usuario_id);
        let actualizados: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &update_path,
                Some(json!({
                    "nombre": request.nombre,
                    "apellido_paterno": request.apellido_paterno,
                    "apellido_materno": request.apellido_materno,
                    "rut": rut,
                    "email": request.email,
                    "celular": request.celular,
                    "cel_secundario": request.cel_secundario,
                    "direccion": request.direccion
                })),
                Some(representation_headers()),
            )
            .await?;
        let perfil = actualizados
            .into_iter()
            .next()
            .ok_or_else(|| UserError::Database("No se pudo actualizar el perfil.".to_string()))?;

        Ok(json!({
            "mensaje": "Perfil actualizado correctamente.",
            "perfil": perfil
        }))
    }

    pub async fn doctor_profile(&self, doctor_id: i64) -> Result<Value, UserError> {
        let path = format!(
            "/rest/v1/usuario_sistema?id=eq.{}&rol_id=eq.2&select=id,nombre,apellido_paterno,apellido_materno,rut,email,celular,cel_secundario,direccion,especialidades:especialidades_doctor(especialidad(id,nombre))",
            doctor_id
        );
        let rows: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;
        let doctor = rows.into_iter().next().ok_or(UserError::UserNotFound)?;

        let especialidades: Vec<Value> = doctor["especialidades"]
            .as_array()
            .map(|rels| {
                rels.iter()
                    .filter_map(|r| {
                        let e = &r["especialidad"];
                        e.is_object().then(|| e.clone())
                    })
                    .collect()
            })
            .unwrap_or_default();
        let nombre_completo = format!(
            "{} {} {}",
            doctor["nombre"].as_str().unwrap_or_default(),
            doctor["apellido_paterno"].as_str().unwrap_or_default(),
            doctor["apellido_materno"].as_str().unwrap_or_default()
        )
        .trim()
        .to_string();

        Ok(json!({
            "perfil": {
                "id": doctor["id"],
                "nombre": doctor["nombre"],
                "apellido_paterno": doctor["apellido_paterno"],
                "apellido_materno": doctor["apellido_materno"],
                "nombre_completo": nombre_completo,
                "rut": doctor["rut"],
                "email": doctor["email"],
                "celular": doctor["celular"],
                "cel_secundario": doctor["cel_secundario"],
                "direccion": doctor["direccion"],
                "especialidades": especialidades
            }
        }))
    }

    pub async fn update_doctor_profile(
        &self,
        doctor_id: i64,
        request: DoctorProfileUpdateRequest,
    ) -> Result<Value, UserError> {
        let path = format!(
            "/rest/v1/usuario_sistema?id=eq.{}&rol_id=eq.2&select=id",
            doctor_id
        );
        let existentes: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;
        if existentes.is_empty() {
            return Err(UserError::UserNotFound);
        }

        let dup_path = format!(
            "/rest/v1/usuario_sistema?email=eq.{}&id=neq.{}&select=id",
            urlencoding::encode(&request.email),
            doctor_id
        );
        let duplicados: Vec<Value> = self.supabase.request(Method::GET, &dup_path, None).await?;
        if !duplicados.is_empty() {
            return Err(UserError::DuplicateUser);
        }

        let update_path = format!("/rest/v1/usuario_sistema?id=eq.{}", doctor_id);
        let actualizados: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &update_path,
                Some(json!({
                    "nombre": request.nombre,
                    "apellido_paterno": request.apellido_paterno,
                    "apellido_materno": request.apellido_materno,
                    "email": request.email,
                    "celular": request.celular,
                    "cel_secundario": request.cel_secundario,
                    "direccion": request.direccion
                })),
                Some(representation_headers()),
            )
            .await?;
        let perfil = actualizados
            .into_iter()
            .next()
            .ok_or_else(|| UserError::Database("No se pudo actualizar el perfil.".to_string()))?;

        Ok(json!({
            "mensaje": "Perfil actualizado correctamente.",
            "perfil": perfil
        }))
    }

    /// Headline numbers for the doctor dashboard: unique patients with a
    /// completed appointment, appointments in the running month (cancelled
    /// ones excluded) and completed appointments overall.
    pub async fn doctor_stats(&self, doctor_id: i64) -> Result<Value, UserError> {
        let path = format!(
            "/rest/v1/usuario_sistema?id=eq.{}&rol_id=eq.2&select=id",
            doctor_id
        );
        let existentes: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;
        if existentes.is_empty() {
            return Err(UserError::UserNotFound);
        }

        let citas_path = format!(
            "/rest/v1/cita_medica?doctor_id=eq.{}&select=id,fecha_atencion,paciente_id",
            doctor_id
        );
        let citas: Vec<Value> = self.supabase.request(Method::GET, &citas_path, None).await?;

        let estados = self.current_states(&citas).await?;

        let mut pacientes_atendidos: HashSet<i64> = HashSet::new();
        let mut total_completadas = 0u64;
        let mut citas_mes_actual = 0u64;

        let hoy = Utc::now().date_naive();
        let inicio_mes = NaiveDate::from_ymd_opt(hoy.year(), hoy.month(), 1);

        for cita in &citas {
            let Some(cita_id) = cita["id"].as_i64() else {
                continue;
            };
            let estado = estados.get(&cita_id).map(String::as_str);
            if estado == Some("Completada") {
                total_completadas += 1;
                if let Some(paciente_id) = cita["paciente_id"].as_i64() {
                    pacientes_atendidos.insert(paciente_id);
                }
            }

            let en_mes = cita["fecha_atencion"]
                .as_str()
                .and_then(|f| NaiveDate::parse_from_str(&f[..10.min(f.len())], "%Y-%m-%d").ok())
                .zip(inicio_mes)
                .map(|(fecha, inicio)| fecha >= inicio && fecha <= hoy)
                .unwrap_or(false);
            if en_mes && estado != Some("Cancelada") {
                citas_mes_actual += 1;
            }
        }

        Ok(json!({
            "estadisticas": {
                "pacientes_atendidos": pacientes_atendidos.len(),
                "citas_mes_actual": citas_mes_actual,
                "total_citas_completadas": total_completadas
            }
        }))
    }

    /// Latest status row per appointment, fetched in one in.() query.
    async fn current_states(
        &self,
        citas: &[Value],
    ) -> Result<HashMap<i64, String>, UserError> {
        let ids: Vec<String> = citas
            .iter()
            .filter_map(|c| c["id"].as_i64())
            .map(|id| id.to_string())
            .collect();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let path = format!(
            "/rest/v1/estado?cita_medica_id=in.({})&select=cita_medica_id,estado&order=id.asc",
            ids.join(",")
        );
        let filas: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;

        let mut estados = HashMap::new();
        for fila in filas {
            if let (Some(cita_id), Some(estado)) =
                (fila["cita_medica_id"].as_i64(), fila["estado"].as_str())
            {
                estados.insert(cita_id, estado.to_string());
            }
        }
        Ok(estados)
    }

    pub async fn change_password(
        &self,
        doctor_id: i64,
        request: ChangePasswordRequest,
    ) -> Result<Value, UserError> {
        if request.password_nueva.len() < 8 {
            return Err(UserError::Validation(
                "La nueva contraseña debe tener al menos 8 caracteres.".to_string(),
            ));
        }

        let path = format!(
            "/rest/v1/contraseñas?id_profesional_salud=eq.{}&select=id,contraseña",
            doctor_id
        );
        let filas: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;
        let fila = filas.into_iter().next().ok_or(UserError::PasswordNotFound)?;
        let hash_actual = fila["contraseña"].as_str().unwrap_or_default();

        let coincide = bcrypt::verify(&request.password_actual, hash_actual)
            .map_err(|e| UserError::Database(format!("Error al verificar contraseña: {}", e)))?;
        if !coincide {
            return Err(UserError::WrongPassword);
        }

        let hash_nuevo = bcrypt::hash(&request.password_nueva, bcrypt::DEFAULT_COST)
            .map_err(|e| UserError::Database(format!("Error al generar contraseña: {}", e)))?;

        let update_path = format!(
            "/rest/v1/contraseñas?id_profesional_salud=eq.{}",
            doctor_id
        );
        let _: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &update_path,
                Some(json!({
                    "contraseña": hash_nuevo,
                    "contraseña_temporal": Value::Null
                })),
                Some(representation_headers()),
            )
            .await?;

        Ok(json!({ "mensaje": "Contraseña actualizada correctamente." }))
    }
}
