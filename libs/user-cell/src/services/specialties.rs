use std::collections::HashMap;

use reqwest::Method;
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_database::supabase::{representation_headers, SupabaseClient};

use crate::models::{SpecialtyLinkRequest, SpecialtyRequest, SubSpecialtyRequest, UserError};

pub struct SpecialtyService {
    supabase: SupabaseClient,
}

impl SpecialtyService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    pub async fn create_specialty(
        &self,
        request: SpecialtyRequest,
    ) -> Result<Value, UserError> {
        let path = format!(
            "/rest/v1/especialidad?nombre=eq.{}&select=id",
            urlencoding::encode(&request.nombre)
        );
        let existentes: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;
        if !existentes.is_empty() {
            return Err(UserError::DuplicateSpecialty(request.nombre));
        }

        let creados: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/especialidad",
                Some(json!({
                    "nombre": request.nombre,
                    "descripcion": request.descripcion
                })),
                Some(representation_headers()),
            )
            .await?;
        let especialidad = creados.into_iter().next().ok_or_else(|| {
            UserError::Database("No se pudo insertar la especialidad.".to_string())
        })?;

        if let Some(precio) = request.precio.filter(|p| *p > 0.0) {
            let _: Vec<Value> = self
                .supabase
                .request_with_headers(
                    Method::POST,
                    "/rest/v1/costos_servicio",
                    Some(json!({
                        "servicio": format!("Consulta {}", request.nombre),
                        "precio": precio,
                        "especialidad_id": especialidad["id"]
                    })),
                    Some(representation_headers()),
                )
                .await?;
        }

        let especialidades = self.list_specialties().await?;
        Ok(json!({
            "mensaje": format!("Especialidad '{}' creada.", request.nombre),
            "especialidades": especialidades
        }))
    }

    pub async fn update_specialty(
        &self,
        especialidad_id: i64,
        request: SpecialtyRequest,
    ) -> Result<Value, UserError> {
        let path = format!("/rest/v1/especialidad?id=eq.{}&select=id", especialidad_id);
        let existentes: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;
        if existentes.is_empty() {
            return Err(UserError::SpecialtyNotFound(especialidad_id));
        }

        let dup_path = format!(
            "/rest/v1/especialidad?nombre=eq.{}&id=neq.{}&select=id",
            urlencoding::encode(&request.nombre),
            especialidad_id
        );
        let duplicados: Vec<Value> = self.supabase.request(Method::GET, &dup_path, None).await?;
        if !duplicados.is_empty() {
            return Err(UserError::DuplicateSpecialty(request.nombre));
        }

        let update_path = format!("/rest/v1/especialidad?id=eq.{}", especialidad_id);
        let actualizados: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &update_path,
                Some(json!({
                    "nombre": request.nombre,
                    "descripcion": request.descripcion
                })),
                Some(representation_headers()),
            )
            .await?;
        let especialidad = actualizados.into_iter().next().ok_or_else(|| {
            UserError::Database("No se pudo actualizar la especialidad.".to_string())
        })?;

        if let Some(precio) = request.precio {
            self.upsert_price(especialidad_id, &request.nombre, precio)
                .await?;
        }

        Ok(json!({
            "mensaje": format!("Especialidad '{}' modificada.", request.nombre),
            "especialidad": especialidad
        }))
    }

    async fn upsert_price(
        &self,
        especialidad_id: i64,
        nombre: &str,
        precio: f64,
    ) -> Result<(), UserError> {
        let path = format!(
            "/rest/v1/costos_servicio?especialidad_id=eq.{}&select=id",
            especialidad_id
        );
        let existentes: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;
        if existentes.is_empty() {
            let _: Vec<Value> = self
                .supabase
                .request_with_headers(
                    Method::POST,
                    "/rest/v1/costos_servicio",
                    Some(json!({
                        "servicio": format!("Consulta {}", nombre),
                        "precio": precio,
                        "especialidad_id": especialidad_id
                    })),
                    Some(representation_headers()),
                )
                .await?;
        } else {
            let update_path = format!(
                "/rest/v1/costos_servicio?especialidad_id=eq.{}",
                especialidad_id
            );
            let _: Vec<Value> = self
                .supabase
                .request_with_headers(
                    Method::PATCH,
                    &update_path,
                    Some(json!({
                        "servicio": format!("Consulta {}", nombre),
                        "precio": precio
                    })),
                    Some(representation_headers()),
                )
                .await?;
        }
        Ok(())
    }

    /// Deletes a specialty only when nothing references it: no linked
    /// sub-specialties, no assigned doctors, no service costs.
    pub async fn delete_specialty(&self, especialidad_id: i64) -> Result<Value, UserError> {
        let path = format!(
            "/rest/v1/especialidad?id=eq.{}&select=id,nombre",
            especialidad_id
        );
        let existentes: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;
        let especialidad = existentes
            .into_iter()
            .next()
            .ok_or(UserError::SpecialtyNotFound(especialidad_id))?;
        let nombre = especialidad["nombre"].as_str().unwrap_or_default().to_string();

        let vinculos_path = format!(
            "/rest/v1/especialidad_con_subespecialidad?especialidad_id=eq.{}&select=id&limit=1",
            especialidad_id
        );
        let vinculos: Vec<Value> = self.supabase.request(Method::GET, &vinculos_path, None).await?;
        if !vinculos.is_empty() {
            return Err(UserError::SpecialtyInUse(format!(
                "No puedes eliminar '{}' porque tiene subespecialidades vinculadas.",
                nombre
            )));
        }

        let doctores_path = format!(
            "/rest/v1/especialidades_doctor?especialidad_id=eq.{}&select=id&limit=1",
            especialidad_id
        );
        let doctores: Vec<Value> = self.supabase.request(Method::GET, &doctores_path, None).await?;
        if !doctores.is_empty() {
            return Err(UserError::SpecialtyInUse(format!(
                "No puedes eliminar '{}' porque está asignada a usuarios.",
                nombre
            )));
        }

        let costos_path = format!(
            "/rest/v1/costos_servicio?especialidad_id=eq.{}&select=id&limit=1",
            especialidad_id
        );
        let costos: Vec<Value> = self.supabase.request(Method::GET, &costos_path, None).await?;
        if !costos.is_empty() {
            return Err(UserError::SpecialtyInUse(format!(
                "No puedes eliminar '{}' porque está referenciada por costos de servicio.",
                nombre
            )));
        }

        let delete_path = format!("/rest/v1/especialidad?id=eq.{}", especialidad_id);
        let eliminados: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::DELETE,
                &delete_path,
                None,
                Some(representation_headers()),
            )
            .await?;
        if eliminados.is_empty() {
            return Err(UserError::Database(
                "No se pudo eliminar la especialidad.".to_string(),
            ));
        }

        Ok(json!({ "mensaje": format!("Especialidad '{}' eliminada correctamente.", nombre) }))
    }

    /// Specialties with their consultation price, resolved in one extra
    /// query over costos_servicio.
    pub async fn list_specialties(&self) -> Result<Vec<Value>, UserError> {
        let mut especialidades: Vec<Value> = self
            .supabase
            .request(
                Method::GET,
                "/rest/v1/especialidad?select=id,nombre,descripcion&order=id.asc",
                None,
            )
            .await?;

        let costos: Vec<Value> = self
            .supabase
            .request(
                Method::GET,
                "/rest/v1/costos_servicio?select=especialidad_id,precio",
                None,
            )
            .await?;
        let precios: HashMap<i64, Value> = costos
            .into_iter()
            .filter_map(|c| Some((c["especialidad_id"].as_i64()?, c["precio"].clone())))
            .collect();

        for especialidad in &mut especialidades {
            let precio = especialidad["id"]
                .as_i64()
                .and_then(|id| precios.get(&id).cloned())
                .unwrap_or(Value::Null);
            especialidad["precio"] = precio;
        }
        Ok(especialidades)
    }

    pub async fn create_sub_specialty(
        &self,
        request: SubSpecialtyRequest,
    ) -> Result<Value, UserError> {
        let path = format!(
            "/rest/v1/sub_especialidad?nombre=eq.{}&select=id",
            urlencoding::encode(&request.nombre)
        );
        let existentes: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;
        if !existentes.is_empty() {
            return Err(UserError::DuplicateSubSpecialty(request.nombre));
        }

        let _: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/sub_especialidad",
                Some(json!({
                    "nombre": request.nombre,
                    "descripcion": request.descripcion
                })),
                Some(representation_headers()),
            )
            .await?;

        let subespecialidades = self.list_sub_specialties().await?;
        Ok(json!({
            "mensaje": format!("Subespecialidad '{}' creada.", request.nombre),
            "subespecialidades": subespecialidades
        }))
    }

    pub async fn update_sub_specialty(
        &self,
        sub_id: i64,
        request: SubSpecialtyRequest,
    ) -> Result<Value, UserError> {
        let path = format!("/rest/v1/sub_especialidad?id=eq.{}&select=id", sub_id);
        let existentes: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;
        if existentes.is_empty() {
            return Err(UserError::SubSpecialtyNotFound(sub_id));
        }

        let dup_path = format!(
            "/rest/v1/sub_especialidad?nombre=eq.{}&id=neq.{}&select=id",
            urlencoding::encode(&request.nombre),
            sub_id
        );
        let duplicados: Vec<Value> = self.supabase.request(Method::GET, &dup_path, None).await?;
        if !duplicados.is_empty() {
            return Err(UserError::DuplicateSubSpecialty(request.nombre));
        }

        let update_path = format!("/rest/v1/sub_especialidad?id=eq.{}", sub_id);
        let actualizados: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &update_path,
                Some(json!({
                    "nombre": request.nombre,
                    "descripcion": request.descripcion
                })),
                Some(representation_headers()),
            )
            .await?;
        let subespecialidad = actualizados.into_iter().next().ok_or_else(|| {
            UserError::Database("No se pudo actualizar la subespecialidad.".to_string())
        })?;

        Ok(json!({
            "mensaje": format!("Subespecialidad '{}' modificada.", request.nombre),
            "subespecialidad": subespecialidad
        }))
    }

    pub async fn delete_sub_specialty(&self, sub_id: i64) -> Result<Value, UserError> {
        let path = format!("/rest/v1/sub_especialidad?id=eq.{}&select=id,nombre", sub_id);
        let existentes: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;
        let sub = existentes
            .into_iter()
            .next()
            .ok_or(UserError::SubSpecialtyNotFound(sub_id))?;
        let nombre = sub["nombre"].as_str().unwrap_or_default().to_string();

        let vinculos_path = format!(
            "/rest/v1/especialidad_con_subespecialidad?sub_especialidad_id=eq.{}&select=id&limit=1",
            sub_id
        );
        let vinculos: Vec<Value> = self.supabase.request(Method::GET, &vinculos_path, None).await?;
        if !vinculos.is_empty() {
            return Err(UserError::SpecialtyInUse(format!(
                "No puedes eliminar '{}' porque está vinculada a especialidades.",
                nombre
            )));
        }

        let delete_path = format!("/rest/v1/sub_especialidad?id=eq.{}", sub_id);
        let eliminados: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::DELETE,
                &delete_path,
                None,
                Some(representation_headers()),
            )
            .await?;
        if eliminados.is_empty() {
            return Err(UserError::Database(
                "No se pudo eliminar la subespecialidad.".to_string(),
            ));
        }

        Ok(json!({ "mensaje": format!("Subespecialidad '{}' eliminada correctamente.", nombre) }))
    }

    pub async fn list_sub_specialties(&self) -> Result<Vec<Value>, UserError> {
        let subs: Vec<Value> = self
            .supabase
            .request(
                Method::GET,
                "/rest/v1/sub_especialidad?select=id,nombre,descripcion&order=id.asc",
                None,
            )
            .await?;
        Ok(subs)
    }

    pub async fn link_sub_specialty(
        &self,
        request: SpecialtyLinkRequest,
    ) -> Result<Value, UserError> {
        let path = format!(
            "/rest/v1/especialidad_con_subespecialidad?especialidad_id=eq.{}&sub_especialidad_id=eq.{}&select=id",
            request.especialidad_id, request.sub_especialidad_id
        );
        let existentes: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;
        if !existentes.is_empty() {
            return Err(UserError::DuplicateLink);
        }

        let creados: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/especialidad_con_subespecialidad",
                Some(json!({
                    "especialidad_id": request.especialidad_id,
                    "sub_especialidad_id": request.sub_especialidad_id
                })),
                Some(representation_headers()),
            )
            .await?;
        if creados.is_empty() {
            return Err(UserError::Database("No se pudo crear el vínculo.".to_string()));
        }

        Ok(json!({ "mensaje": "Vínculo creado." }))
    }

    pub async fn unlink_sub_specialty(
        &self,
        request: SpecialtyLinkRequest,
    ) -> Result<Value, UserError> {
        let path = format!(
            "/rest/v1/especialidad_con_subespecialidad?especialidad_id=eq.{}&sub_especialidad_id=eq.{}",
            request.especialidad_id, request.sub_especialidad_id
        );
        let eliminados: Vec<Value> = self
            .supabase
            .request_with_headers(Method::DELETE, &path, None, Some(representation_headers()))
            .await?;
        if eliminados.is_empty() {
            return Err(UserError::LinkNotFound);
        }

        Ok(json!({ "mensaje": "Vínculo eliminado." }))
    }

    pub async fn sub_specialties_of(
        &self,
        especialidad_id: i64,
    ) -> Result<Vec<Value>, UserError> {
        let vinculos_path = format!(
            "/rest/v1/especialidad_con_subespecialidad?especialidad_id=eq.{}&select=sub_especialidad_id",
            especialidad_id
        );
        let vinculos: Vec<Value> = self.supabase.request(Method::GET, &vinculos_path, None).await?;
        let ids: Vec<String> = vinculos
            .iter()
            .filter_map(|v| v["sub_especialidad_id"].as_i64())
            .map(|id| id.to_string())
            .collect();
        if ids.is_empty() {
            return Ok(vec![]);
        }

        let path = format!(
            "/rest/v1/sub_especialidad?id=in.({})&select=id,nombre,descripcion&order=id.asc",
            ids.join(",")
        );
        let subs: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;
        Ok(subs)
    }

    /// Doctor roster with full names and specialty list.
    pub async fn list_doctors(&self) -> Result<Vec<Value>, UserError> {
        let doctores: Vec<Value> = self
            .supabase
            .request(
                Method::GET,
                "/rest/v1/usuario_sistema?rol_id=eq.2&select=id,nombre,apellido_paterno,apellido_materno,rut,email,especialidades:especialidades_doctor(especialidad(nombre))&order=id.asc",
                None,
            )
            .await?;

        let listado = doctores
            .iter()
            .map(|doctor| {
                let nombre = format!(
                    "{} {} {}",
                    doctor["nombre"].as_str().unwrap_or_default(),
                    doctor["apellido_paterno"].as_str().unwrap_or_default(),
                    doctor["apellido_materno"].as_str().unwrap_or_default()
                )
                .trim()
                .to_string();
                let especialidades: Vec<&str> = doctor["especialidades"]
                    .as_array()
                    .map(|rels| {
                        rels.iter()
                            .filter_map(|r| r["especialidad"]["nombre"].as_str())
                            .collect()
                    })
                    .unwrap_or_default();
                json!({
                    "id": doctor["id"],
                    "nombre": nombre,
                    "email": doctor["email"],
                    "persona": { "rut": doctor["rut"] },
                    "especialidades": especialidades.join(", ")
                })
            })
            .collect();
        Ok(listado)
    }
}
