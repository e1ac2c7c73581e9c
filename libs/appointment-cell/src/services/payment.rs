use chrono::Utc;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::debug;

use shared_config::AppConfig;
use shared_database::supabase::{representation_headers, SupabaseClient};
use shared_utils::time::day_bounds;

use crate::models::{AppointmentError, PaymentRequest, VALID_PAYMENT_TYPES};
use crate::services::booking::parse_date;
use crate::services::status::append_status;

pub struct PaymentService {
    supabase: SupabaseClient,
}

impl PaymentService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    /// Registers the payment for an appointment, applies the insurance
    /// discount, links the discount detail to the doctor's service cost and
    /// confirms the appointment.
    pub async fn process_payment(&self, pago: PaymentRequest) -> Result<Value, AppointmentError> {
        let cita_path = format!(
            "/rest/v1/cita_medica?id=eq.{}&select=id,doctor_id",
            pago.cita_medica_id
        );
        let citas: Vec<Value> = self.supabase.request(Method::GET, &cita_path, None).await?;
        let cita = citas
            .first()
            .ok_or(AppointmentError::AppointmentNotFound)?
            .clone();

        if !VALID_PAYMENT_TYPES.contains(&pago.tipo_pago.as_str()) {
            return Err(AppointmentError::InvalidPaymentType(
                VALID_PAYMENT_TYPES.join(", "),
            ));
        }

        let existing_path = format!(
            "/rest/v1/pagos?cita_medica_id=eq.{}&select=id",
            pago.cita_medica_id
        );
        let existing: Vec<Value> = self
            .supabase
            .request(Method::GET, &existing_path, None)
            .await?;
        if !existing.is_empty() {
            return Err(AppointmentError::DuplicatePayment);
        }

        let descuento = pago.descuento_aseguradora.unwrap_or(0.0);
        if !(0.0..=100.0).contains(&descuento) {
            return Err(AppointmentError::InvalidDiscount);
        }
        let monto_final = pago.total * (1.0 - descuento / 100.0);

        debug!(
            "Registering {} payment of {} for appointment {}",
            pago.tipo_pago, monto_final, pago.cita_medica_id
        );

        let created: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/pagos",
                Some(json!({
                    "fecha_pago": Utc::now().format("%Y-%m-%dT%H:%M:%S").to_string(),
                    "tipo_pago": pago.tipo_pago,
                    "total": monto_final,
                    "cita_medica_id": pago.cita_medica_id
                })),
                Some(representation_headers()),
            )
            .await?;
        let nuevo_pago = created
            .into_iter()
            .next()
            .ok_or_else(|| AppointmentError::Database("No se pudo registrar el pago.".to_string()))?;

        if descuento > 0.0 {
            if let (Some(pago_id), Some(doctor_id)) =
                (nuevo_pago["id"].as_i64(), cita["doctor_id"].as_i64())
            {
                self.record_discount_detail(pago_id, doctor_id, descuento)
                    .await?;
            }
        }

        append_status(&self.supabase, pago.cita_medica_id, "Confirmada")
            .await
            .map_err(|e| AppointmentError::Database(e.to_string()))?;

        Ok(json!({
            "mensaje": "Pago procesado exitosamente.",
            "pago": nuevo_pago,
            "monto_original": pago.total,
            "descuento_aplicado": descuento,
            "monto_final": monto_final
        }))
    }

    /// The detail row ties the discount to the service cost of the doctor's
    /// primary specialty. Skipped silently when the doctor has no specialty
    /// or price configured.
    async fn record_discount_detail(
        &self,
        pago_id: i64,
        doctor_id: i64,
        descuento: f64,
    ) -> Result<(), AppointmentError> {
        let specialty_path = format!(
            "/rest/v1/especialidades_doctor?usuario_sistema_id=eq.{}&select=especialidad_id&limit=1",
            doctor_id
        );
        let specialties: Vec<Value> = self
            .supabase
            .request(Method::GET, &specialty_path, None)
            .await?;
        let Some(especialidad_id) = specialties.first().and_then(|r| r["especialidad_id"].as_i64())
        else {
            return Ok(());
        };

        let cost_path = format!(
            "/rest/v1/costos_servicio?especialidad_id=eq.{}&select=id&limit=1",
            especialidad_id
        );
        let costs: Vec<Value> = self.supabase.request(Method::GET, &cost_path, None).await?;
        let Some(costo_servicio_id) = costs.first().and_then(|r| r["id"].as_i64()) else {
            return Ok(());
        };

        let _: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/detalle",
                Some(json!({
                    "descuento_aseguradora": descuento,
                    "costo_servicio_id": costo_servicio_id,
                    "pago_id": pago_id
                })),
                Some(representation_headers()),
            )
            .await?;
        Ok(())
    }

    pub async fn revenue(&self, fecha: Option<&str>) -> Result<Value, AppointmentError> {
        let mut path = "/rest/v1/pagos?select=total,fecha_pago".to_string();
        if let Some(fecha) = fecha.and_then(parse_date) {
            let (start, end) = day_bounds(fecha);
            path.push_str(&format!("&fecha_pago=gte.{}&fecha_pago=lte.{}", start, end));
        }

        let pagos: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;

        let total_ingresos: f64 = pagos.iter().filter_map(|p| p["total"].as_f64()).sum();
        let cantidad_pagos = pagos.len();
        let promedio_pago = if cantidad_pagos > 0 {
            total_ingresos / cantidad_pagos as f64
        } else {
            0.0
        };

        Ok(json!({
            "total_ingresos": (total_ingresos * 100.0).round() / 100.0,
            "cantidad_pagos": cantidad_pagos,
            "promedio_pago": (promedio_pago * 100.0).round() / 100.0
        }))
    }

    pub async fn specialty_price(&self, especialidad_id: i64) -> Result<Value, AppointmentError> {
        let path = format!(
            "/rest/v1/costos_servicio?especialidad_id=eq.{}&select=id,servicio,precio",
            especialidad_id
        );
        let costos: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;
        costos
            .into_iter()
            .next()
            .ok_or(AppointmentError::PriceNotFound)
    }
}
