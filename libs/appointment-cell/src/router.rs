use std::sync::Arc;

use axum::{
    routing::{delete, get, post, put},
    Router,
};

use shared_config::AppConfig;

use crate::handlers::*;

pub fn appointment_routes() -> Router<Arc<AppConfig>> {
    Router::new()
        .route("/crear-cita", post(create_appointment))
        .route("/listar-citas", get(list_appointments))
        .route("/cita/{id}", get(get_appointment))
        .route("/modificar-cita/{id}", put(update_appointment))
        .route("/modificar-informacion/{id}", put(update_consultation_info))
        .route("/cambiar-estado/{id}", put(change_status))
        .route("/historial-estados/{id}", get(status_history))
        .route("/cancelar-cita/{id}", delete(cancel_appointment))
        .route("/listar-especialidades", get(list_specialties))
        .route("/listar-doctores", get(list_doctors))
        .route("/estadisticas", get(appointment_stats))
        .route("/procesar-pago", post(process_payment))
        .route("/ingresos", get(revenue))
        .route("/precio-especialidad/{id}", get(specialty_price))
        .route("/diagnosticos", get(list_diagnoses))
        .route("/doctor/{id}/citas", get(doctor_agenda))
        .route("/doctor/{id}/stats", get(doctor_stats))
        .route("/doctor/{id}/cita-en-consulta", get(current_in_consultation))
        .route("/cita/{id}/cambiar-estado", put(change_status))
        .route("/cita/{id}/detalle-completo", get(appointment_full_detail))
        .route("/cita/{id}/guardar-consulta", put(save_consultation))
}
