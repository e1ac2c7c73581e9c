use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use shared_config::AppConfig;

use crate::handlers;

pub fn attendance_routes() -> Router<Arc<AppConfig>> {
    Router::new()
        .route("/turnos-dia", get(handlers::daily_summary))
        .route("/registrar-entrada", post(handlers::register_entry))
        .route(
            "/registrar-salida/{asistencia_id}",
            post(handlers::register_exit),
        )
        .route("/doctor/mi-turno-hoy", get(handlers::my_shift_today))
        .route("/doctor/marcar-entrada", post(handlers::mark_entry))
        .route("/doctor/marcar-salida", post(handlers::mark_exit))
        .route(
            "/doctor/{doctor_id}/detalle-completo",
            get(handlers::doctor_detail),
        )
        .route(
            "/doctor/{doctor_id}/estadisticas-periodo",
            get(handlers::period_stats),
        )
        .route(
            "/doctor/{doctor_id}/historial-diario",
            get(handlers::daily_history),
        )
        .route(
            "/doctor/{doctor_id}/justificaciones",
            get(handlers::justifications),
        )
        .route(
            "/doctor/{doctor_id}/agregar-justificacion",
            post(handlers::add_justification),
        )
}
