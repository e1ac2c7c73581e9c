use std::sync::Arc;

use axum::{
    routing::{delete, get, post, put},
    Router,
};

use shared_config::AppConfig;

use crate::handlers;

pub fn schedule_routes() -> Router<Arc<AppConfig>> {
    Router::new()
        .route("/crear-bloque", post(handlers::create_block))
        .route(
            "/crear-horario-semanal",
            post(handlers::create_weekly_schedule),
        )
        .route("/listar-horarios", get(handlers::list_blocks))
        .route("/horario/{horario_id}", get(handlers::get_block))
        .route("/modificar-horario/{horario_id}", put(handlers::update_block))
        .route(
            "/eliminar-horario/{horario_id}",
            delete(handlers::delete_block),
        )
        .route(
            "/eliminar-horarios-doctor/{usuario_id}",
            delete(handlers::delete_doctor_blocks),
        )
        .route(
            "/listar-doctores-con-horarios",
            get(handlers::doctors_with_schedules),
        )
        .route("/horarios-disponibles", get(handlers::available_blocks))
}
