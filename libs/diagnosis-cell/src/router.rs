use std::sync::Arc;

use axum::{
    routing::{delete, get, post, put},
    Router,
};

use shared_config::AppConfig;

use crate::handlers;

pub fn diagnosis_routes() -> Router<Arc<AppConfig>> {
    Router::new()
        .route("/crear-diagnostico", post(handlers::create_diagnosis))
        .route(
            "/modificar-diagnostico/{diagnostico_id}",
            put(handlers::update_diagnosis),
        )
        .route(
            "/eliminar-diagnostico/{diagnostico_id}",
            delete(handlers::delete_diagnosis),
        )
        .route("/listar-diagnosticos", get(handlers::list_diagnoses))
        .route("/estadisticas-diagnosticos", get(handlers::diagnosis_stats))
}
