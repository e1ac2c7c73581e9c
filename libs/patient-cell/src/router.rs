use std::sync::Arc;

use axum::{
    routing::{delete, get, post, put},
    Router,
};

use shared_config::AppConfig;

use crate::handlers::*;

pub fn patient_routes() -> Router<Arc<AppConfig>> {
    Router::new()
        .route("/crear-paciente", post(create_patient))
        .route("/modificar-paciente/{id}", put(update_patient))
        .route("/eliminar-paciente/{id}", delete(delete_patient))
        .route("/listar-pacientes", get(list_patients))
        .route("/listar-prevenciones", get(list_prevenciones))
        .route("/crear-prevencion", post(create_prevencion))
}
