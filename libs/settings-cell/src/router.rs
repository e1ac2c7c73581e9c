use std::sync::Arc;

use axum::{
    routing::{get, post, put},
    Router,
};

use shared_config::AppConfig;

use crate::handlers;

pub fn settings_routes() -> Router<Arc<AppConfig>> {
    Router::new()
        .route("/listar", get(handlers::list_settings))
        .route("/obtener/{clave}", get(handlers::get_setting))
        .route("/actualizar-multiple", put(handlers::update_many))
        .route("/actualizar/{clave}", put(handlers::update_setting))
        .route("/crear", post(handlers::create_setting))
}
