use std::sync::Arc;

use axum::{routing::get, Router};

use shared_config::AppConfig;

use crate::handlers;

pub fn dashboard_routes() -> Router<Arc<AppConfig>> {
    Router::new()
        .route("/estadisticas", get(handlers::stats))
        .route("/citas-recientes", get(handlers::recent_appointments))
}
