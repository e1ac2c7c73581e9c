use std::sync::Arc;

use axum::{
    routing::{post, put},
    Router,
};

use shared_config::AppConfig;

use crate::handlers::*;

pub fn auth_routes() -> Router<Arc<AppConfig>> {
    Router::new()
        .route("/login", post(login))
        .route("/cambiar-contrasena-temporal", put(change_temp_password))
        .route("/logout", post(logout))
}
