use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};

use appointment_cell::router::appointment_routes;
use attendance_cell::router::attendance_routes;
use auth_cell::router::auth_routes;
use dashboard_cell::router::dashboard_routes;
use diagnosis_cell::router::diagnosis_routes;
use patient_cell::router::patient_routes;
use schedule_cell::router::schedule_routes;
use settings_cell::router::settings_routes;
use shared_config::AppConfig;
use user_cell::router::{doctor_admin_routes, profile_routes, role_routes};

pub fn create_router(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(banner))
        .route("/connection", get(connection))
        .nest("/auth", auth_routes())
        .nest("/Roles", role_routes())
        .nest("/doctores", doctor_admin_routes())
        .nest("/Perfil", profile_routes())
        .nest("/Pacientes", patient_routes())
        .nest("/Citas", appointment_routes())
        .nest("/Horarios", schedule_routes())
        .nest("/asistencia", attendance_routes())
        .nest("/Diagnosticos", diagnosis_routes())
        .nest("/Dashboard", dashboard_routes())
        .nest("/Configuracion", settings_routes())
        .with_state(state)
}

async fn banner() -> Json<Value> {
    Json(json!({
        "message": "Gestión de horarios médicos",
        "Database": "Supabase",
        "Framework": "axum",
        "Version": env!("CARGO_PKG_VERSION")
    }))
}

async fn connection(State(config): State<Arc<AppConfig>>) -> Json<Value> {
    if config.is_configured() {
        Json(json!({
            "status": "success",
            "message": "Cliente inicializado correctamente"
        }))
    } else {
        Json(json!({
            "status": "error",
            "message": "Cliente no está inicializado"
        }))
    }
}
