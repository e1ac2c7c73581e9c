use std::sync::Arc;

use axum::{
    routing::{delete, get, post, put},
    Router,
};

use shared_config::AppConfig;

use crate::handlers;

pub fn role_routes() -> Router<Arc<AppConfig>> {
    Router::new()
        .route("/crear-rol", post(handlers::create_role))
        .route("/modificar-rol/{rol_id}", put(handlers::update_role))
        .route("/eliminar-rol/{rol_id}", delete(handlers::delete_role))
        .route("/listar-roles", get(handlers::list_roles))
        .route("/crear-usuario", post(handlers::create_user))
        .route("/modificar-usuario/{usuario_id}", put(handlers::update_user))
        .route(
            "/eliminar-usuario/{usuario_id}",
            delete(handlers::delete_user),
        )
        .route("/listar-usuarios", get(handlers::list_users))
}

pub fn doctor_admin_routes() -> Router<Arc<AppConfig>> {
    Router::new()
        .route("/crear-especialidad", post(handlers::create_specialty))
        .route(
            "/modificar-especialidad/{especialidad_id}",
            put(handlers::update_specialty),
        )
        .route(
            "/eliminar-especialidad/{especialidad_id}",
            delete(handlers::delete_specialty),
        )
        .route(
            "/crear-subespecialidad",
            post(handlers::create_sub_specialty),
        )
        .route(
            "/modificar-subespecialidad/{sub_id}",
            put(handlers::update_sub_specialty),
        )
        .route(
            "/eliminar-subespecialidad/{sub_id}",
            delete(handlers::delete_sub_specialty),
        )
        .route(
            "/vincular-subespecialidad",
            post(handlers::link_sub_specialty),
        )
        .route(
            "/desvincular-subespecialidad",
            delete(handlers::unlink_sub_specialty),
        )
        .route("/especialidades", get(handlers::list_specialties))
        .route("/listar", get(handlers::list_doctors))
        .route("/subespecialidades", get(handlers::list_sub_specialties))
        .route(
            "/especialidades/{especialidad_id}/subespecialidades",
            get(handlers::sub_specialties_of),
        )
}

pub fn profile_routes() -> Router<Arc<AppConfig>> {
    Router::new()
        .route("/obtener/{usuario_id}", get(handlers::get_profile))
        .route("/actualizar/{usuario_id}", put(handlers::update_profile))
        .route(
            "/doctor/{doctor_id}",
            get(handlers::doctor_profile).put(handlers::update_doctor_profile),
        )
        .route(
            "/doctor/{doctor_id}/estadisticas",
            get(handlers::doctor_stats),
        )
        .route(
            "/doctor/{doctor_id}/cambiar-password",
            post(handlers::change_password),
        )
}
