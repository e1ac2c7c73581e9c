use serde_json::json;
use wiremock::matchers::{header, method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use auth_cell::models::{AuthError, LoginRequest};
use auth_cell::services::AuthService;
use shared_utils::test_utils::{MockSupabaseResponses, TestConfig};

fn service_for(mock_server: &MockServer) -> AuthService {
    let config = TestConfig::for_mock_server(&mock_server.uri()).to_app_config();
    AuthService::new(&config)
}

fn login_request(email: &str, password: &str) -> LoginRequest {
    LoginRequest {
        email: email.to_string(),
        password: password.to_string(),
    }
}

async fn mount_user(mock_server: &MockServer, email: &str, rol_id: i64, rol_nombre: &str) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/usuario_sistema"))
        .and(query_param("email", format!("eq.{}", email)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::usuario_con_rol(1, "Carla", email, rol_id, rol_nombre)
        ])))
        .mount(mock_server)
        .await;
}

async fn mount_password(mock_server: &MockServer, hash: Option<&str>, temporal: Option<&str>) {
    Mock::given(method("GET"))
        .and(path_regex(r"^/rest/v1/contrase.+as$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::contrasena(1, hash, temporal)
        ])))
        .mount(mock_server)
        .await;
}

#[tokio::test]
async fn login_succeeds_for_admin_with_plaintext_password() {
    let mock_server = MockServer::start().await;
    mount_user(&mock_server, "admin@clinica.cl", 3, "Administrador").await;
    mount_password(&mock_server, Some("secreto123"), None).await;

    let response = service_for(&mock_server)
        .login(login_request("admin@clinica.cl", "secreto123"))
        .await
        .expect("login should succeed");

    assert!(response.success);
    assert_eq!(response.redirect_url, "/admin/dashboard");
    assert_eq!(response.data.rol_nombre, "admin");
    assert_eq!(response.data.auth_token.len(), 32);
    assert!(!response.data.contrasena_temporal);
}

#[tokio::test]
async fn login_succeeds_for_doctor_with_bcrypt_hash_and_specialty() {
    let mock_server = MockServer::start().await;
    mount_user(&mock_server, "doc@clinica.cl", 2, "Médico").await;

    let hash = bcrypt::hash("consulta2025", 4).unwrap();
    mount_password(&mock_server, Some(&hash), None).await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/especialidades_doctor"))
        .and(query_param("usuario_sistema_id", "eq.1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "especialidad_id": 4,
            "especialidad": {"id": 4, "nombre": "Medicina General"}
        }])))
        .mount(&mock_server)
        .await;

    let response = service_for(&mock_server)
        .login(login_request("doc@clinica.cl", "consulta2025"))
        .await
        .expect("login should succeed");

    assert_eq!(response.redirect_url, "/doctor/dashboard");
    assert_eq!(response.data.especialidad_id, Some(4));
    assert_eq!(
        response.data.especialidad_nombre.as_deref(),
        Some("Medicina General")
    );
}

#[tokio::test]
async fn login_flags_temporary_password_accounts() {
    let mock_server = MockServer::start().await;
    mount_user(&mock_server, "nueva@clinica.cl", 4, "Secretaria").await;
    mount_password(&mock_server, None, Some("temporal99")).await;

    let response = service_for(&mock_server)
        .login(login_request("nueva@clinica.cl", "temporal99"))
        .await
        .expect("login should succeed");

    assert!(response.data.contrasena_temporal);
    assert_eq!(response.redirect_url, "/secretaria/dashboard");
}

#[tokio::test]
async fn login_rejects_unknown_email() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/usuario_sistema"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let err = service_for(&mock_server)
        .login(login_request("nadie@clinica.cl", "lo-que-sea"))
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::InvalidCredentials));
}

#[tokio::test]
async fn login_rejects_wrong_password() {
    let mock_server = MockServer::start().await;
    mount_user(&mock_server, "admin@clinica.cl", 3, "admin").await;
    mount_password(&mock_server, Some("secreto123"), None).await;

    let err = service_for(&mock_server)
        .login(login_request("admin@clinica.cl", "incorrecta"))
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::InvalidCredentials));
}

#[tokio::test]
async fn login_rejects_unmapped_role() {
    let mock_server = MockServer::start().await;
    mount_user(&mock_server, "kine@clinica.cl", 7, "Kinesiologo").await;
    mount_password(&mock_server, Some("secreto123"), None).await;

    let err = service_for(&mock_server)
        .login(login_request("kine@clinica.cl", "secreto123"))
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::UnauthorizedRole(_)));
}

#[tokio::test]
async fn temp_password_change_enforces_minimum_length() {
    let mock_server = MockServer::start().await;

    let err = service_for(&mock_server)
        .change_temp_password(1, "corta")
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::Validation(_)));
}

#[tokio::test]
async fn temp_password_change_reports_missing_user() {
    let mock_server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path_regex(r"^/rest/v1/contrase.+as$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let err = service_for(&mock_server)
        .change_temp_password(99, "definitiva123")
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::UserNotFound));
}

#[tokio::test]
async fn temp_password_change_hashes_and_clears_temporary() {
    let mock_server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path_regex(r"^/rest/v1/contrase.+as$"))
        .and(query_param("id_profesional_salud", "eq.1"))
        .and(header("Prefer", "return=representation"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::contrasena(1, Some("$2b$04$hash"), None)
        ])))
        .mount(&mock_server)
        .await;

    service_for(&mock_server)
        .change_temp_password(1, "definitiva123")
        .await
        .expect("change should succeed");
}
