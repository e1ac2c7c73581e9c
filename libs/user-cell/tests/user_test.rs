use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use shared_utils::test_utils::{MockSupabaseResponses, TestConfig};
use user_cell::models::{
    ChangePasswordRequest, RoleRequest, SpecialtyLinkRequest, SpecialtyRequest, UserError,
    UserRequest,
};
use user_cell::services::{ProfileService, RoleService, SpecialtyService, UserService};

fn config_for(mock_server: &MockServer) -> shared_config::AppConfig {
    TestConfig::for_mock_server(&mock_server.uri()).to_app_config()
}

fn user_request() -> UserRequest {
    UserRequest {
        nombre: "Carla".to_string(),
        apellido_paterno: "Soto".to_string(),
        apellido_materno: None,
        rut: "12.345.678-9".to_string(),
        email: "carla@clinica.cl".to_string(),
        celular: None,
        cel_secundario: None,
        direccion: None,
        rol_id: 2,
        especialidad_id: None,
    }
}

#[tokio::test]
async fn duplicate_role_name_is_rejected() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/rol"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::rol(1, "Administrador")
        ])))
        .mount(&mock_server)
        .await;

    let err = RoleService::new(&config_for(&mock_server))
        .create_role(RoleRequest {
            nombre: "Administrador".to_string(),
            descripcion: None,
        })
        .await
        .unwrap_err();

    assert!(matches!(err, UserError::DuplicateRole(_)));
}

#[tokio::test]
async fn role_creation_returns_refreshed_list() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/rol"))
        .and(query_param("nombre", "eq.Recepcionista"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/rol"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockSupabaseResponses::rol(4, "Recepcionista")
        ])))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/rol"))
        .and(query_param("order", "id.asc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::rol(1, "Administrador"),
            MockSupabaseResponses::rol(4, "Recepcionista")
        ])))
        .mount(&mock_server)
        .await;

    let resultado = RoleService::new(&config_for(&mock_server))
        .create_role(RoleRequest {
            nombre: "Recepcionista".to_string(),
            descripcion: Some("Mesa de entrada".to_string()),
        })
        .await
        .expect("role creation should succeed");

    assert_eq!(
        resultado["mensaje"],
        "Rol 'Recepcionista' creado correctamente."
    );
    assert_eq!(resultado["roles_actuales"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn user_with_existing_rut_or_email_is_rejected() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/usuario_sistema"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 7}])))
        .mount(&mock_server)
        .await;

    let err = UserService::new(&config_for(&mock_server))
        .create_user(user_request())
        .await
        .unwrap_err();

    assert!(matches!(err, UserError::DuplicateUser));
}

#[tokio::test]
async fn user_creation_normalizes_rut_and_links_specialty() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/usuario_sistema"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/usuario_sistema"))
        .and(body_partial_json(json!({"rut": "123456789"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockSupabaseResponses::usuario(10, "Carla", "carla@clinica.cl", 2)
        ])))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/especialidades_doctor"))
        .and(body_partial_json(json!({"especialidad_id": 3})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([{"id": 1}])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut request = user_request();
    request.especialidad_id = Some(3);

    let resultado = UserService::new(&config_for(&mock_server))
        .create_user(request)
        .await
        .expect("user creation should succeed");

    assert_eq!(resultado["mensaje"], "Usuario creado correctamente.");
    assert_eq!(resultado["usuario"]["id"], 10);
}

#[tokio::test]
async fn specialty_creation_registers_consultation_price() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/especialidad"))
        .and(query_param("nombre", "eq.Dermatología"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/especialidad"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockSupabaseResponses::especialidad(5, "Dermatología")
        ])))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/costos_servicio"))
        .and(body_partial_json(json!({
            "servicio": "Consulta Dermatología",
            "precio": 25000.0
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([{"id": 1}])))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/especialidad"))
        .and(query_param("order", "id.asc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::especialidad(5, "Dermatología")
        ])))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/costos_servicio"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"especialidad_id": 5, "precio": 25000.0}
        ])))
        .mount(&mock_server)
        .await;

    let resultado = SpecialtyService::new(&config_for(&mock_server))
        .create_specialty(SpecialtyRequest {
            nombre: "Dermatología".to_string(),
            descripcion: None,
            precio: Some(25000.0),
        })
        .await
        .expect("specialty creation should succeed");

    assert_eq!(resultado["especialidades"][0]["precio"], 25000.0);
}

#[tokio::test]
async fn referenced_specialty_cannot_be_deleted() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/especialidad"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::especialidad(5, "Dermatología")
        ])))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/especialidad_con_subespecialidad"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 2}])))
        .mount(&mock_server)
        .await;

    let err = SpecialtyService::new(&config_for(&mock_server))
        .delete_specialty(5)
        .await
        .unwrap_err();

    assert!(matches!(err, UserError::SpecialtyInUse(_)));
}

#[tokio::test]
async fn duplicate_sub_specialty_link_is_rejected() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/especialidad_con_subespecialidad"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 3}])))
        .mount(&mock_server)
        .await;

    let err = SpecialtyService::new(&config_for(&mock_server))
        .link_sub_specialty(SpecialtyLinkRequest {
            especialidad_id: 5,
            sub_especialidad_id: 9,
        })
        .await
        .unwrap_err();

    assert!(matches!(err, UserError::DuplicateLink));
}

#[tokio::test]
async fn removing_missing_link_returns_not_found() {
    let mock_server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/rest/v1/especialidad_con_subespecialidad"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let err = SpecialtyService::new(&config_for(&mock_server))
        .unlink_sub_specialty(SpecialtyLinkRequest {
            especialidad_id: 5,
            sub_especialidad_id: 9,
        })
        .await
        .unwrap_err();

    assert!(matches!(err, UserError::LinkNotFound));
}

#[tokio::test]
async fn doctor_roster_builds_full_names() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/usuario_sistema"))
        .and(query_param("rol_id", "eq.2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": 2,
            "nombre": "Pedro",
            "apellido_paterno": "Rojas",
            "apellido_materno": "Lagos",
            "rut": "123456789",
            "email": "pedro@clinica.cl",
            "especialidades": [
                {"especialidad": {"nombre": "Dermatología"}},
                {"especialidad": {"nombre": "Pediatría"}}
            ]
        }])))
        .mount(&mock_server)
        .await;

    let doctores = SpecialtyService::new(&config_for(&mock_server))
        .list_doctors()
        .await
        .unwrap();

    assert_eq!(doctores[0]["nombre"], "Pedro Rojas Lagos");
    assert_eq!(doctores[0]["especialidades"], "Dermatología, Pediatría");
}

#[tokio::test]
async fn unknown_profile_returns_not_found() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/usuario_sistema"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let err = ProfileService::new(&config_for(&mock_server))
        .get_profile(99)
        .await
        .unwrap_err();

    assert!(matches!(err, UserError::UserNotFound));
}

#[tokio::test]
async fn doctor_stats_count_unique_completed_patients() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/usuario_sistema"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 2}])))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/cita_medica"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "fecha_atencion": "2025-04-01T12:00:00", "paciente_id": 30},
            {"id": 2, "fecha_atencion": "2025-04-08T12:00:00", "paciente_id": 30},
            {"id": 3, "fecha_atencion": "2025-04-15T12:00:00", "paciente_id": 31}
        ])))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/estado"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"cita_medica_id": 1, "estado": "Completada"},
            {"cita_medica_id": 2, "estado": "Completada"},
            {"cita_medica_id": 3, "estado": "Cancelada"}
        ])))
        .mount(&mock_server)
        .await;

    let resultado = ProfileService::new(&config_for(&mock_server))
        .doctor_stats(2)
        .await
        .unwrap();

    assert_eq!(resultado["estadisticas"]["pacientes_atendidos"], 1);
    assert_eq!(resultado["estadisticas"]["total_citas_completadas"], 2);
}

#[tokio::test]
async fn password_change_rejects_wrong_current_password() {
    let mock_server = MockServer::start().await;

    let hash = bcrypt::hash("correcta123", 4).unwrap();
    Mock::given(method("GET"))
        .and(path_regex(r"^/rest/v1/contrase.+as$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "contraseña": hash}
        ])))
        .mount(&mock_server)
        .await;

    let err = ProfileService::new(&config_for(&mock_server))
        .change_password(
            2,
            ChangePasswordRequest {
                password_actual: "equivocada".to_string(),
                password_nueva: "nueva12345".to_string(),
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, UserError::WrongPassword));
}

#[tokio::test]
async fn password_change_stores_new_hash() {
    let mock_server = MockServer::start().await;

    let hash = bcrypt::hash("correcta123", 4).unwrap();
    Mock::given(method("GET"))
        .and(path_regex(r"^/rest/v1/contrase.+as$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "contraseña": hash}
        ])))
        .mount(&mock_server)
        .await;
    Mock::given(method("PATCH"))
        .and(path_regex(r"^/rest/v1/contrase.+as$"))
        .and(body_partial_json(json!({"contraseña_temporal": null})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 1}])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let resultado = ProfileService::new(&config_for(&mock_server))
        .change_password(
            2,
            ChangePasswordRequest {
                password_actual: "correcta123".to_string(),
                password_nueva: "nueva12345".to_string(),
            },
        )
        .await
        .expect("password change should succeed");

    assert_eq!(resultado["mensaje"], "Contraseña actualizada correctamente.");
}
