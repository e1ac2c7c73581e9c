use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use settings_cell::models::{
    BulkSettingItem, CreateSettingRequest, SettingListQuery, SettingsError, UpdateSettingRequest,
};
use settings_cell::services::SettingsService;
use shared_utils::test_utils::{MockSupabaseResponses, TestConfig};

fn service_for(mock_server: &MockServer) -> SettingsService {
    let config = TestConfig::for_mock_server(&mock_server.uri()).to_app_config();
    SettingsService::new(&config)
}

#[tokio::test]
async fn listing_filters_by_category() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/configuracion_sistema"))
        .and(query_param("categoria", "eq.citas"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::configuracion(1, "duracion_cita", "30")
        ])))
        .mount(&mock_server)
        .await;

    let resultado = service_for(&mock_server)
        .list_settings(SettingListQuery {
            categoria: Some("citas".to_string()),
        })
        .await
        .unwrap();

    assert_eq!(resultado["total"], 1);
    assert_eq!(resultado["configuraciones"][0]["clave"], "duracion_cita");
}

#[tokio::test]
async fn unknown_key_returns_not_found() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/configuracion_sistema"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let err = service_for(&mock_server)
        .get_setting("no_existe")
        .await
        .unwrap_err();

    assert!(matches!(err, SettingsError::NotFound(_)));
}

#[tokio::test]
async fn value_update_patches_existing_row() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/configuracion_sistema"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::configuracion(1, "duracion_cita", "30")
        ])))
        .mount(&mock_server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/configuracion_sistema"))
        .and(query_param("clave", "eq.duracion_cita"))
        .and(body_partial_json(json!({"valor": "45"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::configuracion(1, "duracion_cita", "45")
        ])))
        .mount(&mock_server)
        .await;

    let resultado = service_for(&mock_server)
        .update_setting(
            "duracion_cita",
            UpdateSettingRequest {
                valor: "45".to_string(),
            },
        )
        .await
        .expect("update should succeed");

    assert_eq!(resultado["configuracion"]["valor"], "45");
}

#[tokio::test]
async fn duplicate_key_is_rejected() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/configuracion_sistema"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 1}])))
        .mount(&mock_server)
        .await;

    let err = service_for(&mock_server)
        .create_setting(CreateSettingRequest {
            clave: "duracion_cita".to_string(),
            valor: Some("30".to_string()),
            tipo: "numero".to_string(),
            categoria: "citas".to_string(),
            descripcion: None,
        })
        .await
        .unwrap_err();

    assert!(matches!(err, SettingsError::DuplicateKey(_)));
}

#[tokio::test]
async fn bulk_update_collects_per_key_errors() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/configuracion_sistema"))
        .and(query_param("clave", "eq.duracion_cita"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::configuracion(1, "duracion_cita", "45")
        ])))
        .mount(&mock_server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/configuracion_sistema"))
        .and(query_param("clave", "eq.no_existe"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let resultado = service_for(&mock_server)
        .update_many(vec![
            BulkSettingItem {
                clave: Some("duracion_cita".to_string()),
                valor: Some("45".to_string()),
            },
            BulkSettingItem {
                clave: Some("no_existe".to_string()),
                valor: Some("x".to_string()),
            },
            BulkSettingItem {
                clave: None,
                valor: Some("y".to_string()),
            },
        ])
        .await
        .unwrap();

    assert_eq!(
        resultado["mensaje"],
        "Se actualizaron 1 configuraciones correctamente."
    );
    assert_eq!(resultado["actualizados"].as_array().unwrap().len(), 1);
    assert_eq!(resultado["errores"].as_array().unwrap().len(), 2);
}
