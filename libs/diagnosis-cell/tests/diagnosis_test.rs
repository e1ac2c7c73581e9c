use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use diagnosis_cell::models::{DiagnosisError, DiagnosisListQuery, DiagnosisRequest};
use diagnosis_cell::services::DiagnosisService;
use shared_utils::test_utils::{MockSupabaseResponses, TestConfig};

fn service_for(mock_server: &MockServer) -> DiagnosisService {
    let config = TestConfig::for_mock_server(&mock_server.uri()).to_app_config();
    DiagnosisService::new(&config)
}

fn diagnosis_request(nombre: &str) -> DiagnosisRequest {
    DiagnosisRequest {
        nombre_enfermedad: nombre.to_string(),
        descripcion_enfermedad: None,
    }
}

#[tokio::test]
async fn duplicate_disease_name_is_rejected() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/diagnosticos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::diagnostico(1, "Hipertensión")
        ])))
        .mount(&mock_server)
        .await;

    let err = service_for(&mock_server)
        .create_diagnosis(diagnosis_request("Hipertensión"))
        .await
        .unwrap_err();

    assert!(matches!(err, DiagnosisError::DuplicateName(_)));
}

#[tokio::test]
async fn diagnosis_creation_inserts_row() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/diagnosticos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/diagnosticos"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockSupabaseResponses::diagnostico(8, "Diabetes tipo 2")
        ])))
        .mount(&mock_server)
        .await;

    let resultado = service_for(&mock_server)
        .create_diagnosis(diagnosis_request("Diabetes tipo 2"))
        .await
        .expect("creation should succeed");

    assert_eq!(
        resultado["mensaje"],
        "Diagnóstico 'Diabetes tipo 2' creado correctamente."
    );
    assert_eq!(resultado["diagnostico"]["id"], 8);
}

#[tokio::test]
async fn unknown_diagnosis_update_returns_not_found() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/diagnosticos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let err = service_for(&mock_server)
        .update_diagnosis(42, diagnosis_request("Asma"))
        .await
        .unwrap_err();

    assert!(matches!(err, DiagnosisError::NotFound(42)));
}

#[tokio::test]
async fn diagnosis_used_in_appointments_cannot_be_deleted() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/diagnosticos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::diagnostico(3, "Asma")
        ])))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/informacion_cita"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 12}])))
        .mount(&mock_server)
        .await;

    let err = service_for(&mock_server)
        .delete_diagnosis(3)
        .await
        .unwrap_err();

    assert!(matches!(err, DiagnosisError::InUse(_)));
}

#[tokio::test]
async fn unused_diagnosis_is_deleted() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/diagnosticos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::diagnostico(3, "Asma")
        ])))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/informacion_cita"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/rest/v1/diagnosticos"))
        .and(query_param("id", "eq.3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::diagnostico(3, "Asma")
        ])))
        .mount(&mock_server)
        .await;

    let resultado = service_for(&mock_server)
        .delete_diagnosis(3)
        .await
        .expect("deletion should succeed");

    assert_eq!(resultado["mensaje"], "Diagnóstico 'Asma' eliminado correctamente.");
}

#[tokio::test]
async fn listing_paginates_and_reports_totals() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/diagnosticos"))
        .and(query_param("limit", "6"))
        .and(query_param("offset", "6"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-range", "6-11/20")
                .set_body_json(json!([
                    MockSupabaseResponses::diagnostico(7, "Asma"),
                    MockSupabaseResponses::diagnostico(8, "Diabetes tipo 2")
                ])),
        )
        .mount(&mock_server)
        .await;

    let resultado = service_for(&mock_server)
        .list_diagnoses(DiagnosisListQuery {
            page: 2,
            limit: 6,
            search: None,
        })
        .await
        .unwrap();

    assert_eq!(resultado["pagination"]["total"], 20);
    assert_eq!(resultado["pagination"]["total_pages"], 4);
    assert_eq!(resultado["pagination"]["has_next"], true);
    assert_eq!(resultado["pagination"]["has_prev"], true);
}

#[tokio::test]
async fn listing_caps_page_size() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/diagnosticos"))
        .and(query_param("limit", "50"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-range", "0-49/60")
                .set_body_json(json!([])),
        )
        .mount(&mock_server)
        .await;

    let resultado = service_for(&mock_server)
        .list_diagnoses(DiagnosisListQuery {
            page: 1,
            limit: 500,
            search: None,
        })
        .await
        .unwrap();

    assert_eq!(resultado["pagination"]["limit"], 50);
}

#[tokio::test]
async fn stats_split_used_and_unused_diagnoses() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/diagnosticos"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-range", "0-0/5")
                .set_body_json(json!([{"id": 1}])),
        )
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/informacion_cita"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"diagnostico_id": 1},
            {"diagnostico_id": 1},
            {"diagnostico_id": 2},
            {"diagnostico_id": null}
        ])))
        .mount(&mock_server)
        .await;

    let resultado = service_for(&mock_server).diagnosis_stats().await.unwrap();

    assert_eq!(resultado["total_diagnosticos"], 5);
    assert_eq!(resultado["diagnosticos_con_uso"], 2);
    assert_eq!(resultado["diagnosticos_sin_uso"], 3);
    assert_eq!(resultado["total_usos"], 3);
}
