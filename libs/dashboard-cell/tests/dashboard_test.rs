use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use dashboard_cell::models::RecentAppointmentsQuery;
use dashboard_cell::services::DashboardService;
use shared_utils::test_utils::TestConfig;

fn service_for(mock_server: &MockServer) -> DashboardService {
    let config = TestConfig::for_mock_server(&mock_server.uri()).to_app_config();
    DashboardService::new(&config)
}

#[tokio::test]
async fn stats_prefer_server_side_aggregation() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/dashboard_estadisticas"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total_pacientes": 120,
            "citas_hoy": 9,
            "doctores_activos": 4,
            "ingresos_mes": 1850000.0
        })))
        .mount(&mock_server)
        .await;

    let resultado = service_for(&mock_server).stats().await.unwrap();

    assert_eq!(resultado["estadisticas"]["total_pacientes"], 120);
    assert_eq!(resultado["estadisticas"]["citas_hoy"], 9);
}

#[tokio::test]
async fn stats_fall_back_to_direct_queries() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/dashboard_estadisticas"))
        .respond_with(ResponseTemplate::new(404).set_body_string("function not found"))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/paciente"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-range", "0-0/57")
                .set_body_json(json!([{"id": 1}])),
        )
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/cita_medica"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-range", "0-0/6")
                .set_body_json(json!([{"id": 1}])),
        )
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/usuario_sistema"))
        .and(query_param("rol_id", "eq.2"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-range", "0-0/3")
                .set_body_json(json!([{"id": 2}])),
        )
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/pagos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"total": 15000.0},
            {"total": 20000.0}
        ])))
        .mount(&mock_server)
        .await;

    let resultado = service_for(&mock_server).stats().await.unwrap();

    assert_eq!(resultado["estadisticas"]["total_pacientes"], 57);
    assert_eq!(resultado["estadisticas"]["citas_hoy"], 6);
    assert_eq!(resultado["estadisticas"]["doctores_activos"], 3);
    assert_eq!(resultado["estadisticas"]["ingresos_mes"], 35000.0);
}

#[tokio::test]
async fn recent_appointments_cap_requested_limit() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/cita_medica"))
        .and(query_param("limit", "20"))
        .and(query_param("estado.order", "id.asc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": 4,
            "fecha_atencion": "2025-06-16T15:30:00",
            "paciente": {"nombre": "Ana", "apellido_paterno": "Reyes"},
            "doctor": {"nombre": "Pedro", "apellido_paterno": "Rojas"},
            "estado": [{"estado": "Confirmada"}]
        }])))
        .mount(&mock_server)
        .await;

    let resultado = service_for(&mock_server)
        .recent_appointments(RecentAppointmentsQuery { limite: 500 })
        .await
        .unwrap();

    let citas = resultado["citas"].as_array().unwrap();
    assert_eq!(citas.len(), 1);
    assert_eq!(citas[0]["patient"], "Ana Reyes");
    assert_eq!(citas[0]["status"], "Confirmada");
}
