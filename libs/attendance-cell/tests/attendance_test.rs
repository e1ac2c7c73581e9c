use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use attendance_cell::models::{AttendanceError, HistoryQuery, JustificationRequest};
use attendance_cell::services::{AttendanceService, ReportService};
use shared_utils::test_utils::{MockSupabaseResponses, TestConfig};

fn attendance_for(mock_server: &MockServer) -> AttendanceService {
    let config = TestConfig::for_mock_server(&mock_server.uri()).to_app_config();
    AttendanceService::new(&config)
}

fn reports_for(mock_server: &MockServer) -> ReportService {
    let config = TestConfig::for_mock_server(&mock_server.uri()).to_app_config();
    ReportService::new(&config)
}

#[tokio::test]
async fn entry_rejects_open_shift() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/asistencia"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 3}])))
        .mount(&mock_server)
        .await;

    let err = attendance_for(&mock_server)
        .register_entry(5)
        .await
        .unwrap_err();

    assert!(matches!(err, AttendanceError::ActiveShift));
}

#[tokio::test]
async fn entry_inserts_attendance_row() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/asistencia"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/asistencia"))
        .and(body_partial_json(json!({"usuario_sistema_id": 5})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockSupabaseResponses::asistencia(12, 5, "2025-06-16T12:01:00", None)
        ])))
        .mount(&mock_server)
        .await;

    let asistencia = attendance_for(&mock_server)
        .register_entry(5)
        .await
        .expect("entry should succeed");

    assert_eq!(asistencia["id"], 12);
    assert!(asistencia["finalizacion_turno"].is_null());
}

#[tokio::test]
async fn exit_rejects_unknown_record() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/asistencia"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let err = attendance_for(&mock_server)
        .register_exit(99)
        .await
        .unwrap_err();

    assert!(matches!(err, AttendanceError::RecordNotFound));
}

#[tokio::test]
async fn exit_rejects_finished_shift() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/asistencia"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::asistencia(12, 5, "2025-06-16T12:01:00", Some("2025-06-16T18:00:00"))
        ])))
        .mount(&mock_server)
        .await;

    let err = attendance_for(&mock_server)
        .register_exit(12)
        .await
        .unwrap_err();

    assert!(matches!(err, AttendanceError::ShiftFinished));
}

#[tokio::test]
async fn self_service_entry_requires_scheduled_shift() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/horarios_personal"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let err = attendance_for(&mock_server).mark_entry(5).await.unwrap_err();

    assert!(matches!(err, AttendanceError::NoShiftToday));
}

#[tokio::test]
async fn self_service_exit_requires_prior_entry() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/asistencia"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let err = attendance_for(&mock_server).mark_exit(5).await.unwrap_err();

    assert!(matches!(err, AttendanceError::NoEntryToday));
}

#[tokio::test]
async fn shift_view_reports_no_shift_when_unscheduled() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/horarios_personal"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let turno = attendance_for(&mock_server)
        .my_shift_today(5, Some("2025-06-16"))
        .await
        .unwrap();

    assert_eq!(turno["tiene_turno"], false);
}

#[tokio::test]
async fn shift_view_computes_delay_against_schedule() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/horarios_personal"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::horario(1, 5, "2025-06-16T12:00:00", "2025-06-16T13:00:00"),
            MockSupabaseResponses::horario(2, 5, "2025-06-16T13:00:00", "2025-06-16T18:00:00")
        ])))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/asistencia"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::asistencia(12, 5, "2025-06-16T12:10:00", Some("2025-06-16T18:10:00"))
        ])))
        .mount(&mock_server)
        .await;

    let turno = attendance_for(&mock_server)
        .my_shift_today(5, Some("2025-06-16"))
        .await
        .unwrap();

    assert_eq!(turno["tiene_turno"], true);
    assert_eq!(turno["turno_programado"]["total_bloques"], 2);
    assert_eq!(turno["asistencia"]["minutos_atraso"], 10);
    assert_eq!(turno["asistencia"]["horas_trabajadas"], 6.0);
    assert_eq!(turno["puede_marcar_entrada"], false);
    assert_eq!(turno["puede_marcar_salida"], false);
}

#[tokio::test]
async fn daily_board_is_empty_without_schedules() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/horarios_personal"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let resumen = attendance_for(&mock_server)
        .daily_summary(Some("2025-06-16"))
        .await
        .unwrap();

    assert_eq!(resumen["total_turnos"], 0);
    assert_eq!(resumen["turnos"], json!([]));
}

#[tokio::test]
async fn daily_board_merges_blocks_and_marks_per_doctor() {
    let mock_server = MockServer::start().await;

    let mut bloque1 = MockSupabaseResponses::horario(1, 5, "2025-06-16T12:00:00", "2025-06-16T13:00:00");
    let mut bloque2 = MockSupabaseResponses::horario(2, 5, "2025-06-16T13:00:00", "2025-06-16T18:00:00");
    let usuario = MockSupabaseResponses::usuario(5, "Laura", "laura@clinica.cl", 2);
    bloque1["usuario"] = usuario.clone();
    bloque2["usuario"] = usuario;

    Mock::given(method("GET"))
        .and(path("/rest/v1/horarios_personal"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([bloque1, bloque2])))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/asistencia"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::asistencia(12, 5, "2025-06-16T12:20:00", Some("2025-06-16T18:00:00"))
        ])))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/asistencia_estados"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/especialidades_doctor"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"usuario_sistema_id": 5, "especialidad": {"nombre": "Kinesiología"}}
        ])))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/cita_medica"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"doctor_id": 5}, {"doctor_id": 5}, {"doctor_id": 5}
        ])))
        .mount(&mock_server)
        .await;

    let resumen = attendance_for(&mock_server)
        .daily_summary(Some("2025-06-16"))
        .await
        .unwrap();

    assert_eq!(resumen["total_turnos"], 1);
    assert_eq!(resumen["con_atraso"], 1);
    let turno = &resumen["turnos"][0];
    assert_eq!(turno["estado_asistencia"], "ATRASO");
    assert_eq!(turno["minutos_atraso"], 20);
    assert_eq!(turno["bloques"], 2);
    assert_eq!(turno["finalizacion_turno"], "2025-06-16T18:00:00");
    assert_eq!(turno["pacientes_agendados"], 3);
    assert_eq!(turno["doctor"]["especialidades"][0], "Kinesiología");
}

#[tokio::test]
async fn period_stats_reject_unknown_period() {
    let mock_server = MockServer::start().await;

    let err = reports_for(&mock_server)
        .period_stats(5, "trimestre", None)
        .await
        .unwrap_err();

    assert!(matches!(err, AttendanceError::InvalidPeriod));
}

#[tokio::test]
async fn history_limit_is_capped() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/asistencia"))
        .and(query_param("limit", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/horarios_personal"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/cita_medica"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let historial = reports_for(&mock_server)
        .daily_history(
            5,
            HistoryQuery {
                fecha_desde: Some("2025-05-01".to_string()),
                fecha_hasta: Some("2025-06-16".to_string()),
                limit: 500,
            },
        )
        .await
        .unwrap();

    assert_eq!(historial["total_registros"], 0);
}

#[tokio::test]
async fn justification_requires_matching_attendance() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/asistencia"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let err = reports_for(&mock_server)
        .add_justification(
            5,
            JustificationRequest {
                asistencia_id: 12,
                tipo_justificacion: "PERMISO_MEDICO".to_string(),
                justificacion: "Licencia médica presentada.".to_string(),
                justificado_por: 1,
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AttendanceError::RecordNotFound));
}

#[tokio::test]
async fn justification_inserts_when_none_exists() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/asistencia"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 12}])))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/asistencia_estados"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/asistencia_estados"))
        .and(body_partial_json(json!({
            "asistencia_id": 12,
            "estado": "JUSTIFICADO",
            "tipo_justificacion": "PERMISO_MEDICO"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([{
            "id": 4,
            "asistencia_id": 12,
            "estado": "JUSTIFICADO"
        }])))
        .mount(&mock_server)
        .await;

    let estado = reports_for(&mock_server)
        .add_justification(
            5,
            JustificationRequest {
                asistencia_id: 12,
                tipo_justificacion: "PERMISO_MEDICO".to_string(),
                justificacion: "Licencia médica presentada.".to_string(),
                justificado_por: 1,
            },
        )
        .await
        .expect("justification should be stored");

    assert_eq!(estado["id"], 4);
}
