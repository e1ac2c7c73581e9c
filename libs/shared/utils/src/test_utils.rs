use std::sync::Arc;

use serde_json::{json, Value};

use shared_config::AppConfig;

/// Configuration helper for tests. Points the app at a local or mock
/// Supabase endpoint.
#[derive(Debug, Clone)]
pub struct TestConfig {
    pub supabase_url: String,
    pub supabase_service_key: String,
}

impl TestConfig {
    pub fn new() -> Self {
        Self {
            supabase_url: "http://localhost:54321".to_string(),
            supabase_service_key: "test-service-key".to_string(),
        }
    }

    /// Builds a config targeting a wiremock server.
    pub fn for_mock_server(mock_url: &str) -> Self {
        Self {
            supabase_url: mock_url.to_string(),
            supabase_service_key: "test-service-key".to_string(),
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_service_key: self.supabase_service_key.clone(),
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

impl Default for TestConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Canned PostgREST row payloads for wiremock responses.
pub struct MockSupabaseResponses;

impl MockSupabaseResponses {
    pub fn rol(id: i64, nombre: &str) -> Value {
        json!({
            "id": id,
            "nombre": nombre,
            "descripcion": format!("Rol {}", nombre)
        })
    }

    pub fn usuario(id: i64, nombre: &str, email: &str, rol_id: i64) -> Value {
        json!({
            "id": id,
            "nombre": nombre,
            "apellido_paterno": "Soto",
            "apellido_materno": "Rojas",
            "rut": format!("{}5678K", id),
            "email": email,
            "celular": "+56912345678",
            "cel_secundario": null,
            "direccion": "Av. Siempre Viva 123",
            "rol_id": rol_id
        })
    }

    pub fn usuario_con_rol(id: i64, nombre: &str, email: &str, rol_id: i64, rol_nombre: &str) -> Value {
        let mut user = Self::usuario(id, nombre, email, rol_id);
        user["rol"] = json!({"id": rol_id, "nombre": rol_nombre});
        user
    }

    pub fn contrasena(usuario_id: i64, hash: Option<&str>, temporal: Option<&str>) -> Value {
        json!({
            "id": usuario_id,
            "id_profesional_salud": usuario_id,
            "contraseña": hash,
            "contraseña_temporal": temporal
        })
    }

    pub fn paciente(id: i64, nombre: &str, rut: &str) -> Value {
        json!({
            "id": id,
            "nombre": nombre,
            "apellido_paterno": "Gonzalez",
            "apellido_materno": "Perez",
            "rut": rut,
            "email": format!("paciente{}@example.com", id),
            "celular": "+56987654321",
            "direccion": "Calle Falsa 742",
            "fecha_nacimiento": "1990-05-20",
            "prevencion_id": 1
        })
    }

    pub fn prevencion(id: i64, nombre: &str) -> Value {
        json!({
            "id": id,
            "nombre": nombre,
            "descuento": 0
        })
    }

    pub fn cita(id: i64, fecha_atencion: &str, paciente_id: i64, doctor_id: i64) -> Value {
        json!({
            "id": id,
            "fecha_atencion": fecha_atencion,
            "paciente_id": paciente_id,
            "doctor_id": doctor_id
        })
    }

    pub fn estado(id: i64, cita_medica_id: i64, estado: &str) -> Value {
        json!({
            "id": id,
            "cita_medica_id": cita_medica_id,
            "estado": estado,
            "fecha": "2025-06-16T12:00:00"
        })
    }

    pub fn horario(id: i64, usuario_sistema_id: i64, inicio: &str, fin: &str) -> Value {
        json!({
            "id": id,
            "usuario_sistema_id": usuario_sistema_id,
            "inicio_bloque": inicio,
            "finalizacion_bloque": fin
        })
    }

    pub fn asistencia(id: i64, usuario_sistema_id: i64, inicio: &str, fin: Option<&str>) -> Value {
        json!({
            "id": id,
            "usuario_sistema_id": usuario_sistema_id,
            "inicio_turno": inicio,
            "finalizacion_turno": fin
        })
    }

    pub fn especialidad(id: i64, nombre: &str) -> Value {
        json!({
            "id": id,
            "nombre": nombre,
            "descripcion": format!("Especialidad de {}", nombre)
        })
    }

    pub fn pago(id: i64, cita_medica_id: i64, total: f64) -> Value {
        json!({
            "id": id,
            "cita_medica_id": cita_medica_id,
            "fecha_pago": "2025-06-16T15:30:00",
            "tipo_pago": "Efectivo",
            "total": total
        })
    }

    pub fn diagnostico(id: i64, nombre: &str) -> Value {
        json!({
            "id": id,
            "nombre_enfermedad": nombre,
            "descripcion_enfermedad": format!("Descripción de {}", nombre)
        })
    }

    pub fn configuracion(id: i64, clave: &str, valor: &str) -> Value {
        json!({
            "id": id,
            "clave": clave,
            "valor": valor,
            "tipo": "texto",
            "categoria": "general",
            "descripcion": null
        })
    }
}
