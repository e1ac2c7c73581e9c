use rand::{distributions::Alphanumeric, Rng};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::debug;

use shared_config::AppConfig;
use shared_database::supabase::{representation_headers, SupabaseClient};

use crate::models::{AuthError, LoginRequest, LoginResponse, PasswordRow, UserData};

/// Frontend dashboard per normalized role.
fn redirect_for_role(role: &str) -> Option<&'static str> {
    match role {
        "medico" => Some("/doctor/dashboard"),
        "admin" => Some("/admin/dashboard"),
        "secretaria" => Some("/secretaria/dashboard"),
        _ => None,
    }
}

/// Collapses role-name variants stored in the role catalog onto the three
/// canonical roles.
pub fn normalize_role(name: &str) -> String {
    let lowered = name.trim().to_lowercase();
    match lowered.as_str() {
        "medico" | "médico" | "doctor" => "medico".to_string(),
        "admin" | "administrador" | "administrator" => "admin".to_string(),
        "secretaria" | "secretario" => "secretaria".to_string(),
        _ => lowered,
    }
}

/// Checks a submitted password against a stored value. Hashed rows carry a
/// bcrypt prefix; anything else is a legacy plaintext row.
pub fn verify_password(submitted: &str, stored: &str) -> bool {
    if stored.starts_with("$2b$") || stored.starts_with("$2a$") {
        bcrypt::verify(submitted, stored).unwrap_or(false)
    } else {
        stored == submitted
    }
}

fn generate_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}

pub struct AuthService {
    supabase: SupabaseClient,
}

impl AuthService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    pub async fn login(&self, credentials: LoginRequest) -> Result<LoginResponse, AuthError> {
        debug!("Login attempt for {}", credentials.email);

        let path = format!(
            "/rest/v1/usuario_sistema?email=eq.{}&select=id,nombre,apellido_paterno,apellido_materno,email,rut,rol_id,rol(id,nombre)",
            urlencoding::encode(&credentials.email)
        );
        let users: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;

        let user = users.first().ok_or(AuthError::InvalidCredentials)?;
        let user_id = user["id"].as_i64().ok_or(AuthError::InvalidCredentials)?;

        let password_path = format!(
            "/rest/v1/contraseñas?id_profesional_salud=eq.{}&select=contraseña,contraseña_temporal",
            user_id
        );
        let passwords: Vec<PasswordRow> = self
            .supabase
            .request(Method::GET, &password_path, None)
            .await?;
        let stored = passwords.first().ok_or(AuthError::InvalidCredentials)?;

        let mut password_valid = stored
            .contrasena
            .as_deref()
            .map(|s| verify_password(&credentials.password, s))
            .unwrap_or(false);
        if !password_valid {
            password_valid = stored
                .contrasena_temporal
                .as_deref()
                .map(|s| verify_password(&credentials.password, s))
                .unwrap_or(false);
        }
        if !password_valid {
            return Err(AuthError::InvalidCredentials);
        }

        let role_name = user["rol"]["nombre"]
            .as_str()
            .filter(|s| !s.is_empty())
            .ok_or(AuthError::MissingRole)?;
        let normalized = normalize_role(role_name);
        let redirect_url = redirect_for_role(&normalized)
            .ok_or_else(|| AuthError::UnauthorizedRole(role_name.to_string()))?;

        let (especialidad_id, especialidad_nombre) = if normalized == "medico" {
            self.primary_specialty(user_id).await?
        } else {
            (None, None)
        };

        // A user is still on a temporary password when no definitive hash
        // has been set yet.
        let contrasena_temporal =
            stored.contrasena.is_none() && stored.contrasena_temporal.is_some();

        let nombre = user["nombre"].as_str().unwrap_or_default().to_string();
        let apellido_paterno = user["apellido_paterno"]
            .as_str()
            .unwrap_or_default()
            .to_string();

        let data = UserData {
            id: user_id,
            nombre: nombre.clone(),
            apellido_paterno: apellido_paterno.clone(),
            apellido_materno: user["apellido_materno"].as_str().map(String::from),
            email: user["email"].as_str().unwrap_or_default().to_string(),
            rut: user["rut"].as_str().map(String::from),
            rol_id: user["rol_id"].as_i64().unwrap_or_default(),
            rol_nombre: normalized,
            especialidad_id,
            especialidad_nombre,
            auth_token: generate_token(),
            contrasena_temporal,
        };

        Ok(LoginResponse {
            success: true,
            message: format!("Bienvenido/a {} {}", nombre, apellido_paterno),
            data,
            redirect_url: redirect_url.to_string(),
        })
    }

    async fn primary_specialty(
        &self,
        user_id: i64,
    ) -> Result<(Option<i64>, Option<String>), AuthError> {
        let path = format!(
            "/rest/v1/especialidades_doctor?usuario_sistema_id=eq.{}&select=especialidad_id,especialidad(id,nombre)",
            user_id
        );
        let links: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;

        Ok(links
            .first()
            .map(|link| {
                (
                    link["especialidad_id"].as_i64(),
                    link["especialidad"]["nombre"].as_str().map(String::from),
                )
            })
            .unwrap_or((None, None)))
    }

    pub async fn change_temp_password(
        &self,
        usuario_id: i64,
        nueva_contrasena: &str,
    ) -> Result<(), AuthError> {
        if nueva_contrasena.len() < 8 {
            return Err(AuthError::Validation(
                "La contraseña debe tener al menos 8 caracteres".to_string(),
            ));
        }

        let hashed = bcrypt::hash(nueva_contrasena, bcrypt::DEFAULT_COST)
            .map_err(|e| AuthError::Database(e.to_string()))?;

        let path = format!(
            "/rest/v1/contraseñas?id_profesional_salud=eq.{}",
            usuario_id
        );
        let updated: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &path,
                Some(json!({
                    "contraseña": hashed,
                    "contraseña_temporal": null
                })),
                Some(representation_headers()),
            )
            .await?;

        if updated.is_empty() {
            return Err(AuthError::UserNotFound);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_variants_collapse() {
        assert_eq!(normalize_role("Médico"), "medico");
        assert_eq!(normalize_role("DOCTOR"), "medico");
        assert_eq!(normalize_role("Administrador"), "admin");
        assert_eq!(normalize_role("secretario"), "secretaria");
        assert_eq!(normalize_role("kinesiologo"), "kinesiologo");
    }

    #[test]
    fn unknown_roles_have_no_redirect() {
        assert_eq!(redirect_for_role("medico"), Some("/doctor/dashboard"));
        assert_eq!(redirect_for_role("kinesiologo"), None);
    }

    #[test]
    fn plaintext_passwords_compare_directly() {
        assert!(verify_password("secreto123", "secreto123"));
        assert!(!verify_password("otra", "secreto123"));
    }

    #[test]
    fn bcrypt_passwords_verify() {
        let hash = bcrypt::hash("secreto123", 4).unwrap();
        assert!(verify_password("secreto123", &hash));
        assert!(!verify_password("incorrecta", &hash));
    }

    #[test]
    fn tokens_are_opaque_and_fixed_length() {
        let token = generate_token();
        assert_eq!(token.len(), 32);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
    }
}
