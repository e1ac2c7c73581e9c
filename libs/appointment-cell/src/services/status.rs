use anyhow::{anyhow, Result};
use reqwest::Method;
use serde_json::{json, Value};

use shared_database::supabase::{representation_headers, SupabaseClient};

/// Current status of an appointment: the newest row of its append-only
/// history, or None when no status was ever recorded.
pub(crate) async fn current_status(
    supabase: &SupabaseClient,
    cita_id: i64,
) -> Result<Option<String>> {
    let path = format!(
        "/rest/v1/estado?cita_medica_id=eq.{}&select=estado&order=id.desc&limit=1",
        cita_id
    );
    let rows: Vec<Value> = supabase.request(Method::GET, &path, None).await?;
    Ok(rows
        .first()
        .and_then(|row| row["estado"].as_str().map(String::from)))
}

/// Appends a status row. Existing rows are never updated.
pub(crate) async fn append_status(
    supabase: &SupabaseClient,
    cita_id: i64,
    estado: &str,
) -> Result<Value> {
    let rows: Vec<Value> = supabase
        .request_with_headers(
            Method::POST,
            "/rest/v1/estado",
            Some(json!({
                "estado": estado,
                "cita_medica_id": cita_id
            })),
            Some(representation_headers()),
        )
        .await?;
    rows.into_iter()
        .next()
        .ok_or_else(|| anyhow!("No se pudo registrar el estado"))
}

pub(crate) async fn appointment_exists(supabase: &SupabaseClient, cita_id: i64) -> Result<bool> {
    let path = format!("/rest/v1/cita_medica?id=eq.{}&select=id", cita_id);
    let rows: Vec<Value> = supabase.request(Method::GET, &path, None).await?;
    Ok(!rows.is_empty())
}
