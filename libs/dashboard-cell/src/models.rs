use serde::Deserialize;
use thiserror::Error;

use shared_models::error::AppError;

fn default_limit() -> u64 {
    5
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecentAppointmentsQuery {
    #[serde(default = "default_limit")]
    pub limite: u64,
}

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("Error de base de datos: {0}")]
    Database(String),
}

impl From<anyhow::Error> for DashboardError {
    fn from(err: anyhow::Error) -> Self {
        DashboardError::Database(err.to_string())
    }
}

impl From<DashboardError> for AppError {
    fn from(err: DashboardError) -> Self {
        match err {
            DashboardError::Database(msg) => AppError::Database(msg),
        }
    }
}
