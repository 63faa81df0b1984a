use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use crate::{config::ConfigError, database::StoreError};

pub const VERIFY_FAILED: &str = "Error verifying teacher.";
pub const MARK_FAILED: &str = "Error marking attendance.";
pub const SEED_FAILED: &str = "Error seeding data.";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Malformed payload")]
    MalformedPayload,

    #[error("Error verifying teacher.")]
    Verify(#[source] StoreError),

    #[error("Error marking attendance.")]
    Mark(#[source] StoreError),

    #[error("Error seeding data.")]
    Seed(#[source] StoreError),

    #[error("Error verifying teacher.")]
    VerifyPage(#[source] std::io::Error),

    #[error("Page unavailable.")]
    Page(#[source] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Store unavailable: {0}")]
    Store(#[from] StoreError),

    #[error("Server error: {0}")]
    Io(#[from] std::io::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::MalformedPayload => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        match &self {
            AppError::Verify(source) | AppError::Mark(source) | AppError::Seed(source) => {
                error!("{self} {source}");
            }
            AppError::VerifyPage(source) | AppError::Page(source) => error!("{self} {source}"),
            AppError::MalformedPayload => {}
            _ => error!("{self}"),
        }

        (status, self.to_string()).into_response()
    }
}
