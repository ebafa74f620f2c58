use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Shown with every stats failure; the usual cause is a missing table or column
pub const STATS_HINT: &str = "The analytics tables may be missing or out of date. \
     Run `cicerone-admin check-schema` to inspect the database schema.";

#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed request or missing field; nothing was persisted
    #[error("{0}")]
    BadRequest(String),
    /// Write failed; the caller only sees `message`
    #[error("{message}: {source:#}")]
    Persistence {
        message: &'static str,
        #[source]
        source: anyhow::Error,
    },
    /// Aggregation query failed
    #[error("failed to fetch stats: {0:#}")]
    Stats(#[source] anyhow::Error),
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Serialize)]
pub struct StatsErrorResponse {
    pub error: String,
    pub message: String,
    pub hint: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(error) => {
                (StatusCode::BAD_REQUEST, Json(ErrorResponse { error })).into_response()
            }
            ApiError::Persistence { message, source } => {
                tracing::error!(error = ?source, "{}", message);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse {
                        error: message.to_string(),
                    }),
                )
                    .into_response()
            }
            ApiError::Stats(source) => {
                tracing::error!(error = ?source, "Failed to fetch stats");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(StatsErrorResponse {
                        error: "Failed to fetch stats".to_string(),
                        message: format!("{:#}", source),
                        hint: STATS_HINT.to_string(),
                    }),
                )
                    .into_response()
            }
        }
    }
}
