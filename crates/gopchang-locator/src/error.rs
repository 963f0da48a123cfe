use crate::config::ConfigError;
use crate::telemetry::TelemetryError;
use crate::workflows::district::{ExportError, PipelineError};
use crate::workflows::ingest::encoding::EncodingError;
use crate::workflows::ingest::IngestError;
use crate::workflows::trends::{TrendError, UpstreamServiceError};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    Ingest(IngestError),
    Pipeline(PipelineError),
    Export(ExportError),
    Encoding(EncodingError),
    Trends(TrendError),
    MissingCredentials(&'static str),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Ingest(err) => write!(f, "data load error: {}", err),
            AppError::Pipeline(err) => write!(f, "refresh error: {}", err),
            AppError::Export(err) => write!(f, "output table error: {}", err),
            AppError::Encoding(err) => write!(f, "encoding error: {}", err),
            AppError::Trends(err) => write!(f, "trend collection error: {}", err),
            AppError::MissingCredentials(name) => {
                write!(f, "missing credentials: set {}", name)
            }
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Ingest(err) => Some(err),
            AppError::Pipeline(err) => Some(err),
            AppError::Export(err) => Some(err),
            AppError::Encoding(err) => Some(err),
            AppError::Trends(err) => Some(err),
            AppError::MissingCredentials(_) => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::Ingest(_) | AppError::Pipeline(_) | AppError::Export(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::Trends(_) => StatusCode::BAD_GATEWAY,
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_)
            | AppError::Encoding(_)
            | AppError::MissingCredentials(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<IngestError> for AppError {
    fn from(value: IngestError) -> Self {
        Self::Ingest(value)
    }
}

impl From<PipelineError> for AppError {
    fn from(value: PipelineError) -> Self {
        Self::Pipeline(value)
    }
}

impl From<ExportError> for AppError {
    fn from(value: ExportError) -> Self {
        Self::Export(value)
    }
}

impl From<EncodingError> for AppError {
    fn from(value: EncodingError) -> Self {
        Self::Encoding(value)
    }
}

impl From<TrendError> for AppError {
    fn from(value: TrendError) -> Self {
        Self::Trends(value)
    }
}

impl From<UpstreamServiceError> for AppError {
    fn from(value: UpstreamServiceError) -> Self {
        Self::Trends(TrendError::Upstream(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::ingest::SchemaError;

    #[test]
    fn schema_failures_name_the_source_and_map_to_422() {
        let err = AppError::from(IngestError::Schema(SchemaError {
            source_name: "facility".to_string(),
            expected: vec!["상권_코드".to_string()],
            columns: vec!["code".to_string()],
        }));
        assert!(err.to_string().contains("facility"));
        assert_eq!(
            err.into_response().status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }
}
