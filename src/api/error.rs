use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::error::DataError;

/// Request-level failures. Rendered as `{"detail": "..."}`.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Body is not valid JSON or does not match the request schema.
    #[error("{0}")]
    InvalidBody(String),

    /// Parsing the dataset or composing the report failed.
    #[error("Error analyzing data: {0}")]
    Analysis(String),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidBody(rejection.body_text())
    }
}

impl From<DataError> for ApiError {
    fn from(err: DataError) -> Self {
        ApiError::Analysis(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::InvalidBody(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Analysis(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_errors_become_server_errors() {
        let err: ApiError = DataError::RowNotObject { row: 2 }.into();
        assert_eq!(
            err.to_string(),
            "Error analyzing data: row 2 is not a JSON object"
        );
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn invalid_body_is_unprocessable() {
        let response = ApiError::InvalidBody("missing field `data`".into()).into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
