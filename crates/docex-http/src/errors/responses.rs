//! HTTP error response formatting

use super::HttpError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use docex_core::{ApiError, ApiErrorResponse};

impl HttpError {
    /// Get the appropriate HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            HttpError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            HttpError::ValidationError { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            HttpError::RequestTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            HttpError::NotFound { .. } => StatusCode::NOT_FOUND,
            HttpError::StartupFailed { .. }
            | HttpError::ConfigError { .. }
            | HttpError::ExtractionFailed { .. }
            | HttpError::UpstreamFailed { .. }
            | HttpError::InternalError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get error hint for user guidance
    pub fn error_hint(&self) -> Option<&'static str> {
        match &self {
            HttpError::BadRequest { .. } => Some("Check request format and parameters"),
            HttpError::RequestTooLarge { .. } => Some("Reduce request payload size"),
            HttpError::ValidationError { .. } => {
                Some("Upload the document as the multipart form field 'file'")
            }
            HttpError::UpstreamFailed { .. } => {
                Some("Check the Azure service credentials and quotas, then retry")
            }
            _ => None,
        }
    }

    pub fn to_api_error(&self) -> ApiErrorResponse {
        let error = ApiError::new(self.error_code(), self.to_string());
        match self.error_hint() {
            Some(hint) => error.with_hint(hint).into(),
            None => error.into(),
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(code = self.error_code(), "{}", self);
        }

        (status, Json(self.to_api_error())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use serde_json::Value;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(HttpError::bad_request("test").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            HttpError::validation_error("Field is required").status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            HttpError::extraction("render failed").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_error_hints() {
        assert_eq!(
            HttpError::bad_request("test").error_hint(),
            Some("Check request format and parameters")
        );
        assert_eq!(HttpError::not_found("/nope").error_hint(), None);
    }

    #[tokio::test]
    async fn test_error_response_envelope() {
        let response = HttpError::validation_error("No file uploaded").into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(json["error"]["message"], "Validation error: No file uploaded");
        assert_eq!(
            json["error"]["hint"],
            "Upload the document as the multipart form field 'file'"
        );
    }

    #[tokio::test]
    async fn test_missing_hint_serializes_as_null() {
        let response = HttpError::internal("boom").into_response();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert!(json["error"]["hint"].is_null());
    }
}
