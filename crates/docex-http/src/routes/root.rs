use crate::errors::HttpError;
use axum::http::Uri;
use axum::Json;
use serde_json::{json, Value};

pub async fn root() -> Json<Value> {
    Json(json!({ "message": "Your application is up!" }))
}

pub async fn not_found(uri: Uri) -> HttpError {
    HttpError::not_found(uri.path().to_string())
}
