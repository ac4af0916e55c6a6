//! Streaming proxy handler

use crate::handlers::AppState;
use crate::utils::error::{AppError, AppResult};
use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct StreamQuery {
    pub service: Option<String>,
    pub url: Option<String>,
    /// Truncate the proxied body to this many characters
    pub max_chars: Option<usize>,
}

/// Forward a media URL to a streaming service
///
/// GET /api/stream?service=<id>&url=<url>[&max_chars=<n>]
pub async fn handle_stream(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StreamQuery>,
) -> AppResult<Response> {
    let service = required(&query.service, "service")?.to_lowercase();
    // Unknown service wins over a missing url
    state.proxy.resolve(&service)?;
    let url = required(&query.url, "url")?;
    if query.max_chars == Some(0) {
        return Err(AppError::Validation("max_chars must be positive".to_string()));
    }

    let payload = state
        .proxy
        .fetch(&service, url, query.max_chars)
        .await?;

    let status = StatusCode::from_u16(payload.status).unwrap_or(StatusCode::BAD_GATEWAY);

    let mut headers = HeaderMap::new();
    let content_type = payload
        .content_type
        .as_deref()
        .and_then(|ct| HeaderValue::from_str(ct).ok())
        .unwrap_or_else(|| HeaderValue::from_static("text/plain; charset=utf-8"));
    headers.insert(header::CONTENT_TYPE, content_type);
    if let Ok(service) = HeaderValue::from_str(&payload.service) {
        headers.insert("x-proxy-service", service);
    }
    if payload.truncated {
        headers.insert("x-proxy-truncated", HeaderValue::from_static("true"));
    }

    Ok((status, headers, payload.body).into_response())
}

fn required<'a>(value: &'a Option<String>, name: &str) -> AppResult<&'a str> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(AppError::Validation(format!("query parameter '{}' is required", name))),
    }
}
