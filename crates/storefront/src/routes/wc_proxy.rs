//! `GET /api/wc/{*path}`: read-through proxy to the WooCommerce REST API.
//!
//! Successful responses are marked cacheable by shared caches so a CDN in
//! front of the service absorbs repeated catalog reads.

use axum::{
    Json,
    extract::{Path, RawQuery, State},
    http::{HeaderName, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::error::AppError;
use crate::state::AppState;
use crate::woocommerce::CommerceError;

pub const PROXY_CACHE_CONTROL: &str = "public, s-maxage=300, stale-while-revalidate=600";
pub const PROXY_CDN_CACHE_CONTROL: &str = "public, s-maxage=300";

static CDN_CACHE_CONTROL: HeaderName = HeaderName::from_static("cdn-cache-control");

pub async fn proxy(
    State(state): State<AppState>,
    Path(path): Path<String>,
    RawQuery(query): RawQuery,
) -> Response {
    match state.commerce().get_raw(&path, query.as_deref()).await {
        Ok(data) => (
            [
                (header::CACHE_CONTROL, PROXY_CACHE_CONTROL),
                (CDN_CACHE_CONTROL.clone(), PROXY_CDN_CACHE_CONTROL),
            ],
            Json(data),
        )
            .into_response(),
        Err(CommerceError::Status { status, .. }) => {
            let code = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
            (
                code,
                Json(json!({ "error": format!("WooCommerce API error: {status}") })),
            )
                .into_response()
        }
        Err(CommerceError::InvalidPath(path)) => {
            tracing::warn!(path = %path, "Rejected proxy path");
            AppError::NotFound(path).into_response()
        }
        Err(e) => AppError::from(e).into_response(),
    }
}
