//! Read-only catalog endpoints.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde_json::{Value, json};

use crate::error::{AppError, Result};
use crate::state::AppState;
use crate::woocommerce::ProductQuery;

/// Products returned by the connectivity check endpoint.
const SAMPLE_SIZE: u32 = 5;

/// `GET /api/wc/products`: a small product sample.
pub async fn sample(State(state): State<AppState>) -> Result<Json<Value>> {
    let query = ProductQuery {
        per_page: Some(SAMPLE_SIZE),
        ..ProductQuery::default()
    };
    let items = state.commerce().products(&query).await?;
    Ok(Json(json!({ "ok": true, "count": items.len(), "items": items })))
}

/// `GET /api/products?category=&featured=&per_page=`.
pub async fn products(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> Result<Json<Value>> {
    let items = state.commerce().products(&query).await?;
    Ok(Json(json!({ "ok": true, "items": items })))
}

/// `GET /api/products/{slug}`.
pub async fn product(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Value>> {
    let product = state
        .commerce()
        .product_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {slug}")))?;
    Ok(Json(json!({ "ok": true, "product": product })))
}

/// `GET /api/categories`.
pub async fn categories(State(state): State<AppState>) -> Result<Json<Value>> {
    let items = state.commerce().categories().await?;
    Ok(Json(json!({ "ok": true, "items": items })))
}

/// `GET /api/categories/{slug}`.
pub async fn category(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Value>> {
    let category = state
        .commerce()
        .category_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("category {slug}")))?;
    Ok(Json(json!({ "ok": true, "category": category })))
}
