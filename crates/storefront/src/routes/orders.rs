//! `GET /api/orders/{id}`, polled by the checkout result pages.

use axum::{
    Json,
    extract::{Path, State},
};
use serde_json::{Value, json};
use tienda_core::OrderId;

use crate::error::{AppError, Result};
use crate::state::AppState;

/// Fetch an order. Every failure, including backend outages, answers 404.
pub async fn show(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Value>> {
    let order_id = id
        .parse::<OrderId>()
        .map_err(|_| AppError::NotFound(format!("order {id}")))?;

    match state.commerce().order(order_id).await {
        Ok(order) => Ok(Json(json!({ "ok": true, "order": order }))),
        Err(e) => {
            tracing::warn!(order_id = %order_id, error = %e, "Order lookup failed");
            Err(AppError::NotFound(format!("order {order_id}")))
        }
    }
}
