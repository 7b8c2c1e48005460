//! Purchase routes.
//!
//! ```text
//! POST /purchase/:productId   { "quantity": 2 }   buy one product
//! POST /purchase/                                 buy the whole cart
//! ```

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use shopkeep_core::{ProductId, Purchase, PurchaseSummary};

use crate::auth::Actor;
use crate::error::ApiError;
use crate::AppState;

pub const PURCHASE_MESSAGE: &str =
    "Thank you for purchasing. Please check the products before proceeding.";

#[derive(Debug, Clone, Deserialize)]
pub struct PurchaseItemRequest {
    pub quantity: i64,
}

/// One purchased line as the storefront sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseLine {
    pub title: String,
    pub quantity: i64,
    /// Decimal string, e.g. "299.99"
    pub total: String,
}

impl From<PurchaseSummary> for PurchaseLine {
    fn from(summary: PurchaseSummary) -> Self {
        PurchaseLine {
            title: summary.title,
            quantity: summary.quantity,
            total: summary.total.to_decimal_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseResponse<T> {
    pub message: String,
    pub data: T,
}

impl<T> PurchaseResponse<T> {
    fn new(data: T) -> Self {
        PurchaseResponse {
            message: PURCHASE_MESSAGE.to_string(),
            data,
        }
    }
}

fn lines(purchase: Purchase) -> Vec<PurchaseLine> {
    purchase.summaries().into_iter().map(PurchaseLine::from).collect()
}

pub async fn purchase_item(
    State(state): State<Arc<AppState>>,
    Actor(actor_id): Actor,
    product_id: Result<Path<i64>, PathRejection>,
    body: Result<Json<PurchaseItemRequest>, JsonRejection>,
) -> Result<Json<PurchaseResponse<PurchaseLine>>, ApiError> {
    let Path(product_id) =
        product_id.map_err(|_| ApiError::validation("productId must be an integer"))?;
    let Json(request) =
        body.map_err(|_| ApiError::validation("quantity must be a positive integer"))?;

    let request_id = Uuid::new_v4();
    info!(%request_id, actor_id = %actor_id, product_id, quantity = request.quantity, "POST /purchase/:productId");

    let purchase = state
        .engine
        .purchase_item(actor_id, ProductId(product_id), request.quantity)
        .await?;

    let line = lines(purchase)
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::internal("Committed purchase has no line items"))?;

    Ok(Json(PurchaseResponse::new(line)))
}

pub async fn purchase_cart(
    State(state): State<Arc<AppState>>,
    Actor(actor_id): Actor,
) -> Result<Json<PurchaseResponse<Vec<PurchaseLine>>>, ApiError> {
    let request_id = Uuid::new_v4();
    info!(%request_id, actor_id = %actor_id, "POST /purchase/");

    let purchase = state.engine.purchase_cart(actor_id).await?;

    Ok(Json(PurchaseResponse::new(lines(purchase))))
}
