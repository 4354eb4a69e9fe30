// handlers/protected/order/orders.rs - GET and POST /api/order

use std::time::Instant;

use axum::extract::{Extension, Query, State};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{info, warn};

use crate::app::AppState;
use crate::auth::{Action, ResourceContext};
use crate::database::models::{NewOrder, NewOrderItem, Order, OrderPage};
use crate::database::OrderRepository;
use crate::error::ApiError;
use crate::handlers::require;
use crate::middleware::{ApiJson, ApiResponse, ApiResult, AuthUser};

#[derive(Debug, Deserialize)]
pub struct OrdersQuery {
    pub page: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub franchise_id: i64,
    pub store_id: i64,
    #[serde(default)]
    pub items: Vec<NewOrderItem>,
}

/// GET /api/order?page=N - The caller's orders, `api.list_per_page` per page
pub async fn orders_get(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<OrdersQuery>,
) -> ApiResult<OrderPage> {
    require(&auth, Action::ReadOrders, ResourceContext::none())?;

    let diner_id = auth.identity.user_id;
    let page = query.page.unwrap_or(1).max(1);
    let orders = state
        .db
        .orders_for_diner(diner_id, page, state.config.api.list_per_page)
        .await?;

    Ok(ApiResponse::success(OrderPage { diner_id, orders, page }))
}

/// POST /api/order - Place an order for the caller
///
/// Line item prices are stored as submitted.
pub async fn order_post(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ApiJson(payload): ApiJson<CreateOrderRequest>,
) -> ApiResult<Order> {
    require(&auth, Action::CreateOrder, ResourceContext::none())?;
    if payload.items.is_empty() {
        return Err(ApiError::bad_request("an order needs at least one item"));
    }

    let started = Instant::now();
    let result = state
        .db
        .add_order(NewOrder {
            diner_id: auth.identity.user_id,
            franchise_id: payload.franchise_id,
            store_id: payload.store_id,
            items: payload.items,
        })
        .await;

    match result {
        Ok(order) => {
            state
                .metrics
                .record_purchase(order.items.len(), order.total, started.elapsed(), true);
            info!("Order {} placed by {}", order.id, order.diner_id);
            Ok(ApiResponse::success(order))
        }
        Err(err) => {
            state
                .metrics
                .record_purchase(0, Decimal::ZERO, started.elapsed(), false);
            warn!("Order for user {} failed: {}", auth.identity.user_id, err);
            Err(err.into())
        }
    }
}
