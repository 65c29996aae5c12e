//! Order handlers: public checkout and tracking, merchant lifecycle management

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use uuid::Uuid;

use rahba_db::{OrderItemRow, OrderRow};
use rahba_store_core::{
    CheckoutItem, CheckoutRequest as CheckoutInput, OrderTracking, ShippingInfo,
};
use rahba_types::OrderStatus;

use crate::error::{ApiError, ApiResult};
use crate::extractors::{Merchant, Storefront};
use crate::handlers::shared::{self, page_bounds};
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_email: Option<String>,
    pub wilaya: String,
    pub commune: String,
    pub address: String,
    pub postal_code: Option<String>,
    pub items: Vec<CheckoutItemRequest>,
}

#[derive(Debug, Deserialize)]
pub struct CheckoutItemRequest {
    pub product_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub id: String,
    pub order_number: String,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_email: Option<String>,
    pub wilaya: String,
    pub commune: String,
    pub address: String,
    pub postal_code: Option<String>,
    pub subtotal: Decimal,
    pub delivery_fee: Decimal,
    pub total: Decimal,
    pub status: String,
    pub confirmed_at: Option<String>,
    pub shipped_at: Option<String>,
    pub delivered_at: Option<String>,
    pub cancelled_at: Option<String>,
    pub delivery_company: Option<String>,
    pub tracking_number: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Serialize)]
pub struct OrderItemResponse {
    pub product_id: String,
    pub product_name: String,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub subtotal: Decimal,
}

#[derive(Debug, Serialize)]
pub struct OrderDetailResponse {
    pub order: OrderResponse,
    pub items: Vec<OrderItemResponse>,
}

#[derive(Debug, Serialize)]
pub struct OrderListResponse {
    pub orders: Vec<OrderResponse>,
}

#[derive(Debug, Deserialize)]
pub struct OrderListQuery {
    pub status: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateOrderStatusRequest {
    pub status: String,
    pub delivery_company: Option<String>,
    pub tracking_number: Option<String>,
}

/// Customer-facing tracking view; no contact details, no pricing
#[derive(Debug, Serialize)]
pub struct TrackingResponse {
    pub order_number: String,
    pub status: String,
    pub wilaya: String,
    pub created_at: String,
    pub confirmed_at: Option<String>,
    pub shipped_at: Option<String>,
    pub delivered_at: Option<String>,
    pub cancelled_at: Option<String>,
    pub delivery_company: Option<String>,
    pub tracking_number: Option<String>,
}

fn order_to_response(row: OrderRow) -> OrderResponse {
    OrderResponse {
        id: row.id.to_string(),
        order_number: row.order_number,
        customer_name: row.customer_name,
        customer_phone: row.customer_phone,
        customer_email: row.customer_email,
        wilaya: row.wilaya,
        commune: row.commune,
        address: row.address,
        postal_code: row.postal_code,
        subtotal: row.subtotal,
        delivery_fee: row.delivery_fee,
        total: row.total,
        status: row.status,
        confirmed_at: row.confirmed_at.map(|t| t.to_rfc3339()),
        shipped_at: row.shipped_at.map(|t| t.to_rfc3339()),
        delivered_at: row.delivered_at.map(|t| t.to_rfc3339()),
        cancelled_at: row.cancelled_at.map(|t| t.to_rfc3339()),
        delivery_company: row.delivery_company,
        tracking_number: row.tracking_number,
        created_at: row.created_at.to_rfc3339(),
    }
}

fn item_to_response(row: OrderItemRow) -> OrderItemResponse {
    OrderItemResponse {
        product_id: row.product_id.to_string(),
        product_name: row.product_name,
        unit_price: row.unit_price,
        quantity: row.quantity,
        subtotal: row.subtotal,
    }
}

fn tracking_to_response(tracking: OrderTracking) -> TrackingResponse {
    TrackingResponse {
        order_number: tracking.order_number,
        status: tracking.status,
        wilaya: tracking.wilaya,
        created_at: tracking.created_at.to_rfc3339(),
        confirmed_at: tracking.confirmed_at.map(|t| t.to_rfc3339()),
        shipped_at: tracking.shipped_at.map(|t| t.to_rfc3339()),
        delivered_at: tracking.delivered_at.map(|t| t.to_rfc3339()),
        cancelled_at: tracking.cancelled_at.map(|t| t.to_rfc3339()),
        delivery_company: tracking.delivery_company,
        tracking_number: tracking.tracking_number,
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /orders/checkout
///
/// Public cash-on-delivery checkout; prices and delivery fee come from the
/// server, never from the client
pub async fn checkout(
    State(state): State<AppState>,
    store: Storefront,
    Json(req): Json<CheckoutRequest>,
) -> ApiResult<(StatusCode, Json<OrderResponse>)> {
    let start = Instant::now();

    let result = state
        .orders
        .checkout(
            store.tenant.id,
            CheckoutInput {
                customer_name: req.customer_name,
                customer_phone: req.customer_phone,
                customer_email: req.customer_email,
                wilaya: req.wilaya,
                commune: req.commune,
                address: req.address,
                postal_code: req.postal_code,
                items: req
                    .items
                    .into_iter()
                    .map(|item| CheckoutItem {
                        product_id: item.product_id,
                        quantity: item.quantity,
                    })
                    .collect(),
            },
        )
        .await;
    shared::record_op_duration("checkout", start, result.is_ok());
    let order = result?;

    metrics::counter!("orders_placed_total").increment(1);
    tracing::info!(
        tenant_id = %store.tenant.id,
        order_number = %order.order_number,
        total = %order.total,
        "Order placed"
    );

    Ok((StatusCode::CREATED, Json(order_to_response(order))))
}

/// GET /orders/track/{order_number}
pub async fn track_order(
    State(state): State<AppState>,
    store: Storefront,
    Path(order_number): Path<String>,
) -> ApiResult<Json<TrackingResponse>> {
    let start = Instant::now();

    let result = state.orders.track(store.tenant.id, &order_number).await;
    shared::record_op_duration("track_order", start, result.is_ok());

    Ok(Json(tracking_to_response(result?)))
}

/// GET /orders/merchant
pub async fn list_orders(
    State(state): State<AppState>,
    merchant: Merchant,
    Query(q): Query<OrderListQuery>,
) -> ApiResult<Json<OrderListResponse>> {
    let start = Instant::now();
    let (limit, offset) = page_bounds(q.limit, q.offset);

    let result = state
        .orders
        .list_orders(merchant.tenant_id, q.status.as_deref(), limit, offset)
        .await;
    shared::record_op_duration("list_orders", start, result.is_ok());

    Ok(Json(OrderListResponse {
        orders: result?.into_iter().map(order_to_response).collect(),
    }))
}

/// GET /orders/merchant/{id}
pub async fn get_order(
    State(state): State<AppState>,
    merchant: Merchant,
    Path(order_id): Path<Uuid>,
) -> ApiResult<Json<OrderDetailResponse>> {
    let (order, items) = state.orders.get_order(merchant.tenant_id, order_id).await?;

    Ok(Json(OrderDetailResponse {
        order: order_to_response(order),
        items: items.into_iter().map(item_to_response).collect(),
    }))
}

/// PATCH /orders/merchant/{id}/status
///
/// Validated transition; moving to shipped may create a carrier shipment
pub async fn update_order_status(
    State(state): State<AppState>,
    merchant: Merchant,
    Path(order_id): Path<Uuid>,
    Json(req): Json<UpdateOrderStatusRequest>,
) -> ApiResult<Json<OrderResponse>> {
    let start = Instant::now();

    let target: OrderStatus = req
        .status
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("Invalid order status: {}", req.status)))?;

    let result = state
        .orders
        .transition_order(
            merchant.tenant_id,
            order_id,
            target,
            ShippingInfo {
                delivery_company: req.delivery_company,
                tracking_number: req.tracking_number,
            },
        )
        .await;
    shared::record_op_duration("update_order_status", start, result.is_ok());
    let order = result?;

    tracing::info!(
        order_id = %order.id,
        status = %order.status,
        "Order status updated"
    );

    Ok(Json(order_to_response(order)))
}
