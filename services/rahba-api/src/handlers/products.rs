//! Product handlers: public storefront listing and merchant catalog CRUD

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use uuid::Uuid;

use rahba_db::ProductRow;
use rahba_store_core::{NewProduct, ProductChanges};

use crate::error::ApiResult;
use crate::extractors::{Merchant, Storefront};
use crate::handlers::shared::{self, PageQuery, page_bounds};
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ProductResponse {
    pub id: String,
    pub name: String,
    pub name_ar: Option<String>,
    pub price: Decimal,
    pub stock: i32,
    pub slug: String,
    pub is_active: bool,
    pub category: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Serialize)]
pub struct ProductListResponse {
    pub products: Vec<ProductResponse>,
}

#[derive(Debug, Deserialize)]
pub struct ProductListQuery {
    pub is_active: Option<bool>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    pub name_ar: Option<String>,
    pub price: Decimal,
    pub stock: i32,
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub name_ar: Option<String>,
    pub price: Option<Decimal>,
    pub stock: Option<i32>,
    pub is_active: Option<bool>,
    pub category: Option<String>,
}

fn product_to_response(row: ProductRow) -> ProductResponse {
    ProductResponse {
        id: row.id.to_string(),
        name: row.name,
        name_ar: row.name_ar,
        price: row.price,
        stock: row.stock,
        slug: row.slug,
        is_active: row.is_active,
        category: row.category,
        created_at: row.created_at.to_rfc3339(),
        updated_at: row.updated_at.to_rfc3339(),
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /products
///
/// Public storefront listing for the tenant resolved from the subdomain;
/// only active products are visible
pub async fn storefront_products(
    State(state): State<AppState>,
    store: Storefront,
    Query(q): Query<PageQuery>,
) -> ApiResult<Json<ProductListResponse>> {
    let start = Instant::now();
    let (limit, offset) = page_bounds(q.limit, q.offset);

    let result = state
        .catalog
        .storefront_products(store.tenant.id, limit, offset)
        .await;
    shared::record_op_duration("storefront_products", start, result.is_ok());

    Ok(Json(ProductListResponse {
        products: result?.into_iter().map(product_to_response).collect(),
    }))
}

/// GET /products/merchant
pub async fn list_products(
    State(state): State<AppState>,
    merchant: Merchant,
    Query(q): Query<ProductListQuery>,
) -> ApiResult<Json<ProductListResponse>> {
    let start = Instant::now();
    let (limit, offset) = page_bounds(q.limit, q.offset);

    let result = state
        .catalog
        .list_products(merchant.tenant_id, q.is_active, limit, offset)
        .await;
    shared::record_op_duration("list_products", start, result.is_ok());

    Ok(Json(ProductListResponse {
        products: result?.into_iter().map(product_to_response).collect(),
    }))
}

/// POST /products/merchant
///
/// Quota-gated: trial stores can only hold a limited number of products
pub async fn create_product(
    State(state): State<AppState>,
    merchant: Merchant,
    Json(req): Json<CreateProductRequest>,
) -> ApiResult<(StatusCode, Json<ProductResponse>)> {
    let start = Instant::now();

    let result = state
        .catalog
        .create_product(
            merchant.tenant_id,
            NewProduct {
                name: req.name,
                name_ar: req.name_ar,
                price: req.price,
                stock: req.stock,
                category: req.category,
            },
        )
        .await;
    shared::record_op_duration("create_product", start, result.is_ok());
    let product = result?;

    Ok((StatusCode::CREATED, Json(product_to_response(product))))
}

/// GET /products/merchant/{id}
pub async fn get_product(
    State(state): State<AppState>,
    merchant: Merchant,
    Path(product_id): Path<Uuid>,
) -> ApiResult<Json<ProductResponse>> {
    let product = state
        .catalog
        .get_product(merchant.tenant_id, product_id)
        .await?;

    Ok(Json(product_to_response(product)))
}

/// PATCH /products/merchant/{id}
pub async fn update_product(
    State(state): State<AppState>,
    merchant: Merchant,
    Path(product_id): Path<Uuid>,
    Json(req): Json<UpdateProductRequest>,
) -> ApiResult<Json<ProductResponse>> {
    let start = Instant::now();

    let result = state
        .catalog
        .update_product(
            merchant.tenant_id,
            product_id,
            ProductChanges {
                name: req.name,
                name_ar: req.name_ar,
                price: req.price,
                stock: req.stock,
                is_active: req.is_active,
                category: req.category,
            },
        )
        .await;
    shared::record_op_duration("update_product", start, result.is_ok());
    let product = result?;

    Ok(Json(product_to_response(product)))
}

/// DELETE /products/merchant/{id}
///
/// Frees the product's quota slot
pub async fn delete_product(
    State(state): State<AppState>,
    merchant: Merchant,
    Path(product_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let start = Instant::now();

    let result = state
        .catalog
        .delete_product(merchant.tenant_id, product_id)
        .await;
    shared::record_op_duration("delete_product", start, result.is_ok());
    result?;

    Ok(StatusCode::NO_CONTENT)
}
