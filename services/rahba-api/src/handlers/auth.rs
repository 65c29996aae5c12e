//! Authentication handlers (register, login, refresh, logout, me)

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::instrument;

use rahba_auth_core::{RegisterMerchant, TokenPair};
use rahba_db::{TenantRow, UserRow};

use crate::error::ApiResult;
use crate::extractors::AuthUser;
use crate::handlers::shared;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub store_name: String,
    pub subdomain: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user: UserInfo,
    pub store: StoreInfo,
    pub tokens: TokenResponse,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub user: UserInfo,
    pub tokens: TokenResponse,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Deserialize)]
pub struct LogoutRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub success: bool,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: UserInfo,
}

#[derive(Debug, Serialize)]
pub struct UserInfo {
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub role: String,
    pub tenant_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StoreInfo {
    pub id: String,
    pub subdomain: String,
    pub name: String,
    pub status: String,
    pub trial_ends_at: String,
    pub store_url: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
    pub expires_in: u64,
}

fn user_to_info(user: &UserRow) -> UserInfo {
    UserInfo {
        id: user.id.to_string(),
        email: user.email.clone(),
        full_name: user.full_name.clone(),
        role: user.role.clone(),
        tenant_id: user.tenant_id.map(|id| id.to_string()),
    }
}

fn store_to_info(tenant: &TenantRow, base_domain: &str) -> StoreInfo {
    StoreInfo {
        id: tenant.id.to_string(),
        subdomain: tenant.subdomain.clone(),
        name: tenant.name.clone(),
        status: tenant.status.clone(),
        trial_ends_at: tenant.trial_ends_at.to_rfc3339(),
        store_url: format!("https://{}.{}", tenant.subdomain, base_domain),
    }
}

fn tokens_to_response(tokens: TokenPair) -> TokenResponse {
    TokenResponse {
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
        token_type: "Bearer",
        expires_in: tokens.expires_in,
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /auth/register/merchant
///
/// Create a merchant account with its store and trial subscription
#[instrument(skip(state, req), fields(email = %req.email, subdomain = %req.subdomain))]
pub async fn register_merchant(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<RegisterResponse>)> {
    let start = Instant::now();

    let result = state
        .auth
        .register_merchant(RegisterMerchant {
            email: req.email,
            password: req.password,
            full_name: req.full_name,
            store_name: req.store_name,
            subdomain: req.subdomain,
        })
        .await;
    shared::record_op_duration("register_merchant", start, result.is_ok());
    let registered = result?;

    tracing::info!(
        tenant_id = %registered.tenant.id,
        subdomain = %registered.tenant.subdomain,
        "Merchant registered"
    );

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            user: user_to_info(&registered.user),
            store: store_to_info(&registered.tenant, &state.config.public_base_domain),
            tokens: tokens_to_response(registered.tokens),
        }),
    ))
}

/// POST /auth/login
#[instrument(skip(state, req), fields(email = %req.email))]
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<SessionResponse>> {
    let start = Instant::now();

    let result = state.auth.login(&req.email, &req.password).await;
    shared::record_op_duration("login", start, result.is_ok());
    let session = result?;

    Ok(Json(SessionResponse {
        user: user_to_info(&session.user),
        tokens: tokens_to_response(session.tokens),
    }))
}

/// POST /auth/refresh
///
/// Rotate a refresh token into a fresh token pair
pub async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> ApiResult<Json<SessionResponse>> {
    let start = Instant::now();

    let result = state.auth.refresh(&req.refresh_token).await;
    shared::record_op_duration("refresh", start, result.is_ok());
    let session = result?;

    Ok(Json(SessionResponse {
        user: user_to_info(&session.user),
        tokens: tokens_to_response(session.tokens),
    }))
}

/// POST /auth/logout
///
/// Revoke a refresh token; unknown tokens are ignored
pub async fn logout(
    State(state): State<AppState>,
    Json(req): Json<LogoutRequest>,
) -> ApiResult<Json<LogoutResponse>> {
    state.auth.logout(&req.refresh_token).await?;

    Ok(Json(LogoutResponse { success: true }))
}

/// GET /auth/me
pub async fn me(State(state): State<AppState>, user: AuthUser) -> ApiResult<Json<MeResponse>> {
    let current = state.auth.current_user(user.user_id).await?;

    Ok(Json(MeResponse {
        user: user_to_info(&current),
    }))
}
