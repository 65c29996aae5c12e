//! Axum extractors for authentication and storefront tenant resolution

use axum::Json;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use uuid::Uuid;

use rahba_auth_core::AuthenticatedUser;
use rahba_db::{TenantRepository, TenantRow};
use rahba_types::Role;

use crate::state::AppState;

/// Authenticated caller extracted from the Authorization header
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub tenant_id: Option<Uuid>,
    pub role: Role,
}

impl From<AuthenticatedUser> for AuthUser {
    fn from(user: AuthenticatedUser) -> Self {
        Self {
            user_id: user.user_id,
            tenant_id: user.tenant_id,
            role: user.role,
        }
    }
}

/// Merchant caller: the merchant role plus the store it belongs to
#[derive(Debug, Clone, Copy)]
pub struct Merchant {
    pub user_id: Uuid,
    pub tenant_id: Uuid,
}

/// Platform admin caller
#[derive(Debug, Clone, Copy)]
pub struct Admin {
    pub user_id: Uuid,
}

/// Storefront tenant resolved from the request's subdomain
#[derive(Debug, Clone)]
pub struct Storefront {
    pub tenant: TenantRow,
}

/// Error response for extractor failures
#[derive(Debug, Serialize)]
struct AuthErrorResponse {
    error: AuthErrorDetail,
}

#[derive(Debug, Serialize)]
struct AuthErrorDetail {
    code: &'static str,
    message: &'static str,
}

/// Auth rejection type
pub struct AuthRejection {
    status: StatusCode,
    code: &'static str,
    message: &'static str,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let body = AuthErrorResponse {
            error: AuthErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);

        let token = extract_token(parts)?;

        let user = app_state.auth.verify_access_token(&token).map_err(|e| {
            tracing::debug!(error = ?e, "Access token rejected");
            AuthRejection {
                status: StatusCode::UNAUTHORIZED,
                code: "INVALID_TOKEN",
                message: "Invalid or expired token",
            }
        })?;

        Ok(AuthUser::from(user))
    }
}

impl<S> FromRequestParts<S> for Merchant
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;

        if user.role != Role::Merchant {
            return Err(AuthRejection {
                status: StatusCode::FORBIDDEN,
                code: "FORBIDDEN",
                message: "Merchant access required",
            });
        }
        let tenant_id = user.tenant_id.ok_or(AuthRejection {
            status: StatusCode::FORBIDDEN,
            code: "FORBIDDEN",
            message: "Merchant account has no store",
        })?;

        Ok(Merchant {
            user_id: user.user_id,
            tenant_id,
        })
    }
}

impl<S> FromRequestParts<S> for Admin
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;

        if user.role != Role::SuperAdmin {
            return Err(AuthRejection {
                status: StatusCode::FORBIDDEN,
                code: "FORBIDDEN",
                message: "Admin access required",
            });
        }

        Ok(Admin {
            user_id: user.user_id,
        })
    }
}

impl<S> FromRequestParts<S> for Storefront
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);

        let subdomain = subdomain_from_parts(parts, &app_state.config.public_base_domain)?;

        let tenant = app_state
            .repos
            .tenants
            .find_by_subdomain(&subdomain)
            .await
            .map_err(|e| {
                tracing::error!(error = ?e, subdomain = %subdomain, "Tenant lookup failed");
                AuthRejection {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    code: "DATABASE_ERROR",
                    message: "Store lookup failed",
                }
            })?
            .ok_or_else(no_store_here)?;

        Ok(Storefront { tenant })
    }
}

/// Extract a bearer token from the Authorization header
fn extract_token(parts: &Parts) -> Result<String, AuthRejection> {
    if let Some(auth_header) = parts.headers.get(header::AUTHORIZATION) {
        let auth_str = auth_header.to_str().map_err(|_| AuthRejection {
            status: StatusCode::BAD_REQUEST,
            code: "INVALID_HEADER",
            message: "Invalid Authorization header encoding",
        })?;

        if let Some(token) = auth_str.strip_prefix("Bearer ") {
            return Ok(token.to_string());
        }
    }

    Err(AuthRejection {
        status: StatusCode::UNAUTHORIZED,
        code: "MISSING_TOKEN",
        message: "No authentication token provided",
    })
}

/// Resolve the store subdomain for a storefront request.
///
/// An `X-Tenant-Subdomain` header wins when present (curl and admin tooling
/// rarely control the Host header); otherwise the Host header is matched
/// against the public base domain and the leading label is taken.
fn subdomain_from_parts(parts: &Parts, base_domain: &str) -> Result<String, AuthRejection> {
    if let Some(value) = parts.headers.get("x-tenant-subdomain") {
        let raw = value.to_str().map_err(|_| AuthRejection {
            status: StatusCode::BAD_REQUEST,
            code: "INVALID_HEADER",
            message: "Invalid X-Tenant-Subdomain header encoding",
        })?;
        let subdomain = raw.trim().to_lowercase();
        if subdomain.is_empty() {
            return Err(no_store_here());
        }
        return Ok(subdomain);
    }

    let host = parts
        .headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(no_store_here)?;

    host_subdomain(host, base_domain).ok_or_else(no_store_here)
}

/// Extract the store label from a Host header value.
///
/// `amina.rahba.dz` against base `rahba.dz` yields `amina`; the bare base
/// domain, unrelated hosts and nested labels carry no store.
fn host_subdomain(host: &str, base_domain: &str) -> Option<String> {
    let host = host.split(':').next()?.trim().to_lowercase();
    let label = host.strip_suffix(base_domain)?.strip_suffix('.')?;
    if label.is_empty() || label.contains('.') {
        return None;
    }
    Some(label.to_string())
}

fn no_store_here() -> AuthRejection {
    AuthRejection {
        status: StatusCode::NOT_FOUND,
        code: "TENANT_NOT_FOUND",
        message: "No store at this address",
    }
}
