//! Rahba API
//!
//! Multi-tenant e-commerce backend for Algerian merchants: subdomain
//! storefronts with cash-on-delivery checkout, a merchant dashboard,
//! BaridiMob payment review and platform administration.
//!
//! ## REST Endpoints
//!
//! - `POST /auth/register/merchant` - Create merchant, store and trial
//! - `POST /auth/login` / `POST /auth/refresh` / `POST /auth/logout`
//! - `GET /auth/me` - Current account
//! - `GET /products` - Public storefront catalog (tenant from subdomain)
//! - `GET|POST /products/merchant`, `GET|PATCH|DELETE /products/merchant/{id}`
//! - `POST /orders/checkout` - Public cash-on-delivery checkout
//! - `GET /orders/track/{order_number}` - Public order tracking
//! - `GET /orders/merchant`, `GET /orders/merchant/{id}`,
//!   `PATCH /orders/merchant/{id}/status`
//! - `GET /subscription`, `POST /subscription/payment/submit`
//! - `GET /merchant/limits` - Trial quota advisory
//! - `GET /admin/payments`, `POST /admin/payments/{id}/approve`,
//!   `POST /admin/payments/{id}/reject`, `GET /admin/tenants`
//! - `GET /delivery/zones` - Public wilaya fee table
//!
//! ## Health Endpoints
//!
//! - `GET /health` - Liveness probe
//! - `GET /health/db` - Readiness probe
//! - `GET /metrics` - Prometheus metrics

mod config;
mod error;
mod extractors;
mod handlers;
mod jobs;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::http::HeaderValue;
use axum::routing::{get, patch, post};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use uuid::Uuid;

use rahba_auth_core::AuthService;
use rahba_billing_core::{BillingService, NoopNotifier, Notifier, Sweeper, TelegramNotifier};
use rahba_db::{CreateUser, Repositories, UserRepository};
use rahba_store_core::{
    CatalogService, DeliveryProvider, HttpCarrier, MockCarrier, OrderService, QuotaGuard,
    ZoneFeeResolver,
};
use rahba_types::Role;

use crate::config::{BootstrapAdmin, Config, DeliveryProviderConfig};
use crate::handlers::{health, health_db};
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive("rahba_api=debug".parse()?))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Rahba API");

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!(
        bind_addr = %config.bind_addr,
        base_domain = %config.public_base_domain,
        "Configuration loaded"
    );

    // Initialize metrics
    let metrics_handle = setup_metrics()?;

    // Create database pool
    let pool = rahba_db::create_pool(&config.database_url).await?;
    tracing::info!("Database pool created");

    if config.auto_migrate {
        rahba_db::run_migrations(&pool).await?;
        tracing::info!("Database migrations applied");
    }

    // Create repositories
    let repos = Repositories::new(pool.clone());

    if config.auto_seed {
        let seeded = rahba_db::seed_delivery_zones(&repos.delivery_zones).await?;
        tracing::info!(seeded, "Delivery zone table seeded");
    }

    if let Some(bootstrap) = &config.bootstrap_admin {
        ensure_bootstrap_admin(&repos, bootstrap).await?;
    }

    // Create domain services
    let quota = QuotaGuard::new(Arc::new(repos.tenants.clone()));
    let zones = ZoneFeeResolver::new(Arc::new(repos.delivery_zones.clone()));

    let auth = AuthService::new(
        config.auth.clone(),
        Arc::new(repos.users.clone()),
        Arc::new(repos.sessions.clone()),
        Arc::new(repos.tenants.clone()),
    );
    let catalog = CatalogService::new(Arc::new(repos.products.clone()), quota.clone());
    let orders = OrderService::new(
        Arc::new(repos.orders.clone()),
        Arc::new(repos.products.clone()),
        quota.clone(),
        zones.clone(),
        build_carrier(&config.delivery),
    );
    let billing = BillingService::new(
        Arc::new(repos.subscriptions.clone()),
        Arc::new(repos.payments.clone()),
    );

    let notifier: Arc<dyn Notifier> = match &config.telegram {
        Some(telegram) => Arc::new(TelegramNotifier::new(
            telegram.bot_token.clone(),
            telegram.chat_id.clone(),
        )),
        None => Arc::new(NoopNotifier),
    };
    let sweeper = Arc::new(Sweeper::new(
        Arc::new(repos.tenants.clone()),
        Arc::new(repos.subscriptions.clone()),
        notifier,
    ));

    // Create application state
    let state = AppState::new(
        auth,
        catalog,
        orders,
        billing,
        quota,
        zones,
        repos,
        pool,
        config.clone(),
    );

    // Start expiry sweeps
    jobs::spawn_sweeps(sweeper, config.sweep_interval);

    // Build HTTP router; /metrics joins the main router unless it has its
    // own listener
    let inline_metrics = config.metrics_addr.is_none().then(|| metrics_handle.clone());
    let app = build_router(state, inline_metrics);

    // Run servers concurrently
    tokio::select! {
        result = run_http_server(app, config.bind_addr) => {
            if let Err(e) = result {
                tracing::error!(error = ?e, "HTTP server error");
            }
        }
        result = run_metrics_server(config.metrics_addr, metrics_handle) => {
            if let Err(e) = result {
                tracing::error!(error = ?e, "Metrics server error");
            }
        }
        () = shutdown_signal() => {
            tracing::info!("Shutdown signal received");
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

fn build_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let request_timeout = state.request_timeout();
    let cors = build_cors(&state.config.cors_origins);

    // Public auth routes
    let auth_routes = Router::new()
        .route(
            "/auth/register/merchant",
            post(handlers::register_merchant),
        )
        .route("/auth/login", post(handlers::login))
        .route("/auth/refresh", post(handlers::refresh))
        .route("/auth/logout", post(handlers::logout))
        .route("/auth/me", get(handlers::me));

    // Storefront routes (tenant resolved from the subdomain)
    let storefront_routes = Router::new()
        .route("/products", get(handlers::storefront_products))
        .route("/orders/checkout", post(handlers::checkout))
        .route("/orders/track/{order_number}", get(handlers::track_order))
        .route("/delivery/zones", get(handlers::list_zones));

    // Merchant dashboard routes
    let merchant_routes = Router::new()
        .route(
            "/products/merchant",
            get(handlers::list_products).post(handlers::create_product),
        )
        .route(
            "/products/merchant/{id}",
            get(handlers::get_product)
                .patch(handlers::update_product)
                .delete(handlers::delete_product),
        )
        .route("/orders/merchant", get(handlers::list_orders))
        .route("/orders/merchant/{id}", get(handlers::get_order))
        .route(
            "/orders/merchant/{id}/status",
            patch(handlers::update_order_status),
        )
        .route("/subscription", get(handlers::get_subscription))
        .route(
            "/subscription/payment/submit",
            post(handlers::submit_payment),
        )
        .route("/merchant/limits", get(handlers::get_limits));

    // Platform admin routes
    let admin_routes = Router::new()
        .route("/admin/payments", get(handlers::list_payments))
        .route(
            "/admin/payments/{id}/approve",
            post(handlers::approve_payment),
        )
        .route(
            "/admin/payments/{id}/reject",
            post(handlers::reject_payment),
        )
        .route("/admin/tenants", get(handlers::list_tenants));

    // Health routes (no timeout - must always respond quickly)
    let health_routes = Router::new()
        .route("/health", get(health))
        .route("/health/db", get(health_db));

    // Metrics route (no timeout)
    let metrics_route = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    // Build middleware stack (order matters - outermost first)
    let middleware = ServiceBuilder::new()
        // Request ID propagation (outermost)
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        // Tracing with request details
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // CORS
        .layer(cors)
        // Request timeout (innermost - closest to handler)
        .layer(TimeoutLayer::new(request_timeout));

    // Combine all routes
    Router::new()
        .merge(auth_routes)
        .merge(storefront_routes)
        .merge(merchant_routes)
        .merge(admin_routes)
        .layer(middleware)
        .merge(health_routes) // Health routes without timeout
        .merge(metrics_route) // Metrics route without timeout
        .with_state(state)
}

fn build_cors(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let list: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(list))
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Create a carrier client when one is configured; the mock carrier is
/// only ever used when asked for explicitly.
fn build_carrier(delivery: &DeliveryProviderConfig) -> Option<Arc<dyn DeliveryProvider>> {
    match delivery {
        DeliveryProviderConfig::None => None,
        DeliveryProviderConfig::Mock => Some(Arc::new(MockCarrier::new())),
        DeliveryProviderConfig::Http(carrier) => Some(Arc::new(HttpCarrier::new(carrier.clone()))),
    }
}

/// Create the super-admin account on first boot if it does not exist yet.
async fn ensure_bootstrap_admin(
    repos: &Repositories,
    bootstrap: &BootstrapAdmin,
) -> anyhow::Result<()> {
    if repos.users.find_by_email(&bootstrap.email).await?.is_some() {
        tracing::debug!("Bootstrap admin already exists");
        return Ok(());
    }

    anyhow::ensure!(
        bootstrap.password.len() >= 8,
        "BOOTSTRAP_ADMIN_PASSWORD must be at least 8 characters"
    );

    let password_hash = rahba_auth_core::hash_password(&bootstrap.password)?;
    repos
        .users
        .create(CreateUser {
            id: Uuid::new_v4(),
            tenant_id: None,
            email: bootstrap.email.clone(),
            password_hash,
            full_name: "Platform Admin".to_string(),
            role: Role::SuperAdmin.to_string(),
        })
        .await?;

    tracing::info!(email = %bootstrap.email, "Bootstrap admin created");
    Ok(())
}

async fn run_http_server(app: Router, addr: SocketAddr) -> anyhow::Result<()> {
    tracing::info!("HTTP server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Serve `/metrics` on its own listener; without one this future parks
/// forever and the main router serves the route instead.
async fn run_metrics_server(
    addr: Option<SocketAddr>,
    handle: PrometheusHandle,
) -> anyhow::Result<()> {
    let Some(addr) = addr else {
        std::future::pending::<()>().await;
        return Ok(());
    };

    tracing::info!("Metrics server listening on {}", addr);
    let app = Router::new().route("/metrics", get(move || async move { handle.render() }));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn setup_metrics() -> anyhow::Result<PrometheusHandle> {
    // Most handlers finish well under 100ms; checkout and payment approval
    // touch several rows and sit in the tail
    let latency_buckets = &[0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.2, 0.5, 1.0, 2.5];

    let builder = PrometheusBuilder::new().set_buckets_for_metric(
        Matcher::Full("api_operation_duration_seconds".to_string()),
        latency_buckets,
    )?;

    let handle = builder.install_recorder()?;

    // Register metrics with descriptions
    metrics::describe_counter!("orders_placed_total", "Total storefront orders placed");
    metrics::describe_counter!(
        "payments_submitted_total",
        "Total BaridiMob payment proofs submitted"
    );
    metrics::describe_counter!(
        "payments_approved_total",
        "Total payments approved by admins"
    );
    metrics::describe_counter!(
        "payments_rejected_total",
        "Total payments rejected by admins"
    );
    metrics::describe_counter!(
        "sweep_transitions_total",
        "Total rows transitioned by expiry sweeps"
    );
    metrics::describe_histogram!(
        "api_operation_duration_seconds",
        "API operation latency in seconds by operation and result"
    );

    Ok(handle)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
