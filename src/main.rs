//! Credential Service Server
//!
//! Registers accounts, authenticates email/password pairs and issues
//! access/refresh token pairs over HTTP.

use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::{routing::get, Router};
use std::sync::Arc;
use tokio::signal;
use tower_http::cors::CorsLayer;

use credential_service::auth::{AuthService, JwtTokenManager};
use credential_service::config::Config;
use credential_service::db::{self, PoolSettings, StoreHealth};
use credential_service::routes;
use credential_service::state::AppState;
use credential_service::store::PgUserStore;

#[tokio::main]
async fn main() {
    // Load configuration
    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!(environment = %config.environment.as_str(), "Starting credential service");

    // The service cannot run without its store
    let db_pool = match db::create_pool(&PoolSettings::from_config(&config)).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!(error = %e, "Database unavailable");
            std::process::exit(1);
        }
    };

    if let Err(e) = db::run_migrations(&db_pool).await {
        tracing::error!(error = %e, "Migrations failed");
        std::process::exit(1);
    }

    let auth_service = Arc::new(AuthService::new(
        Arc::new(PgUserStore::new(db_pool.clone())),
        Arc::new(JwtTokenManager::new(&config.token_secrets)),
        config.access_token_ttl,
        config.refresh_token_ttl,
        config.bcrypt_cost,
    ));

    let app_state = AppState::new(auth_service);

    let health_db_pool = db_pool.clone();

    let app = Router::new()
        .route("/health", get(move || health_check(health_db_pool.clone())))
        .merge(routes::create_router(app_state))
        .layer(configure_cors(&config));

    let addr = config.bind_address();
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = %e, %addr, "Failed to bind listener");
            std::process::exit(1);
        }
    };

    tracing::info!("Server listening on {}", addr);
    tracing::info!("Health check at http://{}/health", addr);

    // Serve with graceful shutdown
    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(error = %e, "Server error");
    }

    tracing::info!("Server shutdown complete");
}

/// Health check response
#[derive(serde::Serialize)]
struct HealthResponse {
    status: &'static str,
    store: StoreHealth,
    version: &'static str,
}

/// Health check endpoint; 503 while logins cannot be served
async fn health_check(pool: sqlx::PgPool) -> (StatusCode, axum::Json<HealthResponse>) {
    let store = db::check_health(&pool).await;
    let (code, status) = if store.is_ready() {
        (StatusCode::OK, "healthy")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "unhealthy")
    };

    (
        code,
        axum::Json(HealthResponse {
            status,
            store,
            version: env!("CARGO_PKG_VERSION"),
        }),
    )
}

fn configure_cors(config: &Config) -> CorsLayer {
    let Some(allowed_origins_str) = config.cors_allowed_origins.as_deref() else {
        if config.environment.is_production() {
            tracing::warn!("CORS_ALLOWED_ORIGINS not set in production, cross-origin requests are refused");
            return CorsLayer::new();
        }
        tracing::warn!("CORS_ALLOWED_ORIGINS not set, allowing all origins (permissive)");
        return CorsLayer::permissive();
    };

    let origins: Vec<HeaderValue> = allowed_origins_str
        .split(',')
        .filter_map(|s| s.trim().parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}
