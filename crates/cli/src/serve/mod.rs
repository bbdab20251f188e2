//! `trace serve` -- HTTP JSON API over the traceability contract.
//!
//! Exposes the operation dispatcher as an async HTTP service using
//! `axum` + `tokio`, backed by one file ledger.
//!
//! Security features:
//! - Caller identity comes from `X-Affiliation` / `X-Permissions` headers,
//!   which an authenticating gateway is expected to set
//! - CORS headers on all responses (permissive)
//! - Optional API key authentication via `TRACE_API_KEY` or `[serve] api_key`
//!
//! Endpoints:
//! - GET  /health                 - Server status (exempt from auth)
//! - GET  /lifecycle              - Lifecycle graph
//! - POST /init                   - Create the empty product index
//! - POST /invoke/{function}      - Invoke a named operation, body `{"args": [..]}`
//! - GET  /query/{key}            - Committed bytes at a ledger key
//! - GET  /products               - The product index
//! - GET  /products/{productId}   - One product record
//!
//! All responses use Content-Type: application/json.

mod handlers;
mod identity;
mod middleware;
mod state;

use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::{Method, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{middleware as axum_middleware, Json, Router};
use tower_http::cors::{Any, CorsLayer};
use trace_contract::TransitionEngine;
use trace_ledger::FileLedger;

use self::handlers::{
    handle_get_product, handle_health, handle_init, handle_invoke, handle_lifecycle,
    handle_list_products, handle_not_found, handle_query,
};
use self::middleware::auth_middleware;
use self::state::AppState;

/// Maximum request body size: 64 KB.
const MAX_BODY_SIZE: usize = 64 * 1024;

/// Settings for [`start_server`].
pub(crate) struct ServeOptions {
    pub(crate) ledger_path: PathBuf,
    pub(crate) port: u16,
    pub(crate) api_key: Option<String>,
    pub(crate) tls_cert: Option<PathBuf>,
    pub(crate) tls_key: Option<PathBuf>,
}

/// Construct a JSON error response with the given status code and message.
fn json_error(status: StatusCode, message: &str) -> impl IntoResponse {
    (status, Json(serde_json::json!({"error": message})))
}

fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/lifecycle", get(handle_lifecycle))
        .route("/init", post(handle_init))
        .route("/invoke/{function}", post(handle_invoke))
        .route("/query/{key}", get(handle_query))
        .route("/products", get(handle_list_products))
        .route("/products/{product_id}", get(handle_get_product))
        .fallback(handle_not_found)
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .layer(cors)
        .layer(DefaultBodyLimit::max(MAX_BODY_SIZE))
        .with_state(state)
}

/// Start the HTTP server.
///
/// When TLS cert/key paths are provided and the `tls` feature is enabled,
/// the server listens over HTTPS using `axum-server` with rustls.
/// Otherwise it uses plain HTTP.
pub(crate) async fn start_server(options: ServeOptions) -> Result<(), Box<dyn std::error::Error>> {
    let ledger = FileLedger::open(&options.ledger_path)?;
    tracing::info!(ledger = %options.ledger_path.display(), "ledger opened");

    if options.api_key.is_some() {
        tracing::info!("API key authentication enabled");
    }

    let state = Arc::new(AppState {
        engine: TransitionEngine::new(ledger),
        api_key: options.api_key,
    });
    let app = router(state);
    let addr = format!("0.0.0.0:{}", options.port);

    #[cfg(feature = "tls")]
    if let (Some(cert_path), Some(key_path)) = (&options.tls_cert, &options.tls_key) {
        let config =
            axum_server::tls_rustls::RustlsConfig::from_pem_file(cert_path, key_path).await?;
        let socket_addr: std::net::SocketAddr = addr.parse()?;
        tracing::info!("listening on https://{}", addr);
        axum_server::bind_rustls(socket_addr, config)
            .serve(app.into_make_service())
            .await?;
        return Ok(());
    }

    #[cfg(not(feature = "tls"))]
    if options.tls_cert.is_some() || options.tls_key.is_some() {
        return Err("TLS requires building with the `tls` feature".into());
    }

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("listening on http://{}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server shut down");
    Ok(())
}

/// Wait for a shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("received shutdown signal");
}
