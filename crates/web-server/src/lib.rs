use std::sync::Arc;
use std::time::Instant;

use app_config::Settings;
use axum::extract::{Request, State};
use axum::middleware::{self, Next};
use axum::response::{Json, Response};
use axum::routing::{get, post};
use axum::Router;
use broker_client::Broker;
use instruments::InstrumentCache;
use session::SessionStore;
use tokio::net::TcpListener;

pub mod error;
pub mod handlers;
pub mod types;

use types::HealthResponse;
use webhooks::WebhookRegistry;

// Re-export our custom error type for convenience.
pub use error::{Error, Result};

/// The shared application state that is available to all API handlers.
///
/// Each stateful component carries its own interior lock; the state itself
/// is cheap to clone and injected via axum's `State` extractor rather than
/// living in ambient globals.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub broker: Arc<dyn Broker>,
    pub session: Arc<SessionStore>,
    pub instruments: Arc<InstrumentCache>,
    pub webhooks: Arc<WebhookRegistry>,
    pub started_at: Instant,
}

/// Creates the main application router with all routes and middleware.
///
/// Public routes (health, login URL, browser callback) sit outside the
/// api-key guard; everything else requires the internal `x-api-key` header.
/// Session checks happen inside the handlers that proxy to the broker.
pub fn create_router(state: AppState) -> Router {
    let cors = tower_http::cors::CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any);

    let protected = Router::new()
        .route("/auth/status", get(handlers::auth::status_handler))
        .route("/webhook/subscribe", post(handlers::auth::subscribe_webhook_handler))
        .route("/quote", get(handlers::market_data::quote_handler))
        .route("/ltp", post(handlers::market_data::ltp_handler))
        .route("/ohlc", post(handlers::market_data::ohlc_handler))
        .route("/historical", get(handlers::market_data::historical_handler))
        .route("/instruments", get(handlers::market_data::search_instruments_handler))
        .route("/target/calc", post(handlers::calc::target_calc_handler))
        .route("/risk/check", post(handlers::calc::risk_check_handler))
        .route("/place_order", post(handlers::orders::place_order_handler))
        .route("/modify_order", post(handlers::orders::modify_order_handler))
        .route("/cancel_order", post(handlers::orders::cancel_order_handler))
        .route("/orders", get(handlers::orders::list_orders_handler))
        .route("/positions", get(handlers::orders::list_positions_handler))
        .layer(middleware::from_fn_with_state(state.clone(), require_api_key));

    Router::new()
        .route("/health", get(health_check_handler))
        .route("/auth/login_url", get(handlers::auth::login_url_handler))
        .route("/auth/callback", get(handlers::auth::callback_handler))
        .merge(protected)
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Guard for the internal API key.
///
/// An absent header reads as "not authenticated at all" (403), a present but
/// wrong key as a bad credential (401) — the split the original gateway's
/// clients rely on.
async fn require_api_key(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response> {
    match request
        .headers()
        .get("x-api-key")
        .and_then(|value| value.to_str().ok())
    {
        None => Err(Error::MissingApiKey),
        Some(key) if key != state.settings.server.internal_api_key => Err(Error::InvalidApiKey),
        Some(_) => Ok(next.run(request).await),
    }
}

/// Responds with a 200 OK and the process uptime.
async fn health_check_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        ok: true,
        uptime: state.started_at.elapsed().as_secs_f64(),
    })
}

/// The main entry point for running the web server.
///
/// This function sets up the TCP listener and serves the application router.
/// It will run forever until the process is terminated.
pub async fn run(state: AppState) -> Result<()> {
    let address = format!("{}:{}", state.settings.server.host, state.settings.server.port);
    let app = create_router(state);

    tracing::info!("Gateway listening on {}", address);
    let listener = TcpListener::bind(&address)
        .await
        .map_err(Error::ServerBindError)?;

    axum::serve(listener, app.into_make_service())
        .await
        .map_err(Error::ServerBindError)?;

    Ok(())
}
