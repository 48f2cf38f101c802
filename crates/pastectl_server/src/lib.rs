//! HTTP server wiring for pastectl (API, live updates, and shared state).

/// Per-paste live update fan-out.
pub mod broadcast;
/// HTTP error mapping for API handlers.
pub mod error;
/// HTTP handlers for paste and live update endpoints.
pub mod handlers;
/// Periodic expiry sweeper.
pub mod sweeper;

pub use broadcast::Broadcaster;
pub use pastectl_core::{
    config, db, models, AppError, Config, PasteService, RedbStore, StoreError, DEFAULT_PORT,
};
pub use sweeper::{spawn_sweeper, SweeperHandle};

use axum::{
    extract::{ws::Message, DefaultBodyLimit},
    http::{header, HeaderValue, Method},
    routing::{get, post, put},
    Router,
};
use std::future::Future;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, CorsLayer},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};

const CONTENT_SECURITY_POLICY: &str = "default-src 'self'; frame-ancestors 'none'; base-uri 'self'";

/// Shared state passed to HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<PasteService<RedbStore>>,
    pub config: Arc<Config>,
    pub live: Arc<Broadcaster<Message>>,
}

impl AppState {
    /// Construct shared application state.
    ///
    /// # Arguments
    /// - `config`: Loaded configuration.
    /// - `store`: Open paste store.
    ///
    /// # Returns
    /// A new [`AppState`] with an empty live update registry.
    pub fn new(config: Config, store: RedbStore) -> Self {
        Self {
            service: Arc::new(PasteService::new(store)),
            config: Arc::new(config),
            live: Arc::new(Broadcaster::default()),
        }
    }
}

/// Origin of the web frontend's development server.
const DEV_FRONTEND_ORIGIN: &str = "http://localhost:3000";

/// Create the application router with all routes and middleware.
///
/// # Arguments
/// - `state`: Shared application state.
///
/// # Returns
/// Configured `axum::Router`.
pub fn create_app(state: AppState) -> Router {
    let cors_port = state.config.port;
    create_app_with_cors_port(state, cors_port)
}

/// Browser origins allowed to call the API: the configured frontend, its
/// development server, and pages served from this server's own port.
fn allowed_origins(config: &Config, cors_port: u16) -> Vec<HeaderValue> {
    let own_port = [
        format!("http://localhost:{}", cors_port),
        format!("http://127.0.0.1:{}", cors_port),
    ];

    config
        .frontend_url
        .iter()
        .map(String::as_str)
        .chain([DEV_FRONTEND_ORIGIN])
        .chain(own_port.iter().map(String::as_str))
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::warn!("Ignoring invalid CORS origin '{}': {}", origin, err);
                None
            }
        })
        .collect()
}

fn create_app_with_cors_port(state: AppState, cors_port: u16) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed_origins(&state.config, cors_port)))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

    Router::new()
        .route("/api/pastes", post(handlers::paste::create_paste))
        .route(
            "/api/pastes/:id",
            get(handlers::paste::get_paste).put(handlers::paste::update_paste),
        )
        .route("/api/pastes/:id/raw", get(handlers::paste::get_raw_content))
        .route("/api/pastes/:id/view", put(handlers::paste::increment_views))
        .route("/api/ws/:id", get(handlers::live::live_updates))
        .with_state(state.clone())
        .layer(
            tower::ServiceBuilder::new()
                // JSON framing adds overhead on top of the raw content limit.
                .layer(DefaultBodyLimit::max(
                    state.config.max_paste_size.saturating_mul(2),
                ))
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(cors)
                .layer(SetResponseHeaderLayer::overriding(
                    header::CONTENT_SECURITY_POLICY,
                    HeaderValue::from_static(CONTENT_SECURITY_POLICY),
                ))
                .layer(SetResponseHeaderLayer::overriding(
                    header::X_CONTENT_TYPE_OPTIONS,
                    HeaderValue::from_static("nosniff"),
                ))
                .layer(SetResponseHeaderLayer::overriding(
                    header::X_FRAME_OPTIONS,
                    HeaderValue::from_static("DENY"),
                )),
        )
}

fn listener_cors_port(listener: &tokio::net::TcpListener, fallback_port: u16) -> u16 {
    listener
        .local_addr()
        .map(|addr| addr.port())
        .unwrap_or(fallback_port)
}

/// Run the Axum server with graceful shutdown support.
///
/// Once `shutdown_signal` resolves the live update registry is closed so open
/// WebSocket sessions end and the server can drain.
///
/// # Errors
/// Returns any I/O error produced by `axum::serve`.
pub async fn serve_router(
    listener: tokio::net::TcpListener,
    state: AppState,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<(), std::io::Error> {
    let cors_port = listener_cors_port(&listener, state.config.port);
    let live = state.live.clone();
    let app = create_app_with_cors_port(state, cors_port);
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal.await;
            tracing::info!("Shutdown requested, closing live update sessions");
            live.shutdown();
        })
        .await
}
