//! Hub server setup
//!
//! Provides the WebSocket endpoint, the health check and optional static file serving.

mod handler;
mod state;

pub use handler::hub_handler;
pub use state::HubState;

use axum::{routing::get, Router};
use chat_common::{AppConfig, AppError, AppResult};
use tokio::net::TcpListener;
use tower_http::{services::ServeDir, trace::TraceLayer};

/// Create the hub router
///
/// The WebSocket endpoint is mounted at `path`; when `static_dir` is set, unmatched
/// requests are served from that directory.
pub fn create_router(path: &str, static_dir: Option<&str>) -> Router<HubState> {
    let router = Router::new()
        .route(path, get(hub_handler))
        .route("/health", get(health_check));

    match static_dir {
        Some(dir) => router.fallback_service(ServeDir::new(dir)),
        None => router,
    }
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

/// Build the complete application
pub fn create_app(state: HubState) -> Router {
    let config = state.config();
    create_router(&config.hub.path, config.static_files.dir.as_deref())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve `app` on an already bound listener
pub async fn serve(listener: TcpListener, app: Router) -> AppResult<()> {
    axum::serve(listener, app)
        .await
        .map_err(|e| AppError::Server(e.to_string()))
}

/// Bind `addr` and run the hub server
pub async fn run_server(app: Router, addr: &str) -> AppResult<()> {
    tracing::info!("Starting hub server on {}", addr);

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::bind(addr, e))?;

    if let Ok(local) = listener.local_addr() {
        tracing::info!("Hub listening on {}", local);
    }

    serve(listener, app).await
}

/// Run the complete hub server with configuration
pub async fn run(config: AppConfig) -> AppResult<()> {
    let addr = config.hub.address();

    tracing::info!(
        path = %config.hub.path,
        max_connections = config.limits.max_connections,
        static_dir = ?config.static_files.dir,
        "Hub configured"
    );

    let state = HubState::new(config);
    let app = create_app(state);

    run_server(app, &addr).await
}
