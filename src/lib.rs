pub mod api;
pub mod auth;
pub mod cleanup;
pub mod cli;
pub mod db;
pub mod jwt;

use api::create_api_router;
use auth::{
    AccessPolicy, RequestGate, SessionAuthority, SessionSettings, prepare_dummy_hash, request_gate,
};
use axum::{Router, middleware};
use db::Database;
use jwt::TokenCodec;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{debug, warn};

pub struct ServerConfig {
    /// Database connection (cloneable, uses connection pool internally)
    pub db: Database,
    /// Secret for signing session tokens
    pub jwt_secret: Vec<u8>,
    /// Session lifetime and login lockout
    pub session: SessionSettings,
    /// Whether protected paths also accept HTTP Basic credentials
    pub allow_basic_auth: bool,
    /// Paths reachable without authentication
    pub policy: AccessPolicy,
}

/// Build the session authority backed by the configured database.
pub fn session_authority(config: &ServerConfig) -> Arc<SessionAuthority> {
    Arc::new(SessionAuthority::new(
        Arc::new(TokenCodec::new(&config.jwt_secret)),
        Arc::new(config.db.sessions()),
        Arc::new(config.db.accounts()),
        config.session,
    ))
}

/// Create the application router with the given configuration.
pub fn create_app(config: &ServerConfig) -> Router {
    if !prepare_dummy_hash() {
        warn!("Failed to build dummy password hash; unknown-user logins will answer faster");
    }

    let authority = session_authority(config);
    let gate = Arc::new(RequestGate::new(
        Arc::new(config.policy.clone()),
        authority.clone(),
        config.allow_basic_auth,
    ));

    debug!(
        rules = gate.policy().rules().len(),
        allow_basic_auth = config.allow_basic_auth,
        "Access policy loaded"
    );

    // Request stages, outermost first. The gate must run before anything else.
    let stages = ServiceBuilder::new()
        .layer(middleware::from_fn_with_state(gate.clone(), request_gate))
        .layer(TraceLayer::new_for_http());

    create_api_router(config.db.clone(), authority, gate).layer(stages)
}

/// Run cleanup tasks and spawn background scheduler.
/// Call this before starting the server.
pub async fn init_cleanup(config: &ServerConfig) {
    let authority = session_authority(config);
    cleanup::run_cleanup(&authority).await;
    cleanup::spawn_cleanup_scheduler(authority);
}

/// Run the server on the given listener. This function blocks until the server exits.
/// Call `init_cleanup` before this to run cleanup on startup.
pub async fn run_server(config: ServerConfig, listener: TcpListener) -> Result<(), std::io::Error> {
    let app = create_app(&config);
    let make_service = app.into_make_service_with_connect_info::<SocketAddr>();
    axum::serve(listener, make_service).await
}

/// Start the server on the given port in a background task. Use port 0 to let the OS choose a random port.
/// Returns the actual address the server is listening on.
pub async fn start_server(
    config: ServerConfig,
    port: u16,
) -> Result<(tokio::task::JoinHandle<()>, SocketAddr), std::io::Error> {
    init_cleanup(&config).await;

    let listener = TcpListener::bind(("127.0.0.1", port)).await?;
    let local_addr = listener.local_addr()?;

    let handle = tokio::spawn(async move {
        run_server(config, listener).await.ok();
    });

    Ok((handle, local_addr))
}
