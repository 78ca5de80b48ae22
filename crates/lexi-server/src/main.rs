//! lexi-server – entry point.
//!
//! Startup order:
//! 1. Parse configuration from environment variables.
//! 2. Initialise structured tracing (JSON or human-readable).
//! 3. Wire the upstream adapter into the proxy core.
//! 4. Build the Axum router and serve with graceful shutdown.

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{info, warn};

use lexi_core::proxy::ChatProxy;
use lexi_server::config::Config;
use lexi_server::routes;
use lexi_server::state::AppState;
use lexi_server::upstream::OpenAiUpstream;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Configuration ───────────────────────────────────────────────────────
    let cfg = Config::from_env();

    // ── 2. Tracing ─────────────────────────────────────────────────────────────
    let env_filter = match tracing_subscriber::EnvFilter::try_from_default_env() {
        Ok(f) => f,
        Err(_) => match cfg.log_level.parse::<tracing_subscriber::EnvFilter>() {
            Ok(f) => f,
            Err(e) => {
                eprintln!(
                    "WARN: LEXI_LOG='{}' is not a valid tracing filter ({}); \
                     falling back to 'info'",
                    cfg.log_level, e
                );
                tracing_subscriber::EnvFilter::new("info")
            }
        },
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true);

    if cfg.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    info!(version = env!("CARGO_PKG_VERSION"), "lexi-server starting");

    // ── 3. Proxy core ──────────────────────────────────────────────────────────
    if cfg.api_key.is_none() {
        warn!("GITHUB_TOKEN is not set; chat requests will fail until it is");
    }
    let upstream = OpenAiUpstream::new(cfg.proxy.api_base.clone(), cfg.api_key.clone());
    let proxy = ChatProxy::new(cfg.proxy.clone(), Arc::new(upstream));
    info!(
        model = %cfg.proxy.model,
        api_base = %cfg.proxy.api_base,
        "proxy ready"
    );

    let state = Arc::new(AppState {
        config: Arc::new(cfg.clone()),
        proxy: Arc::new(proxy),
    });

    // ── 4. HTTP server with graceful shutdown ──────────────────────────────────
    let app = routes::build(state);
    let addr: SocketAddr = cfg.bind_address.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("lexi-server stopped");
    Ok(())
}

/// Returns a future that resolves when SIGINT (Ctrl-C) or SIGTERM is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to install CTRL+C signal handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => warn!(error = %e, "failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    info!("shutdown signal received; starting graceful shutdown");
}
