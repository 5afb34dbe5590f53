//! HTTP surface of the Worldwide travel log.
//!
//! # Responsibility
//! - Expose the city resource over REST/JSON.
//! - Own process startup and shutdown ordering: connect the store, serve,
//!   then close the store on every exit path.

pub mod config;
pub mod cors;
pub mod error;
pub mod routes;
pub mod state;

use anyhow::Context;
use log::{info, warn};
use tokio::net::TcpListener;
use worldwide_core::Gateway;

pub use config::ServerConfig;
pub use cors::build_cors_layer;
pub use error::ApiError;
pub use routes::router;
pub use state::AppState;

/// Connects the store and serves until a shutdown signal arrives.
///
/// The gateway is closed after the server drains, and also on early
/// returns because `Gateway` closes itself on drop.
pub async fn run(config: ServerConfig) -> anyhow::Result<()> {
    let mut gateway = Gateway::new(config.gateway_config());
    let database = gateway
        .connect()
        .context("failed to connect to the document store")?;

    let app = router(
        AppState::new(&database),
        build_cors_layer(&config.cors_origins),
    );
    let addr = config.listen_addr();
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(
        "event=server_start module=server status=ok addr={addr} database={}",
        database.name()
    );

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;
    gateway.close();
    info!("event=server_stop module=server status=ok");

    served.context("HTTP server terminated with an error")
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!("event=signal_install module=server status=error signal=ctrl_c error={err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                warn!("event=signal_install module=server status=error signal=sigterm error={err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    info!("event=shutdown module=server status=start");
}
