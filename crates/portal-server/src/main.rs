use std::future::{Future, IntoFuture};
use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use portal_api::{AppStateInner, Config};

/// How long in-flight requests get to finish once shutdown starts.
/// `/oom` and a long `/burn` would otherwise hold the process forever.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "portal=debug,portal_api=debug,portal_db=info,tower_http=debug".into()
            }),
        )
        .init();

    let config = Config::from_env()?;
    if config.uses_placeholder_secret() {
        warn!("PORTAL_SECRET is unset or still the placeholder; sessions can be forged");
    }

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!(
        "Portal starting: mode={:?} host={} db={}",
        config.run_mode,
        config.hostname,
        config.db_path.display()
    );
    if config.crash_signals_parent {
        info!("/crash will also signal the parent process");
    }

    // The store itself is created lazily by the first request.
    let state = AppStateInner::new(config);
    let app = portal_api::router(state).layer(TraceLayer::new_for_http());

    info!("Portal listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;

    serve_until(listener, app, shutdown_signal(), SHUTDOWN_GRACE).await
}

/// Serve until `shutdown` resolves, then drain open requests for at most `grace`.
async fn serve_until<F>(
    listener: TcpListener,
    app: Router,
    shutdown: F,
    grace: Duration,
) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send,
{
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            stop_rx.await.ok();
        })
        .into_future();
    let mut server = std::pin::pin!(server);

    tokio::select! {
        res = &mut server => return Ok(res?),
        _ = shutdown => {}
    }

    let _ = stop_tx.send(());
    match tokio::time::timeout(grace, server).await {
        Ok(res) => Ok(res?),
        Err(_) => {
            warn!("Requests still open after {:?}; exiting without them", grace);
            Ok(())
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
                }
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                ctrl_c.await.ok();
                info!("Received Ctrl+C, shutting down...");
            }
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
