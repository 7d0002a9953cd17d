//! Labgate gateway entry point.
//!
//! # Purpose
//! Loads configuration, builds the shared token codec and rate limiter,
//! starts the limiter sweeper and the metrics listener, then serves the API
//! until shutdown.
//!
//! # Notes
//! The `build_state` helper keeps wiring testable and minimizes main setup logic.
use anyhow::Context;
use gateway::app::{AppState, build_router};
use gateway::config::GatewayConfig;
use gateway::observability;
use labgate_authz::{Clock, RateLimiter, SessionTokenCodec, SystemClock};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = GatewayConfig::from_env_or_yaml().context("gateway config")?;
    run_with_shutdown(config, async {
        let _ = tokio::signal::ctrl_c().await;
    })
    .await
}

async fn run_with_shutdown<F>(config: GatewayConfig, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let metrics_handle = observability::init_observability("labgate-gateway")?;
    let state = build_state(&config)?;
    let sweeper = state.limiter.spawn_sweeper();

    let (metrics_stop, metrics_stopped) = tokio::sync::oneshot::channel::<()>();
    let metrics_addr = config.metrics_bind;
    let metrics_task = tokio::spawn(async move {
        let shutdown = async move {
            let _ = metrics_stopped.await;
        };
        if let Err(err) =
            observability::serve_metrics_with_shutdown(metrics_handle, metrics_addr, shutdown).await
        {
            tracing::warn!(error = %err, %metrics_addr, "metrics listener failed");
        }
    });

    // No groups of its own: business routers mount through `build_router` in
    // the service that embeds the gateway.
    let app = build_router(state, Vec::new());

    let addr = config.bind_addr;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind {addr}"))?;
    tracing::info!(
        addr = %listener.local_addr().unwrap_or(addr),
        key_source = ?config.client_keys,
        "gateway listening"
    );
    let served = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .await;

    sweeper.shutdown().await;
    let _ = metrics_stop.send(());
    let _ = metrics_task.await;
    tracing::info!("gateway stopped");
    served.context("serve gateway")
}

fn build_state(config: &GatewayConfig) -> anyhow::Result<AppState> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let tokens = SessionTokenCodec::new(config.tokens.clone(), clock.clone())
        .context("build token codec")?;
    let limiter =
        RateLimiter::new(config.rate_limit, clock).context("build rate limiter")?;
    Ok(AppState {
        tokens: Arc::new(tokens),
        limiter: Arc::new(limiter),
        client_keys: config.client_keys,
        cors: config.cors.clone(),
    })
}
