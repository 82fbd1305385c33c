use std::{future::IntoFuture, net::SocketAddr, sync::Arc};

use anyhow::Context;
use lampsync_handler::{consumer, server, Config, HttpDeviceRegistry, Mode, TelemetryHandler};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = Config::load()?;
    lampsync_http::tracing::init("lampsync-handler", cfg.log_json);

    tracing::info!(
        registry = %cfg.registry_base_url,
        mode = ?cfg.mode,
        debounce_ms = cfg.debounce_ms,
        target = %cfg.target_device_type,
        "starting"
    );

    let registry = HttpDeviceRegistry::new(reqwest::Client::new(), cfg.registry_base_url.clone());
    let handler = Arc::new(TelemetryHandler::from_config(registry, &cfg));

    let app = server::router(handler.clone());
    let addr: SocketAddr = lampsync_http::config::bind_addr(([0, 0, 0, 0], 7010).into());
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!(%addr, "listening");
    let serve = axum::serve(listener, app).into_future();

    match cfg.mode {
        Mode::Kafka => {
            tokio::select! {
                res = consumer::run(&cfg, handler) => res?,
                res = serve => res?,
                _ = tokio::signal::ctrl_c() => tracing::info!("shutdown requested"),
            }
        }
        Mode::Http => {
            tokio::select! {
                res = serve => res?,
                _ = tokio::signal::ctrl_c() => tracing::info!("shutdown requested"),
            }
        }
    }

    Ok(())
}
