//! Binary entrypoint for the distill service.

use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::{info, Level};

use distill_service::{router, AppState, RuntimeFetcher};
use log_distiller::telemetry::init_tracing;
use log_distiller::Config;

const DEFAULT_MAX_BODY_MB: usize = 64;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  let json_logs = std::env::var("LOG_FORMAT").map(|v| v == "json").unwrap_or(false);
  init_tracing(json_logs, Level::INFO);

  let port: u16 = std::env::var("PORT")
    .unwrap_or_else(|_| "5005".into())
    .parse()
    .context("PORT must be a valid u16")?;
  let max_body_mb: usize = match std::env::var("DISTILL_MAX_BODY_MB") {
    Ok(v) => v.parse().context("DISTILL_MAX_BODY_MB must be a positive integer")?,
    Err(_) => DEFAULT_MAX_BODY_MB,
  };

  let config = Config::from_env();
  let fetcher = RuntimeFetcher::new(&config, Handle::current())?;
  let state = Arc::new(AppState::new(config, Arc::new(fetcher)));
  let app = router(state, max_body_mb * 1024 * 1024);

  let addr = SocketAddr::from(([127, 0, 0, 1], port));
  info!(%addr, "distill-service listening");

  let listener = tokio::net::TcpListener::bind(addr).await?;
  axum::serve(listener, app).await?;

  Ok(())
}
