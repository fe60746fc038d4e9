//! Shared service state and the runtime-backed fetcher.

use std::sync::Arc;

use log_distiller::fetch::check_status;
use log_distiller::{Config, FetchError, Fetcher};
use tokio::runtime::Handle;

pub struct AppState {
  pub config: Config,
  pub fetcher: Arc<dyn Fetcher + Send + Sync>,
}

impl AppState {
  pub fn new(config: Config, fetcher: Arc<dyn Fetcher + Send + Sync>) -> Self {
    Self { config, fetcher }
  }
}

/// Fetcher that drives the async reqwest client on the service runtime.
///
/// `fetch` blocks on the runtime handle, so it must only be called from a
/// blocking task (`spawn_blocking`), never from async code.
pub struct RuntimeFetcher {
  client: reqwest::Client,
  handle: Handle,
}

impl RuntimeFetcher {
  pub fn new(config: &Config, handle: Handle) -> Result<Self, FetchError> {
    let client = reqwest::Client::builder()
      .user_agent(config.user_agent.clone())
      .timeout(config.fetch_timeout)
      .build()
      .map_err(|e| FetchError::Transport(e.to_string()))?;
    Ok(Self { client, handle })
  }
}

impl Fetcher for RuntimeFetcher {
  fn fetch(&self, url: &str) -> Result<String, FetchError> {
    self.handle.block_on(async {
      let resp = self
        .client
        .get(url)
        .send()
        .await
        .map_err(|e| FetchError::Transport(e.to_string()))?;
      check_status(resp.status())?;
      resp.text().await.map_err(|e| FetchError::Read(e.to_string()))
    })
  }
}
