//! Fetch collaborator: the only network I/O the distiller performs.
//!
//! Retries and backoff are the caller's business; a fetcher makes one attempt.

use reqwest::StatusCode;
use std::collections::HashMap;
use tracing::debug;

use crate::config::Config;
use crate::error::FetchError;

/// Fetch a text document by URL.
pub trait Fetcher {
  fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

impl<F: Fetcher + ?Sized> Fetcher for &F {
  fn fetch(&self, url: &str) -> Result<String, FetchError> {
    (**self).fetch(url)
  }
}

/// Blocking HTTP fetcher. Anything but `200 OK` is an error.
///
/// Do not construct or drop this inside an async runtime; the HTTP service
/// brings its own fetcher.
pub struct HttpFetcher {
  client: reqwest::blocking::Client,
}

impl HttpFetcher {
  pub fn new(config: &Config) -> Result<Self, FetchError> {
    let client = reqwest::blocking::Client::builder()
      .user_agent(config.user_agent.clone())
      .timeout(config.fetch_timeout)
      .build()
      .map_err(|e| FetchError::Transport(e.to_string()))?;
    Ok(Self { client })
  }
}

impl Fetcher for HttpFetcher {
  fn fetch(&self, url: &str) -> Result<String, FetchError> {
    debug!(url, "fetching");
    let resp = self
      .client
      .get(url)
      .send()
      .map_err(|e| FetchError::Transport(e.to_string()))?;
    check_status(resp.status())?;
    resp.text().map_err(|e| FetchError::Read(e.to_string()))
  }
}

/// Map a response status to a [`FetchError::Status`] unless it is `200 OK`.
pub fn check_status(status: StatusCode) -> Result<(), FetchError> {
  if status != StatusCode::OK {
    return Err(FetchError::Status {
      status: status.as_u16(),
    });
  }
  Ok(())
}

/// In-memory fetcher keyed by exact URL. Unknown URLs answer 404.
#[derive(Debug, Default, Clone)]
pub struct StaticFetcher {
  pages: HashMap<String, String>,
}

impl StaticFetcher {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_page(mut self, url: impl Into<String>, body: impl Into<String>) -> Self {
    self.pages.insert(url.into(), body.into());
    self
  }
}

impl Fetcher for StaticFetcher {
  fn fetch(&self, url: &str) -> Result<String, FetchError> {
    self
      .pages
      .get(url)
      .cloned()
      .ok_or(FetchError::Status { status: 404 })
  }
}
