//! Structured error types for the distiller.

use thiserror::Error;

use crate::types::BlockKind;

#[derive(Debug, Error)]
pub enum DistillError {
  #[error("malformed url: {url}: {reason}")]
  MalformedUrl { url: String, reason: String },

  #[error("no e2e test name found in URL: {0}")]
  NoTestNameFound(String),

  #[error("no step name found in line: {0}")]
  NoStepName(String),

  #[error("no {0} block found in the input")]
  BlockNotFound(BlockKind),

  #[error("no failed jobs found in the provided log data")]
  NoFailedJobs,

  #[error("no summary: found in log for job {0:?}")]
  MissingSummaryMarker(String),

  #[error("fetch {url}: {source}")]
  Fetch {
    url: String,
    #[source]
    source: FetchError,
  },
}

impl DistillError {
  pub fn malformed_url(url: &str, reason: impl Into<String>) -> Self {
    Self::MalformedUrl {
      url: url.to_string(),
      reason: reason.into(),
    }
  }

  pub fn fetch(url: &str, source: FetchError) -> Self {
    Self::Fetch {
      url: url.to_string(),
      source,
    }
  }

  /// Stable snake_case name of the error kind.
  pub fn kind(&self) -> &'static str {
    match self {
      Self::MalformedUrl { .. } => "malformed_url",
      Self::NoTestNameFound(_) => "no_test_name_found",
      Self::NoStepName(_) => "no_step_name",
      Self::BlockNotFound(_) => "block_not_found",
      Self::NoFailedJobs => "no_failed_jobs",
      Self::MissingSummaryMarker(_) => "missing_summary_marker",
      Self::Fetch { .. } => "fetch",
    }
  }

  /// Display-safe text for a failed block extraction.
  pub fn fallback_text(&self) -> Option<&'static str> {
    match self {
      Self::BlockNotFound(kind) => Some(kind.fallback()),
      _ => None,
    }
  }
}

/// Failures surfaced by a [`crate::fetch::Fetcher`].
#[derive(Debug, Error)]
pub enum FetchError {
  #[error("transport: {0}")]
  Transport(String),

  #[error("non-200 response: {status}")]
  Status { status: u16 },

  #[error("reading response body: {0}")]
  Read(String),
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn block_not_found_carries_fallback() {
    let err = DistillError::BlockNotFound(BlockKind::FlakyTests);
    assert_eq!(err.fallback_text(), Some("No flaky tests found."));
    assert_eq!(err.to_string(), "no flaky tests block found in the input");
  }

  #[test]
  fn fetch_error_mentions_url_and_status() {
    let err = DistillError::fetch("https://x/y.log", FetchError::Status { status: 404 });
    let msg = err.to_string();
    assert!(msg.contains("https://x/y.log"));
    assert!(msg.contains("404"));
    assert!(err.fallback_text().is_none());
  }
}
