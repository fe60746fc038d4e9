//! Distiller configuration with sane defaults.

use std::time::Duration;

use crate::types::SummaryPolicy;

/// Lines kept in the dedup window during compaction.
pub const DEDUP_WINDOW: usize = 5;

/// Threshold above which progress-line stripping kicks in.
pub const STRIP_THRESHOLD: f64 = 0.6;

/// Tunables shared by the binaries and the HTTP service.
#[derive(Debug, Clone)]
pub struct Config {
  /// Default compaction threshold (0..1). Higher = more aggressive.
  pub compact_threshold: f64,
  /// Timeout for a single log fetch.
  pub fetch_timeout: Duration,
  /// User agent sent with log fetches.
  pub user_agent: String,
  /// Behaviour when a failed job's log has no `summary:` marker.
  pub summary_policy: SummaryPolicy,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      compact_threshold: 0.7,
      fetch_timeout: Duration::from_secs(30),
      user_agent: concat!("log-distiller/", env!("CARGO_PKG_VERSION")).to_string(),
      summary_policy: SummaryPolicy::Abort,
    }
  }
}

impl Config {
  /// Defaults overridden by `DISTILL_*` environment variables.
  ///
  /// Unparseable values are ignored and the default is kept.
  pub fn from_env() -> Self {
    Self::from_lookup(|key| std::env::var(key).ok())
  }

  fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
    let mut config = Self::default();
    if let Some(t) = lookup("DISTILL_THRESHOLD").and_then(|v| v.parse::<f64>().ok()) {
      config.compact_threshold = clamp_threshold(t);
    }
    if let Some(secs) = lookup("DISTILL_FETCH_TIMEOUT_SECS").and_then(|v| v.parse::<u64>().ok()) {
      config.fetch_timeout = Duration::from_secs(secs);
    }
    if let Some(skip) = lookup("DISTILL_SKIP_MISSING_SUMMARY") {
      if matches!(skip.to_ascii_lowercase().as_str(), "1" | "true" | "yes") {
        config.summary_policy = SummaryPolicy::Skip;
      }
    }
    config
  }
}

/// Keep a threshold inside [0, 1]; NaN maps to 0 (no suppression).
pub fn clamp_threshold(t: f64) -> f64 {
  if t.is_nan() {
    0.0
  } else {
    t.clamp(0.0, 1.0)
  }
}
