//! Request types for the distill service. Responses reuse the engine's
//! output types.

use serde::Deserialize;

use log_distiller::SummaryPolicy;

#[derive(Debug, Deserialize)]
pub struct LogPayload {
  pub log: String,
}

#[derive(Debug, Deserialize)]
pub struct CompactPayload {
  pub log: String,
  #[serde(default)]
  pub threshold: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct ReportPayload {
  pub base_url: String,
  pub log: String,
  /// Overrides the configured policy for this request.
  #[serde(default)]
  pub summary_policy: Option<SummaryPolicy>,
}
