//! HTTP handlers for the distill service.

use axum::{
  extract::{Path, State},
  http::StatusCode,
  Json,
};
use std::sync::Arc;
use tracing::{error, info};

use log_distiller::types::{
  BlockOutput, CompactOutput, ErrorOutput, OutcomeOutput, ReportOutput,
};
use log_distiller::{
  compact_test_logs, extract_failed_jobs_from_aggregate, BlockKind, DistillError,
  ReportAssembler,
};

use crate::state::AppState;
use crate::types::{CompactPayload, LogPayload, ReportPayload};

type ApiError = (StatusCode, Json<ErrorOutput>);
type ApiResult<T> = Result<Json<T>, ApiError>;

pub async fn health() -> &'static str {
  "ok"
}

pub async fn distill(Path(block): Path<String>, Json(payload): Json<LogPayload>) -> ApiResult<BlockOutput> {
  let kind = BlockKind::from_str_loose(&block).ok_or_else(|| {
    (
      StatusCode::NOT_FOUND,
      Json(ErrorOutput::new(format!("unknown block: {}", block)).with_kind("unknown_block")),
    )
  })?;
  let output = run_blocking(move || BlockOutput::extract(kind, &payload.log)).await?;
  info!(
    block = %kind,
    found = output.found,
    flaked = output.flaked.len(),
    "distilled block"
  );
  Ok(Json(output))
}

pub async fn compact(
  State(state): State<Arc<AppState>>,
  Json(payload): Json<CompactPayload>,
) -> ApiResult<CompactOutput> {
  let threshold = payload.threshold.unwrap_or(state.config.compact_threshold);
  let output = run_blocking(move || {
    let text = compact_test_logs(&payload.log, threshold);
    CompactOutput {
      threshold,
      input_lines: payload.log.lines().count(),
      output_lines: text.lines().count(),
      text,
    }
  })
  .await?;
  info!(
    threshold,
    input_lines = output.input_lines,
    output_lines = output.output_lines,
    "compacted log"
  );
  Ok(Json(output))
}

pub async fn outcomes(Json(payload): Json<LogPayload>) -> ApiResult<OutcomeOutput> {
  let output = run_blocking(move || OutcomeOutput {
    jobs: extract_failed_jobs_from_aggregate(&payload.log),
  })
  .await?;
  info!(
    jobs = output.jobs.len(),
    failed = output.failed().len(),
    "correlated job outcomes"
  );
  Ok(Json(output))
}

pub async fn report(
  State(state): State<Arc<AppState>>,
  Json(payload): Json<ReportPayload>,
) -> ApiResult<ReportOutput> {
  let policy = payload.summary_policy.unwrap_or(state.config.summary_policy);
  let fetcher = state.fetcher.clone();
  let result = run_blocking(move || {
    ReportAssembler::new(&*fetcher, policy).assemble(&payload.base_url, &payload.log)
  })
  .await?;

  match result {
    Ok(report) => Ok(Json(ReportOutput { report })),
    Err(e) => Err(distill_error(&e)),
  }
}

/// Status code for an engine error.
pub fn status_for(e: &DistillError) -> StatusCode {
  match e {
    DistillError::NoFailedJobs | DistillError::MissingSummaryMarker(_) => {
      StatusCode::UNPROCESSABLE_ENTITY
    }
    DistillError::Fetch { .. } => StatusCode::BAD_GATEWAY,
    DistillError::BlockNotFound(_) => StatusCode::NOT_FOUND,
    DistillError::MalformedUrl { .. }
    | DistillError::NoTestNameFound(_)
    | DistillError::NoStepName(_) => StatusCode::BAD_REQUEST,
  }
}

fn distill_error(e: &DistillError) -> ApiError {
  let status = status_for(e);
  if status.is_server_error() {
    error!(error = %e, "request failed");
  } else {
    info!(error = %e, "request rejected");
  }
  (
    status,
    Json(ErrorOutput::new(e.to_string()).with_kind(e.kind())),
  )
}

async fn run_blocking<T, F>(f: F) -> Result<T, ApiError>
where
  F: FnOnce() -> T + Send + 'static,
  T: Send + 'static,
{
  tokio::task::spawn_blocking(f).await.map_err(|e| {
    error!(error = %e, "blocking task failed");
    (
      StatusCode::INTERNAL_SERVER_ERROR,
      Json(ErrorOutput::new("internal error").with_kind("internal")),
    )
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use log_distiller::fetch::StaticFetcher;
  use log_distiller::report::job_log_url;
  use log_distiller::{Config, SummaryPolicy};

  const BASE: &str = "https://gcs/aggregator";

  fn state_with(fetcher: StaticFetcher) -> Arc<AppState> {
    Arc::new(AppState::new(Config::default(), Arc::new(fetcher)))
  }

  fn aggregate_log() -> String {
    "*** Starting testcase analysis for: a\nPID is 1\n*** Starting testcase analysis for: b\nPID is 2\n[x] 1 finished with ret=1\n[x] 2 finished with ret=1\n".to_string()
  }

  #[tokio::test]
  async fn distill_known_block() {
    let Json(out) = distill(
      Path("failing".to_string()),
      Json(LogPayload {
        log: "Failing tests:\nt1\nWriting JUnit report to x\n".into(),
      }),
    )
    .await
    .unwrap();
    assert!(out.found);
    assert_eq!(out.block, BlockKind::FailingTests);
    assert_eq!(out.text, "Failing tests:\nt1\n");
  }

  #[tokio::test]
  async fn distill_flaky_reports_inline_names() {
    let Json(out) = distill(
      Path("flaky".to_string()),
      Json(LogPayload {
        log: "flaked: (2s) \"slow one\"\nFlaky tests:\n\n- other\n\n".into(),
      }),
    )
    .await
    .unwrap();
    assert!(out.found);
    assert_eq!(out.text, "flaked: (2s) \"slow one\"\n- other\n");
    assert_eq!(out.flaked, vec!["slow one"]);
  }

  #[tokio::test]
  async fn distill_missing_block_returns_fallback() {
    let Json(out) = distill(
      Path("monitor".to_string()),
      Json(LogPayload { log: "fine\n".into() }),
    )
    .await
    .unwrap();
    assert!(!out.found);
    assert_eq!(out.text, "No monitor test failures found.");
  }

  #[tokio::test]
  async fn distill_unknown_block_is_404() {
    let (status, Json(err)) = distill(
      Path("bogus".to_string()),
      Json(LogPayload { log: String::new() }),
    )
    .await
    .unwrap_err();
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(err.kind.as_deref(), Some("unknown_block"));
  }

  #[tokio::test]
  async fn compact_uses_configured_threshold() {
    let state = state_with(StaticFetcher::new());
    let Json(out) = compact(
      State(state),
      Json(CompactPayload {
        log: "started: a\nboom\nboom\n".into(),
        threshold: None,
      }),
    )
    .await
    .unwrap();
    assert!((out.threshold - 0.7).abs() < f64::EPSILON);
    assert_eq!(out.text, "boom\n");
    assert_eq!(out.input_lines, 3);
    assert_eq!(out.output_lines, 1);
  }

  #[tokio::test]
  async fn outcomes_map_jobs() {
    let Json(out) = outcomes(Json(LogPayload {
      log: "*** Starting testcase analysis for: j\nPID is 5\n".into(),
    }))
    .await
    .unwrap();
    assert_eq!(out.jobs.get("j"), Some(&false));
  }

  #[tokio::test]
  async fn report_assembles_failed_jobs() {
    let fetcher = StaticFetcher::new()
      .with_page(job_log_url(BASE, "a"), "summary: a failed")
      .with_page(job_log_url(BASE, "b"), "x\nsummary: b failed");
    let Json(out) = report(
      State(state_with(fetcher)),
      Json(ReportPayload {
        base_url: BASE.into(),
        log: aggregate_log(),
        summary_policy: None,
      }),
    )
    .await
    .unwrap();
    assert_eq!(out.report, "summary: a failed\n---\n\nsummary: b failed\n---\n\n");
  }

  #[tokio::test]
  async fn report_missing_summary_is_422_unless_skipped() {
    let fetcher = StaticFetcher::new()
      .with_page(job_log_url(BASE, "a"), "no marker")
      .with_page(job_log_url(BASE, "b"), "summary: b failed");
    let state = state_with(fetcher);

    let (status, Json(err)) = report(
      State(state.clone()),
      Json(ReportPayload {
        base_url: BASE.into(),
        log: aggregate_log(),
        summary_policy: None,
      }),
    )
    .await
    .unwrap_err();
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(err.kind.as_deref(), Some("missing_summary_marker"));

    let Json(out) = report(
      State(state),
      Json(ReportPayload {
        base_url: BASE.into(),
        log: aggregate_log(),
        summary_policy: Some(SummaryPolicy::Skip),
      }),
    )
    .await
    .unwrap();
    assert!(out.report.starts_with("a: no summary: marker found"));
    assert!(out.report.contains("summary: b failed"));
  }

  #[tokio::test]
  async fn report_fetch_failure_is_502() {
    let (status, _) = report(
      State(state_with(StaticFetcher::new())),
      Json(ReportPayload {
        base_url: BASE.into(),
        log: aggregate_log(),
        summary_policy: None,
      }),
    )
    .await
    .unwrap_err();
    assert_eq!(status, StatusCode::BAD_GATEWAY);
  }
}
