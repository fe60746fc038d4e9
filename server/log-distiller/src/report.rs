//! Aggregate report assembly: correlate the aggregate log, then pull the
//! `summary:` tail of every failed job's own log.

use tracing::{info, warn};

use crate::correlation::extract_failed_jobs_from_aggregate;
use crate::error::DistillError;
use crate::fetch::Fetcher;
use crate::types::SummaryPolicy;

pub const SUMMARY_MARKER: &str = "summary:";
pub const JOB_DELIMITER: &str = "\n---\n\n";

/// `<base_url>/<job>/<job>.log`
pub fn job_log_url(base_url: &str, job: &str) -> String {
  format!("{}/{}/{}.log", base_url.trim_end_matches('/'), job, job)
}

/// Everything from the first `summary:` on, if present.
pub fn summary_tail(log: &str) -> Option<&str> {
  log.find(SUMMARY_MARKER).map(|idx| &log[idx..])
}

/// Builds combined failure reports from aggregate logs.
pub struct ReportAssembler<F> {
  fetcher: F,
  policy: SummaryPolicy,
}

impl<F: Fetcher> ReportAssembler<F> {
  pub fn new(fetcher: F, policy: SummaryPolicy) -> Self {
    Self { fetcher, policy }
  }

  /// Report for every failed job in `aggregate_log`, in job-name order.
  ///
  /// Fails with [`DistillError::NoFailedJobs`] when nothing failed. A fetch
  /// error always aborts; a log without `summary:` aborts under
  /// [`SummaryPolicy::Abort`] and is noted in the report under
  /// [`SummaryPolicy::Skip`].
  pub fn assemble(&self, base_url: &str, aggregate_log: &str) -> Result<String, DistillError> {
    let outcome = extract_failed_jobs_from_aggregate(aggregate_log);
    let failed: Vec<&str> = outcome
      .iter()
      .filter(|(_, &failed)| failed)
      .map(|(job, _)| job.as_str())
      .collect();
    if failed.is_empty() {
      return Err(DistillError::NoFailedJobs);
    }
    info!(jobs = outcome.len(), failed = failed.len(), "assembling aggregate report");

    let mut report = String::new();
    for job in failed {
      let url = job_log_url(base_url, job);
      let log = self
        .fetcher
        .fetch(&url)
        .map_err(|e| DistillError::fetch(&url, e))?;

      match summary_tail(&log) {
        Some(tail) => {
          info!(job, bytes = tail.len(), "added job summary");
          report.push_str(tail);
        }
        None if self.policy == SummaryPolicy::Skip => {
          warn!(job, "job log has no summary marker, skipping");
          report.push_str(&format!("{}: no {} marker found in job log", job, SUMMARY_MARKER));
        }
        None => return Err(DistillError::MissingSummaryMarker(job.to_string())),
      }
      report.push_str(JOB_DELIMITER);
    }
    Ok(report)
  }
}

/// Strict report assembly (aborts on the first job without a summary).
pub fn fetch_aggregate_job_failures<F: Fetcher>(
  fetcher: F,
  base_url: &str,
  aggregate_log: &str,
) -> Result<String, DistillError> {
  ReportAssembler::new(fetcher, SummaryPolicy::Abort).assemble(base_url, aggregate_log)
}

/// Prefix every line of `s` with `indent`.
pub fn indent_multiline(s: &str, indent: &str) -> String {
  s.split('\n')
    .map(|line| format!("{}{}", indent, line))
    .collect::<Vec<_>>()
    .join("\n")
}
