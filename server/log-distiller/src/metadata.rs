//! Pull job and test identifiers out of job URLs and single log lines.

use regex::Regex;
use reqwest::Url;
use std::sync::LazyLock;

use crate::error::DistillError;

/// Storage root every Prow job view URL lives under.
pub const PROW_GCS_PREFIX: &str = "https://prow.ci.openshift.org/view/gs/";

static E2E_TEST_RE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"(?:^|-)((?:ocp-)?e2e-[^/]+)").unwrap());

// Periodic jobs without an e2e segment, e.g. `...-nightly-4.20-console-aws`.
static VERSIONED_TEST_RE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"\d+\.\d+-([^/]+)").unwrap());

static STEP_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"Step (.*?) failed after").unwrap());

/// Job name and build ID from a Prow job URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProwJobInfo {
  pub job_name: String,
  pub job_id: String,
}

/// Split the URL path and take the last two segments as (job name, job ID).
///
/// Empty segments (doubled or trailing slashes) are ignored.
pub fn extract_prow_job_info(job_url: &str) -> Result<ProwJobInfo, DistillError> {
  let url = Url::parse(job_url).map_err(|e| DistillError::malformed_url(job_url, e.to_string()))?;
  let segments: Vec<&str> = url
    .path_segments()
    .map(|s| s.filter(|seg| !seg.is_empty()).collect())
    .unwrap_or_default();

  match segments.as_slice() {
    [.., name, id] => Ok(ProwJobInfo {
      job_name: (*name).to_string(),
      job_id: (*id).to_string(),
    }),
    _ => Err(DistillError::malformed_url(
      job_url,
      "unexpected URL path structure",
    )),
  }
}

/// First `e2e-*` (optionally `ocp-e2e-*`) segment of a job URL, falling back to
/// whatever follows a `<major>.<minor>-` version marker.
pub fn extract_test_name_from_url(url: &str) -> Result<String, DistillError> {
  if let Some(caps) = E2E_TEST_RE.captures(url) {
    return Ok(caps[1].to_string());
  }
  VERSIONED_TEST_RE
    .captures(url)
    .map(|caps| caps[1].to_string())
    .ok_or_else(|| DistillError::NoTestNameFound(url.to_string()))
}

/// Step name from a line like `Step e2e-aws-gather failed after 10m.`
pub fn extract_step_name(log_line: &str) -> Result<String, DistillError> {
  STEP_RE
    .captures(log_line)
    .map(|caps| caps[1].trim().to_string())
    .ok_or_else(|| DistillError::NoStepName(log_line.to_string()))
}

/// Storage path below [`PROW_GCS_PREFIX`], or an empty string when the URL is
/// not under it. Callers must check for emptiness.
pub fn extract_path(url: &str) -> &str {
  url.strip_prefix(PROW_GCS_PREFIX).unwrap_or("")
}

#[cfg(test)]
mod tests {
  use super::*;

  const JOB_URL: &str = "https://prow.ci.openshift.org/view/gs/test-platform-results/logs/periodic-ci-openshift-release-master-ci-4.20-e2e-aws-ovn/1932446851574894592";

  #[test]
  fn job_info_takes_last_two_segments() {
    let info = extract_prow_job_info(JOB_URL).unwrap();
    assert_eq!(
      info.job_name,
      "periodic-ci-openshift-release-master-ci-4.20-e2e-aws-ovn"
    );
    assert_eq!(info.job_id, "1932446851574894592");
  }

  #[test]
  fn job_info_ignores_trailing_slash() {
    let info = extract_prow_job_info("https://example.com/logs/my-job/42/").unwrap();
    assert_eq!(info.job_name, "my-job");
    assert_eq!(info.job_id, "42");
  }

  #[test]
  fn job_info_rejects_short_paths() {
    let err = extract_prow_job_info("https://example.com/only").unwrap_err();
    assert!(matches!(err, DistillError::MalformedUrl { .. }));
    let err = extract_prow_job_info("https://example.com").unwrap_err();
    assert!(matches!(err, DistillError::MalformedUrl { .. }));
  }

  #[test]
  fn job_info_rejects_unparseable_url() {
    let err = extract_prow_job_info("not a url").unwrap_err();
    assert!(matches!(err, DistillError::MalformedUrl { .. }));
  }

  #[test]
  fn test_name_prefers_e2e_segment() {
    assert_eq!(extract_test_name_from_url(JOB_URL).unwrap(), "e2e-aws-ovn");
    assert_eq!(
      extract_test_name_from_url("https://x/logs/pull-ci-foo-main-ocp-e2e-gcp/1").unwrap(),
      "ocp-e2e-gcp"
    );
  }

  #[test]
  fn test_name_falls_back_to_version_suffix() {
    let url = "https://prow.ci.openshift.org/view/gs/test-platform-results/logs/periodic-ci-openshift-release-master-nightly-4.20-console-aws/1";
    assert_eq!(extract_test_name_from_url(url).unwrap(), "console-aws");
  }

  #[test]
  fn test_name_missing() {
    let err = extract_test_name_from_url("https://example.com/logs/unit/1").unwrap_err();
    assert!(matches!(err, DistillError::NoTestNameFound(_)));
  }

  #[test]
  fn step_name_is_trimmed() {
    let line = "INFO[2025-06-10T19:10:22Z] Step  e2e-aws-ovn-openshift-e2e-test  failed after 1h2m.";
    assert_eq!(
      extract_step_name(line).unwrap(),
      "e2e-aws-ovn-openshift-e2e-test"
    );
  }

  #[test]
  fn step_name_missing() {
    let err = extract_step_name("Step foo succeeded").unwrap_err();
    assert!(matches!(err, DistillError::NoStepName(_)));
  }

  #[test]
  fn path_strips_storage_root() {
    assert_eq!(
      extract_path(JOB_URL),
      "test-platform-results/logs/periodic-ci-openshift-release-master-ci-4.20-e2e-aws-ovn/1932446851574894592"
    );
    assert_eq!(extract_path("https://example.com/view/gs/x"), "");
  }
}
