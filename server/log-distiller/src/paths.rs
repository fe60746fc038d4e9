//! Artifact storage paths for a Prow job. Literal formats match the GCS web
//! layout and must not change.

use crate::error::DistillError;
use crate::metadata::{extract_path, extract_test_name_from_url};

pub const GCSWEB_BASE: &str = "https://gcsweb-ci.apps.ci.l2s4.p1.openshiftapps.com/gcs";

/// Artifact-browser URL of the job's `gather-extra` artifacts.
pub fn gather_extra_folder_url(prow_url: &str) -> Result<String, DistillError> {
  let logs_path = extract_path(prow_url);
  if logs_path.is_empty() {
    return Err(DistillError::malformed_url(prow_url, "invalid Prow job URL"));
  }
  let test_name = extract_test_name_from_url(prow_url)?;
  Ok(format!(
    "{}/{}/artifacts/{}/gather-extra/artifacts/",
    GCSWEB_BASE, logs_path, test_name
  ))
}

/// Path of one container's log under a `gather-extra` folder.
pub fn container_log_path(
  gather_extra_path: &str,
  pod_name: &str,
  namespace: &str,
  container_name: &str,
) -> String {
  format!(
    "{}/pods/{}_{}_{}.log",
    gather_extra_path, namespace, pod_name, container_name
  )
}
