//! Correlate an aggregated multi-job log into per-job pass/fail outcomes.
//!
//! The aggregate log interleaves output from many job sub-processes. A job is
//! announced by a `Starting testcase analysis for: <job>` banner, its process
//! by a following `PID is <pid>` line, and its exit by
//! `[<date>] <pid> finished with ret=<code>`. Exit lines may appear before or
//! after the binding, so the scan only collects; outcomes are resolved after.

use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;
use tracing::debug;

use crate::types::JobOutcome;

// `********** Starting testcase analysis for: <job>`
static JOB_RE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"\*+ Starting testcase analysis for: (.+)").unwrap());

// `[Tue Jun 10 19:10:22 UTC 2025] <pid> finished with ret=1`
static FAIL_RE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"\] (\d+) finished with ret=1").unwrap());

const PID_PREFIX: &str = "PID is ";

/// PID -> (binding order, job). Lives for one scan only.
type ProcessBindings = HashMap<String, (usize, String)>;

/// Map every bound job to whether its process exited with `ret=1`.
///
/// Jobs without a matching exit line resolve to not failed. When the same job
/// name is bound more than once, the binding seen last in the log wins.
pub fn extract_failed_jobs_from_aggregate(log: &str) -> JobOutcome {
  let mut bindings: ProcessBindings = HashMap::new();
  let mut failed_pids: HashSet<String> = HashSet::new();
  let mut current_job: Option<&str> = None;

  for (seq, line) in log.lines().enumerate() {
    if let Some(caps) = JOB_RE.captures(line) {
      current_job = caps.get(1).map(|m| m.as_str());
    }
    if let (Some(pid), Some(job)) = (line.strip_prefix(PID_PREFIX), current_job) {
      bindings.insert(pid.trim().to_string(), (seq, job.to_string()));
    }
    if let Some(caps) = FAIL_RE.captures(line) {
      failed_pids.insert(caps[1].to_string());
    }
  }

  resolve(bindings, &failed_pids)
}

fn resolve(bindings: ProcessBindings, failed_pids: &HashSet<String>) -> JobOutcome {
  let mut ordered: Vec<(usize, String, String)> = bindings
    .into_iter()
    .map(|(pid, (seq, job))| (seq, pid, job))
    .collect();
  ordered.sort_by_key(|(seq, _, _)| *seq);

  let mut outcome = JobOutcome::new();
  for (_, pid, job) in ordered {
    let failed = failed_pids.contains(&pid);
    debug!(pid = %pid, job = %job.trim(), failed, "resolved process binding");
    outcome.insert(job.trim().to_string(), failed);
  }
  outcome
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn bound_pid_with_ret1_is_failed() {
    let log = "\
********** Starting testcase analysis for: J
PID is 42
[Tue Jun 10 19:10:22 UTC 2025] 42 finished with ret=1
";
    let outcome = extract_failed_jobs_from_aggregate(log);
    assert_eq!(outcome.get("J"), Some(&true));
  }

  #[test]
  fn bound_pid_without_exit_line_is_not_failed() {
    let log = "********** Starting testcase analysis for: J\nPID is 42\n";
    let outcome = extract_failed_jobs_from_aggregate(log);
    assert_eq!(outcome.get("J"), Some(&false));
  }

  #[test]
  fn exit_line_before_binding_still_counts() {
    let log = "\
[Tue Jun 10 19:10:22 UTC 2025] 7 finished with ret=1
*** Starting testcase analysis for: early
PID is 7
";
    let outcome = extract_failed_jobs_from_aggregate(log);
    assert_eq!(outcome.get("early"), Some(&true));
  }

  #[test]
  fn ret0_is_not_failure() {
    let log = "\
*** Starting testcase analysis for: ok-job
PID is 9
[Tue Jun 10 19:10:22 UTC 2025] 9 finished with ret=0
";
    let outcome = extract_failed_jobs_from_aggregate(log);
    assert_eq!(outcome.get("ok-job"), Some(&false));
  }

  #[test]
  fn pid_before_any_job_banner_is_ignored() {
    let log = "PID is 1\n[x] 1 finished with ret=1\n";
    assert!(extract_failed_jobs_from_aggregate(log).is_empty());
  }

  #[test]
  fn job_names_are_trimmed_and_interleaving_works() {
    let log = "\
*** Starting testcase analysis for: aws-ovn   
PID is 100
*** Starting testcase analysis for: gcp
PID is 200
[Tue] 200 finished with ret=1
[Tue] 100 finished with ret=0
";
    let outcome = extract_failed_jobs_from_aggregate(log);
    assert_eq!(outcome.len(), 2);
    assert_eq!(outcome.get("aws-ovn"), Some(&false));
    assert_eq!(outcome.get("gcp"), Some(&true));
  }

  #[test]
  fn last_binding_wins_on_job_collision() {
    let log = "\
*** Starting testcase analysis for: dup
PID is 1
PID is 2
[x] 1 finished with ret=1
";
    let outcome = extract_failed_jobs_from_aggregate(log);
    assert_eq!(outcome.get("dup"), Some(&false));
  }

  #[test]
  fn empty_log_has_no_outcomes() {
    assert!(extract_failed_jobs_from_aggregate("").is_empty());
  }
}
