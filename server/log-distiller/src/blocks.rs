//! Block extractors: one small state machine per labelled block.
//!
//! Every extractor scans the log line by line and returns the block text with
//! each line terminated by `\n`. An extractor that never entered its block
//! fails with [`DistillError::BlockNotFound`]; the block kind carries the
//! display-safe fallback text.

use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

use crate::error::DistillError;
use crate::types::BlockKind;

pub const FAILING_TESTS_MARKER: &str = "Failing tests:";
pub const JUNIT_REPORT_MARKER: &str = "Writing JUnit report to";
pub const FLAKY_TESTS_MARKER: &str = "Flaky tests:";
pub const MONITOR_FAILURE_MARKER: &str =
  "Suite run returned error: failed due to a MonitorTest failure";

// `flaked: ... "<test name>"`, reported inline by the test runner.
static FLAKED_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"flaked:.*?"([^"]+)""#).unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
  Before,
  InBlock,
}

/// Run the extractor for `kind`.
pub fn extract_block(kind: BlockKind, log: &str) -> Result<String, DistillError> {
  match kind {
    BlockKind::FailingTests => extract_failing_tests_block(log),
    BlockKind::FlakyTests => extract_flaky_tests_block(log),
    BlockKind::MonitorFailures => extract_monitor_test_failures(log),
  }
}

/// From the `Failing tests:` line (included) up to `Writing JUnit report to`
/// (excluded), or to the end of the log when the JUnit line never shows up.
pub fn extract_failing_tests_block(log: &str) -> Result<String, DistillError> {
  let mut out = String::new();
  let mut state = State::Before;

  for line in log.lines() {
    if state == State::Before && line.contains(FAILING_TESTS_MARKER) {
      debug!("entered failing tests block");
      state = State::InBlock;
    }
    if state == State::InBlock {
      if line.contains(JUNIT_REPORT_MARKER) {
        break;
      }
      push_line(&mut out, line);
    }
  }

  finish(BlockKind::FailingTests, out)
}

/// Flaky tests listed under `Flaky tests:`, plus every inline `flaked:` line.
///
/// The block skips the first blank line after the header, wherever it falls,
/// and stops at the second. Inline `flaked:` lines are collected over the whole log,
/// whether or not the block has started or ended.
pub fn extract_flaky_tests_block(log: &str) -> Result<String, DistillError> {
  let mut out = String::new();
  let mut block = FlakyBlock::default();

  for line in log.lines() {
    if flaked_test_name(line).is_some() {
      push_line(&mut out, line);
      continue;
    }
    if block.feed(line) {
      push_line(&mut out, line);
    }
  }

  finish(BlockKind::FlakyTests, out)
}

/// Names of all tests reported inline as `flaked: ... "<name>"`.
pub fn flaked_test_names(log: &str) -> Vec<String> {
  log
    .lines()
    .filter_map(flaked_test_name)
    .map(str::to_string)
    .collect()
}

fn flaked_test_name(line: &str) -> Option<&str> {
  FLAKED_RE
    .captures(line)
    .and_then(|caps| caps.get(1))
    .map(|m| m.as_str())
}

/// From the monitor failure line (included) up to the first `Failing tests:`
/// line. `Failing tests:` ends the scan even before the block starts, so a
/// monitor marker after it is never reported.
pub fn extract_monitor_test_failures(log: &str) -> Result<String, DistillError> {
  let mut out = String::new();
  let mut state = State::Before;

  for line in log.lines() {
    if line.contains(FAILING_TESTS_MARKER) {
      break;
    }
    if state == State::Before && line.contains(MONITOR_FAILURE_MARKER) {
      debug!("entered monitor failures block");
      state = State::InBlock;
    }
    if state == State::InBlock {
      push_line(&mut out, line);
    }
  }

  finish(BlockKind::MonitorFailures, out)
}

// ---------------------------------------------------------------------------
// Flaky block machine
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum FlakyState {
  #[default]
  Before,
  InBlock,
  Done,
}

#[derive(Debug, Default)]
struct FlakyBlock {
  state: FlakyState,
  /// The one blank line the block tolerates has been consumed.
  skipped_blank: bool,
}

impl FlakyBlock {
  /// Advance on one line; returns whether the line belongs to the block.
  fn feed(&mut self, line: &str) -> bool {
    match self.state {
      FlakyState::Before => {
        if line.contains(FLAKY_TESTS_MARKER) {
          debug!("entered flaky tests block");
          self.state = FlakyState::InBlock;
        }
        false
      }
      FlakyState::InBlock => {
        if !line.trim().is_empty() {
          return true;
        }
        if self.skipped_blank {
          self.state = FlakyState::Done;
        } else {
          self.skipped_blank = true;
        }
        false
      }
      FlakyState::Done => false,
    }
  }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn push_line(out: &mut String, line: &str) {
  out.push_str(line);
  out.push('\n');
}

fn finish(kind: BlockKind, out: String) -> Result<String, DistillError> {
  if out.is_empty() {
    debug!(block = %kind, "block not found");
    return Err(DistillError::BlockNotFound(kind));
  }
  Ok(out)
}
