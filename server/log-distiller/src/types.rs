//! Core types for the distiller (block labels, outcome maps, JSON output contracts).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ---------------------------------------------------------------------------
// Blocks
// ---------------------------------------------------------------------------

/// Which labelled block an extractor targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
  FailingTests,
  FlakyTests,
  MonitorFailures,
}

impl BlockKind {
  pub fn label(self) -> &'static str {
    match self {
      Self::FailingTests => "failing tests",
      Self::FlakyTests => "flaky tests",
      Self::MonitorFailures => "monitor test failures",
    }
  }

  /// Text shown to a user when the block is absent.
  pub fn fallback(self) -> &'static str {
    match self {
      Self::FailingTests => "No failing tests found.",
      Self::FlakyTests => "No flaky tests found.",
      Self::MonitorFailures => "No monitor test failures found.",
    }
  }

  pub fn from_str_loose(s: &str) -> Option<Self> {
    match s.to_ascii_lowercase().as_str() {
      "failing" | "failing_tests" | "failures" => Some(Self::FailingTests),
      "flaky" | "flaky_tests" | "flakes" => Some(Self::FlakyTests),
      "monitor" | "monitor_failures" => Some(Self::MonitorFailures),
      _ => None,
    }
  }
}

impl fmt::Display for BlockKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.label())
  }
}

// ---------------------------------------------------------------------------
// Correlation
// ---------------------------------------------------------------------------

/// Job name -> failed. Ordered by job name so reports are reproducible.
pub type JobOutcome = BTreeMap<String, bool>;

/// What to do when a failed job's log has no `summary:` marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryPolicy {
  /// Fail the whole report.
  #[default]
  Abort,
  /// Note the gap in the report and continue with the next job.
  Skip,
}

// ---------------------------------------------------------------------------
// Output types (JSON contract — what the binaries emit)
// ---------------------------------------------------------------------------

/// Result of a block extraction as emitted by the binaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockOutput {
  pub block: BlockKind,
  pub found: bool,
  pub text: String,
  /// Names from inline `flaked: ... "<name>"` lines (flaky block only).
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub flaked: Vec<String>,
}

impl BlockOutput {
  /// Run the extractor for `block` over `log`.
  pub fn extract(block: BlockKind, log: &str) -> Self {
    let mut output = Self::from_result(block, crate::blocks::extract_block(block, log));
    if block == BlockKind::FlakyTests {
      output.flaked = crate::blocks::flaked_test_names(log);
    }
    output
  }

  pub fn from_result(block: BlockKind, result: Result<String, crate::DistillError>) -> Self {
    match result {
      Ok(text) => Self {
        block,
        found: true,
        text,
        flaked: Vec::new(),
      },
      Err(e) => Self {
        block,
        found: false,
        text: e.fallback_text().unwrap_or(block.fallback()).to_string(),
        flaked: Vec::new(),
      },
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompactOutput {
  pub threshold: f64,
  pub input_lines: usize,
  pub output_lines: usize,
  pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutcomeOutput {
  pub jobs: JobOutcome,
}

impl OutcomeOutput {
  pub fn failed(&self) -> Vec<&str> {
    self
      .jobs
      .iter()
      .filter(|(_, &failed)| failed)
      .map(|(job, _)| job.as_str())
      .collect()
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepOutput {
  pub steps: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportOutput {
  pub report: String,
}

/// Error line emitted instead of a result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorOutput {
  pub error: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub kind: Option<String>,
}

impl ErrorOutput {
  pub fn new(error: impl Into<String>) -> Self {
    Self {
      error: error.into(),
      kind: None,
    }
  }

  pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
    self.kind = Some(kind.into());
    self
  }
}
