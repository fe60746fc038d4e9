//! Compaction of verbose single-job step logs.
//!
//! Two passes: strip per-test progress lines (only for thresholds above
//! [`STRIP_THRESHOLD`]), then drop lines that are near-duplicates of a line
//! emitted within the last [`DEDUP_WINDOW`] output lines.

use std::collections::{HashSet, VecDeque};
use tracing::debug;

use crate::config::{clamp_threshold, DEDUP_WINDOW, STRIP_THRESHOLD};

const STARTED_PREFIX: &str = "started:";
const PROGRESS_PREFIXES: [&str; 3] = ["started:", "passed: ", "skipped: "];

/// Strip progress lines (when `threshold > 0.6`) and deduplicate the result.
///
/// If stripping is disabled or leaves nothing, the original text is
/// deduplicated instead.
pub fn compact_test_logs(input: &str, threshold: f64) -> String {
  let threshold = clamp_threshold(threshold);
  let stripped = if threshold > STRIP_THRESHOLD {
    strip_progress_lines(input)
  } else {
    String::new()
  };

  let source = if stripped.is_empty() {
    input
  } else {
    stripped.as_str()
  };
  let out = deduplicate_logs_with_window(source, threshold, DEDUP_WINDOW);
  debug!(
    threshold,
    input_lines = input.lines().count(),
    output_lines = out.lines().count(),
    "compacted log"
  );
  out
}

/// Everything from the first `started:` line on, minus `started:`, `passed: `
/// and `skipped: ` lines. Lines before the first `started:` are dropped.
pub fn strip_progress_lines(input: &str) -> String {
  let mut out = String::new();
  let mut in_block = false;
  for line in input.lines() {
    if !in_block && line.starts_with(STARTED_PREFIX) {
      in_block = true;
    }
    if !in_block || PROGRESS_PREFIXES.iter().any(|p| line.starts_with(p)) {
      continue;
    }
    out.push_str(line);
    out.push('\n');
  }
  out
}

/// Drop every line that is similar enough to one of the last `window` emitted
/// lines. Output lines are `\n`-terminated.
///
/// A line is a near-duplicate when its token-set similarity to a window entry is
/// positive and at least `1 - threshold`. Threshold 0 keeps everything;
/// any positive threshold drops exact repeats.
///
/// The kept-line count is not monotone in `threshold`: a dropped line never
/// enters the window, so a higher threshold can let later lines through.
/// What does hold is that the output at a higher threshold passes through
/// this function unchanged at any lower threshold.
pub fn deduplicate_logs_with_window(input: &str, threshold: f64, window: usize) -> String {
  let threshold = clamp_threshold(threshold);
  let mut recent = DedupWindow::new(window);
  let mut out = String::with_capacity(input.len());

  for line in input.lines() {
    if threshold > 0.0 && recent.has_near_duplicate(line, threshold) {
      continue;
    }
    out.push_str(line);
    out.push('\n');
    recent.push(line);
  }
  out
}

/// Token-set Jaccard ratio in [0, 1]. Identical lines (including two blank
/// lines) score 1.
pub(crate) fn similarity(a: &str, b: &str) -> f64 {
  if a == b {
    return 1.0;
  }
  jaccard(&tokens(a), &tokens(b))
}

fn tokens(line: &str) -> HashSet<&str> {
  line.split_whitespace().collect()
}

fn jaccard(a: &HashSet<&str>, b: &HashSet<&str>) -> f64 {
  let union = a.union(b).count();
  if union == 0 {
    return 1.0;
  }
  a.intersection(b).count() as f64 / union as f64
}

// ---------------------------------------------------------------------------
// Window
// ---------------------------------------------------------------------------

struct WindowEntry<'a> {
  line: &'a str,
  tokens: HashSet<&'a str>,
}

/// Most recently emitted lines, oldest first.
struct DedupWindow<'a> {
  capacity: usize,
  entries: VecDeque<WindowEntry<'a>>,
}

impl<'a> DedupWindow<'a> {
  fn new(capacity: usize) -> Self {
    Self {
      capacity,
      entries: VecDeque::with_capacity(capacity + 1),
    }
  }

  fn has_near_duplicate(&self, line: &str, threshold: f64) -> bool {
    let cutoff = 1.0 - threshold;
    let line_tokens = tokens(line);
    self.entries.iter().any(|entry| {
      let score = if entry.line == line {
        1.0
      } else {
        jaccard(&entry.tokens, &line_tokens)
      };
      score > 0.0 && score >= cutoff
    })
  }

  fn push(&mut self, line: &'a str) {
    self.entries.push_back(WindowEntry {
      line,
      tokens: tokens(line),
    });
    while self.entries.len() > self.capacity {
      self.entries.pop_front();
    }
  }
}
