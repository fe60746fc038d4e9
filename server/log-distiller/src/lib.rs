//! CI Log Distiller — deterministic, marker-driven excerpts from CI job logs.
//!
//! Extracts the failing-tests, flaky-tests and monitor-failure blocks from a
//! job log, correlates aggregated multi-job logs into per-job outcomes,
//! compacts verbose step logs, and assembles combined failure reports.
//!
//! Stateless: every call owns its input and returns a complete result.

pub mod blocks;
pub mod compact;
pub mod config;
pub mod correlation;
pub mod error;
pub mod fetch;
pub mod metadata;
pub mod paths;
pub mod report;
pub mod telemetry;
pub mod types;

pub use blocks::{
  extract_block, extract_failing_tests_block, extract_flaky_tests_block,
  extract_monitor_test_failures,
};
pub use compact::compact_test_logs;
pub use config::Config;
pub use correlation::extract_failed_jobs_from_aggregate;
pub use error::{DistillError, FetchError};
pub use fetch::{Fetcher, HttpFetcher, StaticFetcher};
pub use report::{fetch_aggregate_job_failures, ReportAssembler};
pub use types::{BlockKind, JobOutcome, SummaryPolicy};
