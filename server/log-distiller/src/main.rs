//! Binary entrypoint: read one log from stdin, write one JSON object to stdout.
//!
//! Block extraction that finds nothing still prints its fallback text but
//! exits with status 1. Other failures print an ErrorOutput and exit 2.

use anyhow::Result;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::io::{self, Read, Write};
use std::process;
use tracing::Level;

use log_distiller::metadata::extract_step_name;
use log_distiller::report::indent_multiline;
use log_distiller::telemetry::init_tracing;
use log_distiller::types::{
  BlockOutput, CompactOutput, ErrorOutput, OutcomeOutput, ReportOutput, StepOutput,
};
use log_distiller::{
  compact_test_logs, extract_failed_jobs_from_aggregate, BlockKind, Config,
  DistillError, HttpFetcher, ReportAssembler, SummaryPolicy,
};

#[derive(Parser)]
#[command(name = "log-distiller", version, about = "Distill CI job logs into short excerpts")]
struct Cli {
  /// Print plain text instead of JSON.
  #[arg(long, global = true)]
  text: bool,

  /// Emit diagnostics on stderr as JSON lines.
  #[arg(long, global = true)]
  log_json: bool,

  /// Increase diagnostic verbosity (-v debug, -vv trace).
  #[arg(short, long, action = clap::ArgAction::Count, global = true)]
  verbose: u8,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Failing tests block.
  Failing,
  /// Flaky tests block plus inline `flaked:` lines.
  Flaky,
  /// Monitor test failure block.
  Monitor,
  /// Strip progress lines and drop near-duplicate lines.
  Compact {
    /// Similarity threshold in [0, 1]; defaults to DISTILL_THRESHOLD or 0.7.
    #[arg(long)]
    threshold: Option<f64>,
  },
  /// Per-job pass/fail map from an aggregated job log.
  Outcomes,
  /// Combined `summary:` report for every failed job in an aggregated log.
  Report {
    /// Artifact directory holding `<job>/<job>.log`.
    #[arg(long)]
    base_url: String,
    /// Note jobs without a summary instead of failing the report.
    #[arg(long)]
    skip_missing_summary: bool,
  },
  /// Names of failed steps (`Step <name> failed after`).
  Steps,
}

fn main() {
  match run() {
    Ok(code) => process::exit(code),
    Err(e) => {
      let _ = writeln!(io::stderr(), "log-distiller: {:#}", e);
      process::exit(2);
    }
  }
}

fn run() -> Result<i32> {
  let cli = Cli::parse();
  let level = match cli.verbose {
    0 => Level::WARN,
    1 => Level::DEBUG,
    _ => Level::TRACE,
  };
  init_tracing(cli.log_json, level);

  let config = Config::from_env();
  let mut input = String::new();
  io::stdin().lock().read_to_string(&mut input)?;

  let stdout = io::stdout();
  let mut out = io::BufWriter::new(stdout.lock());

  let code = match cli.command {
    Command::Failing => emit_block(&mut out, cli.text, BlockKind::FailingTests, &input)?,
    Command::Flaky => emit_block(&mut out, cli.text, BlockKind::FlakyTests, &input)?,
    Command::Monitor => emit_block(&mut out, cli.text, BlockKind::MonitorFailures, &input)?,
    Command::Compact { threshold } => {
      let threshold = threshold.unwrap_or(config.compact_threshold);
      let text = compact_test_logs(&input, threshold);
      if cli.text {
        out.write_all(text.as_bytes())?;
      } else {
        let output = CompactOutput {
          threshold,
          input_lines: input.lines().count(),
          output_lines: text.lines().count(),
          text,
        };
        write_json(&mut out, &output)?;
      }
      0
    }
    Command::Outcomes => {
      let output = OutcomeOutput {
        jobs: extract_failed_jobs_from_aggregate(&input),
      };
      if cli.text {
        for (job, failed) in &output.jobs {
          writeln!(out, "{}\t{}", if *failed { "FAIL" } else { "ok" }, job)?;
        }
      } else {
        write_json(&mut out, &output)?;
      }
      0
    }
    Command::Report {
      base_url,
      skip_missing_summary,
    } => {
      let policy = if skip_missing_summary {
        SummaryPolicy::Skip
      } else {
        config.summary_policy
      };
      let fetcher = HttpFetcher::new(&config)?;
      match ReportAssembler::new(fetcher, policy).assemble(&base_url, &input) {
        Ok(report) if cli.text => {
          out.write_all(report.as_bytes())?;
          0
        }
        Ok(report) => {
          write_json(&mut out, &ReportOutput { report })?;
          0
        }
        Err(e) => {
          write_json(&mut out, &error_output(&e))?;
          2
        }
      }
    }
    Command::Steps => {
      let steps: Vec<String> = input
        .lines()
        .filter_map(|line| extract_step_name(line).ok())
        .collect();
      let code = if steps.is_empty() { 1 } else { 0 };
      if cli.text {
        for step in &steps {
          writeln!(out, "{}", step)?;
        }
      } else {
        write_json(&mut out, &StepOutput { steps })?;
      }
      code
    }
  };

  out.flush()?;
  Ok(code)
}

fn emit_block(out: &mut impl Write, text: bool, kind: BlockKind, input: &str) -> Result<i32> {
  let output = BlockOutput::extract(kind, input);
  if text {
    writeln!(out, "{}:", kind)?;
    writeln!(out, "{}", indent_multiline(output.text.trim_end_matches('\n'), "  "))?;
  } else {
    write_json(out, &output)?;
  }
  Ok(if output.found { 0 } else { 1 })
}

fn error_output(e: &DistillError) -> ErrorOutput {
  ErrorOutput::new(e.to_string()).with_kind(e.kind())
}

fn write_json<T: Serialize>(out: &mut impl Write, value: &T) -> Result<()> {
  serde_json::to_writer(&mut *out, value)?;
  writeln!(out)?;
  Ok(())
}
