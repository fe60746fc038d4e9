//! prow-paths: job identifiers and artifact locations from Prow job URLs
//!
//! Usage:
//!   prow-paths job-info <url>            # job name and build ID
//!   prow-paths test-name <url>           # e2e test (step) name
//!   prow-paths gather-extra <url>        # gather-extra artifacts URL
//!   prow-paths container-log <gather-extra> <namespace> <pod> <container>
//!   prow-paths <cmd> ... --json          # print JSON instead of plain text
//!
//! Exit status 2 when the URL cannot be interpreted.

use clap::{Parser, Subcommand};
use std::process;

use log_distiller::metadata::{extract_prow_job_info, extract_test_name_from_url};
use log_distiller::paths::{container_log_path, gather_extra_folder_url};
use log_distiller::DistillError;

#[derive(Parser)]
#[command(name = "prow-paths", version)]
struct Cli {
    /// Print JSON instead of plain text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    JobInfo { url: String },
    TestName { url: String },
    GatherExtra { url: String },
    ContainerLog {
        gather_extra: String,
        namespace: String,
        pod: String,
        container: String,
    },
}

#[derive(serde::Serialize)]
struct JobInfo<'a> {
    job_name: &'a str,
    job_id: &'a str,
}

fn run(cli: &Cli) -> Result<String, DistillError> {
    let out = match &cli.command {
        Command::JobInfo { url } => {
            let info = extract_prow_job_info(url)?;
            if cli.json {
                to_json(&JobInfo {
                    job_name: &info.job_name,
                    job_id: &info.job_id,
                })
            } else {
                format!("{}\t{}", info.job_name, info.job_id)
            }
        }
        Command::TestName { url } => text_or_json(cli.json, extract_test_name_from_url(url)?),
        Command::GatherExtra { url } => text_or_json(cli.json, gather_extra_folder_url(url)?),
        Command::ContainerLog {
            gather_extra,
            namespace,
            pod,
            container,
        } => text_or_json(
            cli.json,
            container_log_path(gather_extra.trim_end_matches('/'), pod, namespace, container),
        ),
    };
    Ok(out)
}

fn text_or_json(json: bool, value: String) -> String {
    if json {
        to_json(&value)
    } else {
        value
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| {
        eprintln!("prow-paths: cannot encode output: {}", e);
        process::exit(2);
    })
}

fn main() {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(out) => println!("{}", out),
        Err(e) => {
            eprintln!("prow-paths: {}", e);
            process::exit(2);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "https://prow.ci.openshift.org/view/gs/test-platform-results/logs/periodic-ci-openshift-release-master-nightly-4.20-e2e-gcp-ovn/77";

    fn cli(json: bool, command: Command) -> Cli {
        Cli { json, command }
    }

    #[test]
    fn job_info_plain_and_json() {
        let plain = run(&cli(false, Command::JobInfo { url: URL.into() })).unwrap();
        assert_eq!(plain, "periodic-ci-openshift-release-master-nightly-4.20-e2e-gcp-ovn\t77");
        let json = run(&cli(true, Command::JobInfo { url: URL.into() })).unwrap();
        assert_eq!(
            json,
            r#"{"job_name":"periodic-ci-openshift-release-master-nightly-4.20-e2e-gcp-ovn","job_id":"77"}"#
        );
    }

    #[test]
    fn gather_extra_and_container_log() {
        let folder = run(&cli(false, Command::GatherExtra { url: URL.into() })).unwrap();
        assert!(folder.ends_with("/77/artifacts/e2e-gcp-ovn/gather-extra/artifacts/"));
        let log = run(&cli(
            false,
            Command::ContainerLog {
                gather_extra: folder,
                namespace: "openshift-etcd".into(),
                pod: "etcd-0".into(),
                container: "etcd".into(),
            },
        ))
        .unwrap();
        assert!(log.ends_with("/gather-extra/artifacts/pods/openshift-etcd_etcd-0_etcd.log"));
    }

    #[test]
    fn bad_url_is_an_error() {
        assert!(run(&cli(false, Command::GatherExtra { url: "https://example.com/x".into() })).is_err());
    }
}
