// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Vulnsift CLI
//!
//! Reconciles the scanning service's runtime workload inventory against a
//! scheduled bulk vulnerability report and writes three partitions:
//! vulnerabilities on running workloads, running workloads without report
//! data, and report rows without a running workload.
//!
//! Usage:
//!   vulnsift --url <authority> --report <schedule_id> --output <file> [options]

use std::fs::File;
use std::io::{BufWriter, Cursor};
use std::process::ExitCode;
use std::time::Duration;

use tracing::{error, info};

use vulnsift_client::{ScanApiClient, ScanApiConfig};
use vulnsift_core::output::{write_matched, write_unmatched_export, write_unmatched_inventory};
use vulnsift_core::{ReconciliationIndex, ReportReader, reconcile};

fn print_usage() {
    eprintln!(
        r#"Usage: vulnsift [options]

Reconcile running workloads against a bulk vulnerability report.

OPTIONS:
    --url <authority>           Scanning service URL or authority (or VULNSIFT_API_URL)
    --token <token>             API token (prefer VULNSIFT_API_TOKEN)
    --report <schedule_id>      Report schedule to download (required)
    --output <file>             Matched vulnerabilities output (required)
    --unmatched-output <file>   Running workloads without report data
                                (default: unmatched_workloads.csv)
    --missing-output <file>     Report rows without a running workload
                                (omitted unless set)
    --page-size <n>             Inventory page size (default: 1000)
    --wait <seconds>            Poll until a report completes after startup,
                                up to this many seconds, before downloading

ENVIRONMENT:
    VULNSIFT_API_URL            Scanning service URL or authority
    VULNSIFT_API_TOKEN          Bearer token
    VULNSIFT_PAGE_SIZE          Inventory page size
    VULNSIFT_REQUEST_TIMEOUT_MS Per-request timeout
    VULNSIFT_RETRY_DELAY_MS     Delay between 429 retries

EXAMPLES:
    # Reconcile against the latest completed report
    vulnsift --url secure.example.com --report sched-42 --output matched.csv

    # Also write the rows no running workload accounts for
    vulnsift --report sched-42 --output matched.csv --missing-output stale.csv
"#
    );
}

#[derive(Debug)]
struct Args {
    url: Option<String>,
    token: Option<String>,
    report_id: String,
    output: String,
    unmatched_output: String,
    missing_output: Option<String>,
    page_size: Option<u32>,
    wait_secs: Option<u64>,
}

fn parse_args(args: &[String]) -> Result<Args, String> {
    let mut url: Option<String> = None;
    let mut token: Option<String> = None;
    let mut report_id: Option<String> = None;
    let mut output: Option<String> = None;
    let mut unmatched_output: Option<String> = None;
    let mut missing_output: Option<String> = None;
    let mut page_size: Option<u32> = None;
    let mut wait_secs: Option<u64> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "help" | "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            "--url" => {
                i += 1;
                url = Some(args.get(i).ok_or("--url requires a value")?.clone());
            }
            "--token" => {
                i += 1;
                token = Some(args.get(i).ok_or("--token requires a value")?.clone());
            }
            "--report" => {
                i += 1;
                report_id = Some(args.get(i).ok_or("--report requires an ID")?.clone());
            }
            "--output" => {
                i += 1;
                output = Some(args.get(i).ok_or("--output requires a path")?.clone());
            }
            "--unmatched-output" => {
                i += 1;
                unmatched_output = Some(
                    args.get(i)
                        .ok_or("--unmatched-output requires a path")?
                        .clone(),
                );
            }
            "--missing-output" => {
                i += 1;
                missing_output = Some(
                    args.get(i)
                        .ok_or("--missing-output requires a path")?
                        .clone(),
                );
            }
            "--page-size" => {
                i += 1;
                page_size = Some(
                    args.get(i)
                        .ok_or("--page-size requires a number")?
                        .parse()
                        .map_err(|_| "Invalid page size")?,
                );
            }
            "--wait" => {
                i += 1;
                wait_secs = Some(
                    args.get(i)
                        .ok_or("--wait requires a number of seconds")?
                        .parse()
                        .map_err(|_| "Invalid wait duration")?,
                );
            }
            arg => return Err(format!("Unknown argument: {}", arg)),
        }
        i += 1;
    }

    Ok(Args {
        url,
        token,
        report_id: report_id.ok_or("--report is required")?,
        output: output.ok_or("--output is required")?,
        unmatched_output: unmatched_output
            .unwrap_or_else(|| "unmatched_workloads.csv".to_string()),
        missing_output,
        page_size,
        wait_secs,
    })
}

fn build_config(args: &Args) -> Result<ScanApiConfig, String> {
    // Command-line values win; the environment fills in whichever credential
    // is missing and supplies the tuning variables either way.
    let mut config =
        ScanApiConfig::from_env_with_overrides(args.url.as_deref(), args.token.as_deref())
            .map_err(|e| e.to_string())?;
    if let Some(page_size) = args.page_size {
        config = config.with_page_size(page_size);
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("vulnsift=info".parse().expect("static directive")),
        )
        .init();

    let raw: Vec<String> = std::env::args().collect();
    let args = match parse_args(&raw) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!();
            print_usage();
            return ExitCode::FAILURE;
        }
    };

    let config = match build_config(&args) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match run(args, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args, config: ScanApiConfig) -> Result<(), Box<dyn std::error::Error>> {
    let client = ScanApiClient::new(config)?;

    if let Some(wait_secs) = args.wait_secs {
        let baseline = client.last_completed_at(&args.report_id).await?;
        info!(?baseline, wait_secs, "waiting for a fresh report generation");
        let completed = client
            .wait_for_report(&args.report_id, baseline, Duration::from_secs(wait_secs))
            .await?;
        info!(%completed, "report generation completed");
    }

    let report_bytes = client.download_report(&args.report_id).await?;

    let mut reader = ReportReader::new(Cursor::new(report_bytes))?;
    let schema = reader.schema();
    let mut records = Vec::new();
    for record in reader.by_ref() {
        records.push(record?);
    }
    info!(
        rows = records.len(),
        distinct_key_values = reader.into_interner().len(),
        "bulk report ingested"
    );

    let index = ReconciliationIndex::build(records);
    info!(
        keys = index.key_count(),
        records = index.record_count(),
        "reconciliation index built"
    );

    let inventory = client.list_runtime_results().await?;

    let result = reconcile(inventory, index);

    // All partitions are complete before the first file is created, so a
    // failure above never leaves a half-written output behind.
    let mut primary = BufWriter::new(File::create(&args.output)?);
    write_matched(&mut primary, &schema, &result.matched)?;

    let mut unmatched = BufWriter::new(File::create(&args.unmatched_output)?);
    write_unmatched_inventory(&mut unmatched, &result.unmatched_inventory)?;

    if let Some(path) = &args.missing_output {
        let mut missing = BufWriter::new(File::create(path)?);
        write_unmatched_export(&mut missing, &schema, &result.unmatched_export)?;
    }

    info!(
        matched_rows = result.stats.matched_rows,
        unmatched_workloads = result.stats.unmatched_inventory,
        unreported_rows = result.stats.unmatched_export_rows,
        duplicate_workloads = result.stats.duplicate_workloads,
        output = %args.output,
        "reconciliation written"
    );
    Ok(())
}
