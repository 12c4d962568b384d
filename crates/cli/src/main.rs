//! ringstm-bank: concurrent bank transfers over RingSTM.
//!
//! ```text
//! ringstm-bank <threads> <accounts> [-d]
//! ```
//!
//! Each thread runs transactions of ten random transfers for one second (or a
//! fixed number of transactions), then the tool prints per-thread commit and
//! abort counts, throughput, and the start and final account totals. The exit
//! status is non-zero if the totals differ.

mod bank;
mod commands;
mod parse;

use std::process;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use commands::build_cli;

fn main() {
    let matches = build_cli().get_matches();

    let level = matches
        .get_one::<String>("log-level")
        .map(String::as_str)
        .unwrap_or("info");
    init_logging(level);

    match run(&matches) {
        Ok(true) => {}
        Ok(false) => process::exit(2),
        Err(e) => {
            eprintln!("error: {:#}", e);
            process::exit(1);
        }
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .init();
}

/// Returns whether the totals were conserved.
fn run(matches: &clap::ArgMatches) -> Result<bool> {
    let options = parse::bank_options(matches)?;
    let config = parse::stm_config(matches)?;

    println!("Threads: {} created", options.threads);
    let report = bank::run(&options, config)?;

    println!(
        "Start total balance for {} accounts: ${}",
        options.accounts, report.start_total
    );
    for t in &report.threads {
        println!(
            "Thread {}: commits = {}, aborts = {}",
            t.id, t.commits, t.aborts
        );
    }
    println!("Total time = {} ns", report.elapsed.as_nanos());
    println!();
    println!("Throughput = {}", report.throughput());
    println!(
        "Final total balance for {} accounts: ${}",
        options.accounts, report.final_total
    );
    println!("Clock: {}", report.clock);
    println!(
        "Aborts: {} ({} rollover), CAS retries: {}, commit rate: {:.3}",
        report.metrics.aborts,
        report.metrics.rollover_aborts,
        report.metrics.cas_retries,
        report.metrics.commit_rate
    );

    if !report.is_conserved() {
        eprintln!(
            "balance not conserved: {} before, {} after",
            report.start_total, report.final_total
        );
    }
    Ok(report.is_conserved())
}
