//! ArgMatches → workload options and STM configuration.
//!
//! STM settings come from `--config` when given (defaults otherwise), then
//! `--ring-capacity` / `--signature-bits` override individual fields.

use anyhow::{Context, Result};
use clap::ArgMatches;
use ringstm_core::StmConfig;
use std::time::Duration;

use crate::bank::{BankOptions, Workload};

/// Build workload options from parsed arguments.
pub fn bank_options(matches: &ArgMatches) -> Result<BankOptions> {
    let threads = *matches
        .get_one::<usize>("threads")
        .context("missing thread count")?;
    let accounts = *matches
        .get_one::<usize>("accounts")
        .context("missing account count")?;

    let workload = match matches.get_one::<u64>("transactions") {
        Some(n) => Workload::Transactions(*n),
        None => {
            let ms = matches.get_one::<u64>("duration-ms").copied().unwrap_or(1000);
            Workload::Timed(Duration::from_millis(ms))
        }
    };

    let options = BankOptions {
        threads,
        accounts,
        disjoint: matches.get_flag("disjoint"),
        workload,
        initial_balance: matches
            .get_one::<i64>("initial-balance")
            .copied()
            .unwrap_or(1000),
    };
    options.validate()?;
    Ok(options)
}

/// Resolve the STM configuration.
pub fn stm_config(matches: &ArgMatches) -> Result<StmConfig> {
    let mut config = match matches.get_one::<String>("config") {
        Some(path) => StmConfig::from_file(path)
            .with_context(|| format!("failed to load config file {}", path))?,
        None => StmConfig::default(),
    };

    if let Some(capacity) = matches.get_one::<usize>("ring-capacity") {
        config.ring_capacity = *capacity;
    }
    if let Some(bits) = matches.get_one::<usize>("signature-bits") {
        config.signature_bits = *bits;
    }
    config.validate()?;
    Ok(config)
}
