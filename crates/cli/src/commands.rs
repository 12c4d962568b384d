//! Clap command definition for `ringstm-bank`.

use clap::{Arg, ArgAction, Command};

/// Build the argument parser.
pub fn build_cli() -> Command {
    Command::new("ringstm-bank")
        .about("Concurrent bank transfers over RingSTM; checks that money is conserved")
        .version(env!("CARGO_PKG_VERSION"))
        .arg(
            Arg::new("threads")
                .help("Number of worker threads")
                .required(true)
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("accounts")
                .help("Number of accounts (1..=1000000)")
                .required(true)
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("disjoint")
                .short('d')
                .long("disjoint")
                .help("Give each thread its own range of accounts")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("duration-ms")
                .long("duration-ms")
                .help("Run time per thread in milliseconds")
                .default_value("1000")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("transactions")
                .long("transactions")
                .help("Run a fixed number of transactions per thread instead of a timed run")
                .value_parser(clap::value_parser!(u64))
                .conflicts_with("duration-ms"),
        )
        .arg(
            Arg::new("initial-balance")
                .long("initial-balance")
                .help("Starting balance of every account")
                .default_value("1000")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .help("TOML file with STM settings"),
        )
        .arg(
            Arg::new("ring-capacity")
                .long("ring-capacity")
                .help("Override the ring capacity (power of two)")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("signature-bits")
                .long("signature-bits")
                .help("Override the signature width (multiple of 64)")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .help("Log filter, e.g. info or ringstm_concurrency=trace")
                .default_value("info"),
        )
}
