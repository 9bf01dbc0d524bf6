//! pollsync - interactive shell over the poll view synchronizer.
//!
//! Runs against an in-process poll service seeded from the configuration file.

use anyhow::{Context, Result};
use clap::{value_parser, Arg, Command};
use pollsync::{
    Application, InMemoryPollService, PollService, PollSynchronizer, SyncConfig,
    TimeoutPollService,
};
use std::path::PathBuf;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging, controlled through RUST_LOG
    env_logger::init();

    let matches = Command::new("pollsync")
        .version(pollsync::VERSION)
        .about("Interactive shell over a cached, synchronized view of polls")
        .long_about(
            "pollsync keeps a cached view of polls consistent with the poll service. \
             Commands are read one per line from standard input; type 'help' for a list.",
        )
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .help("Path to a TOML configuration file")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("account")
                .long("account")
                .short('a')
                .help("Account the shell votes and closes polls as"),
        )
        .arg(
            Arg::new("timeout-ms")
                .long("timeout-ms")
                .help("Per-call timeout for poll service calls, in milliseconds")
                .value_parser(value_parser!(u64).range(1..)),
        )
        .get_matches();

    let mut config = SyncConfig::load(matches.get_one::<PathBuf>("config").map(PathBuf::as_path))
        .context("failed to load configuration")?;
    if let Some(account) = matches.get_one::<String>("account") {
        if account.trim().is_empty() {
            anyhow::bail!("--account must not be empty");
        }
        config.account = account.clone();
    }
    if let Some(timeout_ms) = matches.get_one::<u64>("timeout-ms") {
        config.call_timeout_ms = Some(*timeout_ms);
    }

    let backend = InMemoryPollService::new().as_account(&config.account);
    for seed in &config.seed {
        backend.insert_poll(seed.title.clone(), seed.options.clone(), !seed.closed);
    }

    let service: Arc<dyn PollService> = match config.call_timeout() {
        Some(timeout) => Arc::new(TimeoutPollService::new(backend, timeout)),
        None => Arc::new(backend),
    };
    log::info!(
        "starting shell as {} with {} seeded polls, call timeout {:?}",
        config.account,
        config.seed.len(),
        config.call_timeout()
    );

    let mut app =
        Application::new(PollSynchronizer::new(service)).refresh_on_start(config.refresh_on_start);
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    app.run(stdin, tokio::io::stdout())
        .await
        .context("shell terminated")?;

    Ok(())
}
