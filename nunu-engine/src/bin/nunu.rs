//! `nunu`: talk to Little Nunu from a terminal.
//!
//! Reads one line at a time from stdin, answers on stdout, logs to stderr.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use nunu_core::{NunuConfig, UserId};
use nunu_engine::{console, Command, Engine};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "nunu", version, about = "Little Nunu, the Soul Weeper")]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(long, env = "NUNU_CONFIG", default_value = "nunu.toml")]
    config: PathBuf,

    /// Numeric user id this session speaks as.
    #[arg(long, default_value_t = 1)]
    user: u64,

    /// Emit logs as JSON lines instead of human-readable text.
    #[arg(long)]
    json_logs: bool,
}

fn load_config(path: &Path) -> anyhow::Result<NunuConfig> {
    if path.exists() {
        NunuConfig::from_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))
    } else {
        Ok(NunuConfig::default())
    }
}

fn init_tracing(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = load_config(&args.config)?;
    init_tracing(&config.general.log_level, args.json_logs);
    if !args.config.exists() {
        warn!(path = %args.config.display(), "Config file not found, using defaults");
    }

    let user = UserId(args.user);
    let engine = Engine::from_config(config);
    info!(user = %user, known_users = engine.user_count(), "Session started");

    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    stdout.write_all(b"WAH! Nunu is listening. /help for spells.\n").await?;
    stdout.flush().await?;

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line.context("failed to read stdin")?,
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
        };
        let Some(line) = line else { break };

        let command = Command::parse(&line);
        if command == Command::Quit {
            break;
        }
        let reply = tokio::select! {
            reply = console::handle(&engine, user, command) => reply,
            _ = tokio::signal::ctrl_c() => {
                warn!(user = %user, "Turn cancelled, nothing remembered");
                continue;
            }
        };
        if let Some(reply) = reply {
            stdout.write_all(reply.as_bytes()).await?;
            stdout.write_all(b"\n").await?;
            stdout.flush().await?;
        }
    }

    info!(user = %user, "Session ended");
    Ok(())
}
