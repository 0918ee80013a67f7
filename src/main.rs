//! teealloy - command line client of the TeeAlloy auth service.
//!
//! This program exercises the [`teealloy::auth::AuthClient`] the way a game
//! server would: probe the auth service, then verify the game tokens
//! presented by players.
//!
//! # Configuration
//!
//! Create a `config.yaml` file with your settings:
//!
//! ```yaml
//! auth:
//!   host: "https://auth.example.com"
//!   server_address: "1.2.3.4:8303"
//!   api_key: "sk_live_xxx"
//! ```
//!
//! Override any value using environment variables with the `TEEALLOY_` prefix:
//!
//! ```bash
//! export TEEALLOY_AUTH__API_KEY="sk_live_xxx"
//! ```
//!
//! # Usage
//!
//! ```bash
//! teealloy --config config.yaml health
//! teealloy --config config.yaml verify TOKEN_A TOKEN_B
//! RUST_LOG=debug teealloy --config config.yaml verify --wait 5 TOKEN
//! ```
//!
//! # Environment Variables
//!
//! - `RUST_LOG` - Controls logging level (default: `info`)

use std::process::ExitCode;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::{Parser, Subcommand};
use env_logger::Env;
use log::{error, info, warn};

use teealloy::auth::AuthClient;
use teealloy::config::Config;

/// Command-line arguments of the teealloy program.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the YAML configuration file.
    #[arg(short, long)]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check that the auth service is up.
    Health,
    /// Verify game tokens through the asynchronous API.
    Verify {
        /// Seconds to wait for all verifications to complete.
        #[arg(short, long, default_value_t = 20)]
        wait: u64,

        /// Game tokens to verify.
        #[arg(required = true)]
        tokens: Vec<String>,
    },
}

fn main() -> ExitCode {
    // Put logger at info level by default
    let env = Env::default().filter_or("RUST_LOG", "info");
    env_logger::init_from_env(env);

    info!("Starting teealloy {}...", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();

    match run(args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Runs a command, returns whether every check passed.
fn run(args: Args) -> anyhow::Result<bool> {
    let config = Config::load(&args.config).context("failed to load config file")?;
    let client = AuthClient::with_config(config.auth.client_config())
        .context("failed to start auth client")?;

    match args.command {
        Command::Health => Ok(health(&client)),
        Command::Verify { wait, tokens } => {
            // Same sequence as a game server at startup
            if !health(&client) {
                warn!("auth service unhealthy, verifying anyway");
            }
            Ok(verify(&client, tokens, Duration::from_secs(wait)))
        }
    }
}

fn health(client: &AuthClient) -> bool {
    match client.health_check() {
        Ok(()) => {
            info!("Health check passed");
            true
        }
        Err(e) => {
            error!("Health check failed: {}", e);
            false
        }
    }
}

fn verify(client: &AuthClient, tokens: Vec<String>, wait: Duration) -> bool {
    let (tx, rx) = mpsc::channel();
    let count = tokens.len();

    for (index, token) in tokens.iter().enumerate() {
        let tx = tx.clone();
        client.verify_game_token_async(token, move |result| {
            // The receiver is gone once the wait expired
            let _ = tx.send((index, result));
        });
    }
    drop(tx);

    let deadline = Instant::now() + wait;
    let mut verified = 0;
    for _ in 0..count {
        let timeout = deadline.saturating_duration_since(Instant::now());
        let Ok((index, result)) = rx.recv_timeout(timeout) else {
            error!("gave up waiting for verifications after {:?}", wait);
            return false;
        };

        match result {
            Ok(user) => {
                verified += 1;
                info!("[async] token #{} accepted: {}", index, user);
            }
            Err(e) => error!("[async] token #{} rejected: {}", index, e),
        }
    }

    info!("{}/{} tokens verified", verified, count);
    verified == count
}
