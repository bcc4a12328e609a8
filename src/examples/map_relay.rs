//! Caching relay in front of a running game.
//!
//! Clients connect here instead of to DFHack directly; block lists are served
//! from a shared cache, diffed per client.

use anyhow::Result;
use clap::Parser;
use dfhack_remote::RelayConfig;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "map-relay")]
#[command(about = "Relay a DFHack remote connection to many clients")]
struct Args {
    /// JSON config file with `listen` and `upstream`
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to accept clients on
    #[arg(short, long)]
    listen: Option<String>,

    /// DFHack address (defaults to localhost on $DFHACK_PORT)
    #[arg(short, long)]
    upstream: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .compact()
        .init();

    let mut config = match &args.config {
        Some(path) => RelayConfig::load(path)?,
        None => RelayConfig::default(),
    };
    if let Some(listen) = args.listen {
        config.listen = listen;
    }
    if let Some(upstream) = args.upstream {
        config.upstream = upstream;
    }

    info!(listen = %config.listen, upstream = %config.upstream, "starting relay");
    dfhack_remote::Relay::run(&config)?;
    Ok(())
}
