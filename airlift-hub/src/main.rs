//! Airlift Hub -- presence and peer file-transfer signaling server.
//!
//! An axum WebSocket server that tracks which users are online, probes
//! whether their peer file service is reachable, and relays transfer
//! signaling (offer / accept / chunk) between them. File bytes travel
//! peer to peer; the hub only carries opaque signaling frames.
//!
//! # Usage
//!
//! ```bash
//! # Run on default address 0.0.0.0:9000
//! cargo run --bin airlift-hub
//!
//! # Run on custom address
//! cargo run --bin airlift-hub -- --bind 127.0.0.1:8080
//!
//! # Or via environment variable
//! AIRLIFT_ADDR=127.0.0.1:8080 cargo run --bin airlift-hub
//! ```

use std::sync::Arc;

use airlift_hub::config::{HubCliArgs, HubConfig};
use airlift_hub::hub::{self, HubState};
use airlift_hub::identity::StaticTokenResolver;
use airlift_hub::poller;
use airlift_hub::probe::Prober;
use clap::Parser;

#[tokio::main]
async fn main() {
    let cli = HubCliArgs::parse();

    // Load config from CLI args + config file + env vars + defaults.
    let config = match HubConfig::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            std::process::exit(1);
        }
    };

    // Initialize tracing with the resolved log level.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    tracing::info!(addr = %config.bind_addr, "starting airlift hub");

    let mut resolver = StaticTokenResolver::new();
    for entry in &config.tokens {
        resolver.insert(
            entry.token.clone(),
            entry.user_id.clone(),
            entry.display_name.clone(),
        );
    }
    if resolver.is_empty() {
        tracing::warn!("no admission tokens configured; every connection will be refused");
    }

    let state = Arc::new(HubState::with_limits(
        resolver,
        config.max_file_size,
        config.max_chunk_size,
    ));

    let prober = Prober::new(config.probe_port, config.probe_timeout);
    let _poller = poller::spawn(Arc::clone(&state), prober, config.poll_interval);
    tracing::info!(
        port = config.probe_port,
        interval_secs = config.poll_interval.as_secs(),
        "reachability poller running"
    );

    match hub::start_server(&config.bind_addr, state).await {
        Ok((bound_addr, handle)) => {
            tracing::info!(addr = %bound_addr, "hub listening");
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "hub server task failed");
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to start hub server");
            std::process::exit(1);
        }
    }
}
