//! Host and serve commands

use leetsync::config::Config;
use leetsync::error::Result;
use leetsync::relay::{RelayState, start_server};
use leetsync::sync::LogNotifier;
use std::sync::Arc;

/// Run as the browser's native-messaging host
pub async fn run_host(config: &Config) -> Result<()> {
    // stdout carries frames, so outcomes go to the log only.
    leetsync::host::run_host(config, Arc::new(LogNotifier)).await
}

/// Run the OAuth relay server
pub async fn run_serve(config: &Config, port: Option<u16>) -> Result<()> {
    let mut relay = config.relay.clone();
    if let Some(port) = port {
        relay.port = port;
    }
    eprintln!("OAuth relay listening on http://0.0.0.0:{}", relay.port);
    start_server(RelayState {
        config: relay,
        api_base: config.api_base.clone(),
    })
    .await
}
