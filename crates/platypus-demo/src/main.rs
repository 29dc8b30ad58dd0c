// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platypus Controller demo.
//
// Entry point. Loads settings, initialises logging, wires the controller
// bridge to a simulated native host, and prints the sensor readout the app
// collects from bridge events.

mod app;
mod config;
mod peer;
mod readout;

use std::sync::Arc;
use std::time::Duration;

use platypus_bridge::{ChannelTransport, StubBridge};
use platypus_controller::Controller;
use platypus_core::error::{ErrorKind, Result};

use app::App;
use config::DemoConfig;
use peer::SimulatedController;

#[tokio::main]
async fn main() {
    let path = config::config_path();
    let settings = config::load_config(&path);
    let found = settings.is_some();
    let config = settings.unwrap_or_default();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.bridge.log_filter)),
        )
        .init();

    tracing::info!(path = %path.display(), found, "Platypus demo starting");

    if !found {
        if let Err(e) = config::persist_config(&path, &config) {
            tracing::warn!(error = %e, "could not write default config");
        }
    }

    if let Err(e) = run(config).await {
        tracing::error!(error = %e, "demo failed");
        std::process::exit(1);
    }
}

async fn run(config: DemoConfig) -> Result<()> {
    if !config.simulated_host {
        return run_without_host(&config).await;
    }

    let (transport, native) = ChannelTransport::pair(config.bridge.channel_capacity);
    let device = SimulatedController::new(native, &config.sensors);
    let feed = device.feed();
    let host = tokio::spawn(device.serve());

    let controller = Controller::new(Arc::new(transport), &config.bridge);
    let mut app = App::new();
    app.bind(&controller).await?;

    let version = controller.get_version().await?;
    tracing::info!(%version, "native controller plugin");

    feed.set_connected(true);
    let view = app.view();
    tracing::info!(
        connected = controller.is_connected().await?,
        shown = view.get("connection").unwrap_or("unknown"),
        "controller state"
    );

    let interval = Duration::from_millis(config.tick_interval_ms);
    for n in 0..config.ticks {
        let emitted = feed.tick(n);
        tracing::debug!(tick = n, emitted, "sensor round");
        tokio::time::sleep(interval).await;
    }

    for script in &config.commands {
        match controller
            .client()
            .invoke_named(&script.action, script.args.clone())
            .await
        {
            Ok(result) => tracing::info!(
                action = %script.action,
                success = result.is_success(),
                payload = %result.payload(),
                "scripted command answered"
            ),
            Err(e) if e.kind() == ErrorKind::Caller => {
                tracing::warn!(action = %script.action, error = %e, "skipping scripted command");
            }
            Err(e) => return Err(e),
        }
    }

    println!("{}", app.view().render());

    app.unbind(&controller).await?;
    controller.shutdown().await?;
    if let Err(e) = host.await {
        tracing::warn!(error = %e, "simulated controller task ended abnormally");
    }
    Ok(())
}

/// No native host: the stub bridge stands in, so the app comes up with every
/// sensor marked unsupported.
async fn run_without_host(config: &DemoConfig) -> Result<()> {
    tracing::warn!("no native host configured; using stub bridge");
    let controller = Controller::new(Arc::new(StubBridge), &config.bridge);
    let mut app = App::new();
    app.bind(&controller).await?;

    if let Err(e) = controller.get_version().await {
        tracing::warn!(error = %e, "native controller plugin unavailable");
    }

    println!("{}", app.view().render());
    controller.shutdown().await
}
