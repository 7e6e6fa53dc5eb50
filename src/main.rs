//! Nomad - Entity Component System demo
//!
//! Loads settings, runs a short fixed-step simulation and reports the result.

mod demo;
mod settings;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::settings::Settings;

fn main() -> Result<()> {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("Failed to set subscriber")?;

    info!("Starting Nomad ECS demo...");

    let settings = Settings::load().context("Failed to load settings")?;
    let summary = demo::run(&settings).context("Demo run failed")?;

    info!(
        ticks = summary.ticks,
        alive = summary.alive,
        moving = summary.moving,
        positioned = summary.positioned,
        centroid = %summary.centroid,
        "Demo finished"
    );
    Ok(())
}
