//! # Switchyard Runtime
//!
//! Delivers every file in `SY_SOURCE_DIR` to `SY_TARGET_DIR` through the
//! channel, dispatcher and pooled-transfer stack, then prints a JSON run
//! summary. Ctrl+C stops scanning and lets in-flight deliveries finish.

use std::sync::Arc;

use anyhow::{Context, Result};
use sy_runtime::{Pipeline, RuntimeConfig};
use sy_telemetry::{init_logging, TelemetryConfig};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let _logging =
        init_logging(&TelemetryConfig::from_env()).context("Failed to initialize logging")?;

    let config = RuntimeConfig::from_env().context("Failed to load runtime configuration")?;
    info!(config = ?config, "Configuration loaded");

    let pipeline = Arc::new(Pipeline::new(config).context("Failed to build pipeline")?);
    let mut run = tokio::spawn(Arc::clone(&pipeline).run());

    let summary = tokio::select! {
        joined = &mut run => joined.context("Pipeline task panicked")??,
        signal = tokio::signal::ctrl_c() => {
            signal.context("Failed to listen for Ctrl+C")?;
            warn!("Interrupted, waiting for in-flight deliveries");
            pipeline.shutdown();
            run.await.context("Pipeline task panicked")??
        }
    };

    println!(
        "{}",
        serde_json::to_string_pretty(&summary).context("Failed to render run summary")?
    );
    Ok(())
}
