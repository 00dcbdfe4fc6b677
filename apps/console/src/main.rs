//! TerraSense parameter console driver.
//!
//! Replays a JSON scenario against the parameter-editing engine and prints the
//! field states, reconciliation preview and navigation outcome it produces.

#![forbid(unsafe_code)]

mod config;
mod dto;
mod scenario;

use std::env;

use terrasense_core::AppError;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::ConsoleConfig;
use crate::scenario::Scenario;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ConsoleConfig::load(env::args().nth(1))?;
    let raw = tokio::fs::read_to_string(&config.scenario_path)
        .await
        .map_err(|error| {
            AppError::NotFound(format!(
                "failed to read scenario '{}': {error}",
                config.scenario_path.display()
            ))
        })?;
    let scenario: Scenario = serde_json::from_str(&raw)
        .map_err(|error| AppError::Validation(format!("invalid scenario file: {error}")))?;

    info!(
        scenario_path = %config.scenario_path.display(),
        actor_id = config.actor_id,
        apply = config.apply,
        entity_type = %scenario.entity_type,
        "running console scenario"
    );

    let report = scenario::run(&config, scenario).await?;
    let rendered = serde_json::to_string_pretty(&report)
        .map_err(|error| AppError::Internal(format!("failed to render report: {error}")))?;
    println!("{rendered}");

    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}
