//! Foo Controller
//!
//! A level-triggered controller for the `Foo` custom resource. For every
//! Foo it converges two owned resources: a ConfigMap named
//! `configmap-<name>` rendered from `spec.name`, and a Deployment named
//! `deployment-<name>` serving that ConfigMap. Both carry an owner
//! reference back to the Foo, so deleting the Foo cascade-deletes them.

mod controller;
mod error;
mod reconciler;
mod store;
mod templates;
mod watcher;

#[cfg(test)]
mod test_utils;

use crate::controller::{Controller, ControllerConfig};
use crate::error::ControllerError;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

fn parse_env<T: FromStr>(key: &str, default: T) -> Result<T, ControllerError> {
    match env::var(key) {
        Ok(value) => value.parse().map_err(|_| {
            ControllerError::InvalidConfig(format!("{key} must be a number, got {value:?}"))
        }),
        Err(_) => Ok(default),
    }
}

#[tokio::main]
async fn main() -> Result<(), ControllerError> {
    tracing_subscriber::fmt::init();

    info!("Starting Foo Controller");

    // Load configuration from environment variables
    let namespace = env::var("WATCH_NAMESPACE").unwrap_or_else(|_| "default".to_string());
    let workers = parse_env("WORKER_COUNT", 2usize)?;
    let resync_seconds = parse_env("RESYNC_PERIOD_SECONDS", 30u64)?;
    let template_dir = env::var("TEMPLATE_DIR").unwrap_or_else(|_| "config".to_string());

    info!("Configuration:");
    info!("  Namespace: {}", namespace);
    info!("  Workers: {}", workers);
    info!("  Resync period: {}s", resync_seconds);
    info!("  Template dir: {}", template_dir);

    let controller = Controller::new(ControllerConfig {
        namespace,
        workers,
        resync_period: Duration::from_secs(resync_seconds),
        template_dir: PathBuf::from(template_dir),
    })
    .await?;
    controller.run().await?;

    Ok(())
}
