//! SonarPilot - obstacle-avoidance controller
//!
//! Runs the boot sequence and then the control loop until Ctrl-C.

use sonar_pilot::devices::create_device;
use sonar_pilot::{Error, Pilot, Result, RoverConfig};
use std::env;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

const DEFAULT_CONFIG: &str = "rover.toml";

/// Parse config path from command line arguments.
///
/// Supports:
/// - `sonar-pilot <path>` (positional)
/// - `sonar-pilot --config <path>` (flag-based)
/// - `sonar-pilot -c <path>` (short flag)
fn parse_config_path() -> Option<String> {
    let args: Vec<String> = env::args().collect();

    for i in 1..args.len() {
        if (args[i] == "--config" || args[i] == "-c") && i + 1 < args.len() {
            return Some(args[i + 1].clone());
        }
    }

    if args.len() > 1 && !args[1].starts_with('-') {
        return Some(args[1].clone());
    }

    None
}

fn main() -> Result<()> {
    // Explicit path must exist; the default file is optional
    let (config, source) = match parse_config_path() {
        Some(path) => (RoverConfig::load(Path::new(&path))?, path),
        None if Path::new(DEFAULT_CONFIG).exists() => (
            RoverConfig::load(Path::new(DEFAULT_CONFIG))?,
            DEFAULT_CONFIG.to_string(),
        ),
        None => (RoverConfig::default(), "built-in defaults".to_string()),
    };

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.logging.level.as_str()),
    )
    .init();

    log::info!("SonarPilot v{} starting...", env!("CARGO_PKG_VERSION"));
    log::info!("Using config: {}", source);
    log::info!(
        "Device: {} ({})",
        config.device.name,
        config.device.device_type
    );

    let hardware = create_device(&config.device)?;
    let mut pilot = Pilot::new(&config, hardware);

    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);
    ctrlc::set_handler(move || {
        log::info!("Received shutdown signal");
        r.store(false, Ordering::Relaxed);
    })
    .map_err(|e| Error::Other(format!("Error setting Ctrl-C handler: {}", e)))?;

    pilot.boot();
    log::info!("SonarPilot running. Press Ctrl-C to stop.");

    let cycles = pilot.run(&running)?;

    log::info!("SonarPilot stopped after {} cycles", cycles);
    Ok(())
}
