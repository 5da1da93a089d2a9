//! RoverBridge - bridge daemon for a TCP-connected wheeled robot
//!
//! Owns the command/telemetry and video connections to the robot, keeps a
//! shared state snapshot current, and polls battery status in the background.
//!
//! Usage: `rover-bridge <robot-host> [--config <path>]`

use rover_bridge::{AppConfig, Error, RobotBridge, Result};
use std::env;
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Default config path when none is given on the command line
const DEFAULT_CONFIG_PATH: &str = "/etc/rover-bridge.toml";

/// Parse the robot host and optional config path from the command line.
///
/// Supports:
/// - `rover-bridge <host>` (positional)
/// - `rover-bridge <host> --config <path>` (flag-based)
/// - `rover-bridge <host> -c <path>` (short flag)
fn parse_args() -> (Option<String>, Option<String>) {
    let args: Vec<String> = env::args().collect();
    let mut host = None;
    let mut config_path = None;

    let mut i = 1;
    while i < args.len() {
        if (args[i] == "--config" || args[i] == "-c") && i + 1 < args.len() {
            config_path = Some(args[i + 1].clone());
            i += 2;
            continue;
        }
        if host.is_none() && !args[i].starts_with('-') {
            host = Some(args[i].clone());
        }
        i += 1;
    }

    (host, config_path)
}

fn main() -> Result<()> {
    let (host, config_path) = parse_args();
    let Some(host) = host else {
        eprintln!("Usage: rover-bridge <robot-host> [--config <path>]");
        process::exit(2);
    };

    // An explicit config path must load; the default path may fall back to
    // built-in defaults.
    let config = match config_path {
        Some(path) => AppConfig::from_file(&path)?,
        None => AppConfig::from_file(DEFAULT_CONFIG_PATH).unwrap_or_default(),
    };

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.logging.level.as_str()),
    )
    .init();

    log::info!("RoverBridge starting (robot host {})", host);

    let bridge = RobotBridge::new(config);

    // Set up shutdown signal handler
    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);
    ctrlc::set_handler(move || {
        log::info!("Received shutdown signal");
        r.store(false, Ordering::Relaxed);
    })
    .map_err(|e| Error::Other(format!("Error setting Ctrl-C handler: {}", e)))?;

    bridge.connect(&host)?;
    log::info!("Bridge running. Press Ctrl-C to stop.");

    // Main loop - keep alive while the link is up, logging a state summary
    // every 10 seconds
    let mut last_stats = Instant::now();
    while running.load(Ordering::Relaxed) {
        thread::sleep(Duration::from_millis(100));

        let state = bridge.state();
        if !state.connected {
            log::warn!("Robot link lost");
            break;
        }

        if last_stats.elapsed().as_secs() >= 10 {
            log::info!(
                "State: power={:?}% sonic={:?}cm light=({:?},{:?}) last_status={:?}",
                state.power_percent,
                state.ultrasonic_cm,
                state.light_left_v,
                state.light_right_v,
                state.last_status
            );
            last_stats = Instant::now();
        }
    }

    bridge.disconnect();
    log::info!("RoverBridge stopped");
    Ok(())
}
