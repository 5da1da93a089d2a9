//! Configuration for the rover bridge
//!
//! Loads configuration from a TOML file with the parameters needed to reach
//! the robot and pace the background tasks.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Top-level application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    pub robot: RobotConfig,
    pub logging: LoggingConfig,
}

/// Robot link configuration (ports and timing)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RobotConfig {
    /// TCP port for outbound commands and inbound telemetry lines
    pub command_port: u16,
    /// TCP port for the length-prefixed video stream
    pub video_port: u16,
    /// Connect timeout applied to both transports, in milliseconds
    ///
    /// Independent from the read timeouts: establishing the connection and
    /// waiting for data on it are separately bounded.
    pub connect_timeout_ms: u64,
    /// Read timeout on the command transport, in milliseconds
    pub command_read_timeout_ms: u64,
    /// Read timeout on the video transport, in milliseconds
    pub video_read_timeout_ms: u64,
    /// Seconds between battery status polls
    pub power_poll_interval_secs: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl RobotConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn command_read_timeout(&self) -> Duration {
        Duration::from_millis(self.command_read_timeout_ms)
    }

    pub fn video_read_timeout(&self) -> Duration {
        Duration::from_millis(self.video_read_timeout_ms)
    }

    pub fn power_poll_interval(&self) -> Duration {
        Duration::from_secs(self.power_poll_interval_secs)
    }
}

impl AppConfig {
    /// Load configuration from TOML file
    ///
    /// # Arguments
    /// - `path`: Path to TOML configuration file
    ///
    /// # Returns
    /// Parsed configuration or error
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Default configuration for the Freenove 4WD rover
    ///
    /// Command port 5000, video port 8000, and the per-transport timeouts the
    /// device firmware is known to tolerate. Production deployments should use
    /// a proper TOML configuration file.
    pub fn freenove_defaults() -> Self {
        Self {
            robot: RobotConfig {
                command_port: crate::protocol::COMMAND_PORT,
                video_port: crate::protocol::VIDEO_PORT,
                connect_timeout_ms: 2000,
                command_read_timeout_ms: 2000,
                video_read_timeout_ms: 3000,
                power_poll_interval_secs: 60,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::freenove_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::freenove_defaults();
        assert_eq!(config.robot.command_port, 5000);
        assert_eq!(config.robot.video_port, 8000);
        assert_eq!(config.robot.connect_timeout_ms, 2000);
        assert_eq!(config.robot.command_read_timeout_ms, 2000);
        assert_eq!(config.robot.video_read_timeout_ms, 3000);
        assert_eq!(config.robot.power_poll_interval_secs, 60);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_duration_accessors() {
        let config = AppConfig::freenove_defaults();
        assert_eq!(config.robot.connect_timeout(), Duration::from_secs(2));
        assert_eq!(config.robot.video_read_timeout(), Duration::from_millis(3000));
        assert_eq!(config.robot.power_poll_interval(), Duration::from_secs(60));
    }

    #[test]
    fn test_toml_serialization() {
        let config = AppConfig::freenove_defaults();
        let toml_string = toml::to_string_pretty(&config).unwrap();

        // Should contain all sections
        assert!(toml_string.contains("[robot]"));
        assert!(toml_string.contains("[logging]"));

        // Should contain key values
        assert!(toml_string.contains("command_port = 5000"));
        assert!(toml_string.contains("video_port = 8000"));
    }

    #[test]
    fn test_toml_deserialization() {
        let toml_content = r#"
[robot]
command_port = 6000
video_port = 9000
connect_timeout_ms = 500
command_read_timeout_ms = 250
video_read_timeout_ms = 750
power_poll_interval_secs = 30

[logging]
level = "debug"
"#;

        let config: AppConfig = toml::from_str(toml_content).unwrap();
        assert_eq!(config.robot.command_port, 6000);
        assert_eq!(config.robot.video_port, 9000);
        assert_eq!(config.robot.command_read_timeout_ms, 250);
        assert_eq!(config.robot.power_poll_interval_secs, 30);
        assert_eq!(config.logging.level, "debug");
    }
}
