//! RoverBridge - control and video link to a TCP-connected wheeled robot
//!
//! The bridge owns two long-lived TCP connections (newline-delimited commands
//! and telemetry on one, length-prefixed JPEG frames on the other), runs a
//! reader thread per connection plus a periodic battery poller, and folds
//! everything into one mutex-guarded state record for external consumers.

pub mod bridge;
pub mod config;
pub mod error;
pub mod protocol;
pub mod state;

// Re-export commonly used types
pub use bridge::RobotBridge;
pub use config::AppConfig;
pub use error::{Error, Result};
pub use state::StateSnapshot;
