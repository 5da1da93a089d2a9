//! Error types for the rover bridge

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Rover bridge error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A transport failed to open during connect
    #[error("connection failed: {0}")]
    Connection(#[source] std::io::Error),

    /// Send attempted with no active connection
    #[error("not connected")]
    NotConnected,

    /// I/O error on an established transport
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file error
    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}
