use thiserror::Error;

/// Result type alias for wireless lookups.
pub type Result<T> = std::result::Result<T, WirelessError>;

/// Error type for wireless lookups.
#[derive(Error, Debug)]
pub enum WirelessError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{command} failed: {detail}")]
    Command { command: String, detail: String },

    #[error("no wireless interface found under /sys/class/net")]
    NoInterface,
}
