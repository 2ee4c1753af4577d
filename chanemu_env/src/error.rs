//! Error types for the chanemu emulator.

use crate::types::PortId;
use thiserror::Error;

/// Result alias used across the emulator.
pub type EmuResult<T> = Result<T, EmuError>;

/// Errors that can occur while addressing the emulated medium.
///
/// Stream I/O itself never fails, times out or short-transfers; the only
/// runtime error is addressing something that was never registered.
#[derive(Debug, Error)]
pub enum EmuError {
    /// Port was never registered with the shared medium
    #[error("Invalid port {port}: medium has {count} ports")]
    InvalidPort { port: PortId, count: usize },
    
    /// Logical channel index outside a radio's channel range
    #[error("Invalid channel {channel}: device has {count} channels")]
    InvalidChannel { channel: usize, count: usize },
    
    /// Configuration could not be interpreted
    #[error("Configuration error: {0}")]
    Config(String),
    
    /// Configuration file could not be read
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    
    /// Configuration file is not valid JSON for the expected shape
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EmuError {
    /// Creates an invalid-port error.
    pub fn invalid_port(port: PortId, count: usize) -> Self {
        Self::InvalidPort { port, count }
    }
    
    /// Creates a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
