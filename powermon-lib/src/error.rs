use crate::sensor::Sensor;
use std::io;
use std::time::Duration;
use thiserror::Error;

/// Reasons a response frame is rejected by the codec.
///
/// These indicate a device/protocol mismatch and are reported verbatim; the
/// codec never corrects a frame.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("Invalid response type: expected {expected:#04x}, got {actual:#04x}")]
    UnexpectedResponseType { expected: u8, actual: u8 },

    #[error("Invalid checksum: expected {expected:#04x}, got {actual:#04x}")]
    ChecksumMismatch { expected: u8, actual: u8 },

    #[error("{sensor}: byte {index} must be zero, got {value:#04x}")]
    MalformedField { sensor: Sensor, index: usize, value: u8 },

    #[error("Invalid length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("Unknown sensor code {0}")]
    UnknownSensor(u8),
}

/// The primary error type for the `powermon-lib` library.
#[derive(Error, Debug)]
pub enum PowermonError {
    #[error("Serial port error: {0}")]
    Serial(#[from] tokio_serial::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to send request: wrote {actual} of {expected} bytes")]
    ShortWrite { expected: usize, actual: usize },

    #[error("Failed to read response: got {actual} of {expected} bytes")]
    ShortRead { expected: usize, actual: usize },

    #[error("Timeout while reading: no response within {0:?}")]
    Timeout(Duration),

    #[error("Timeout while sending request: channel not writable within {0:?}")]
    WriteTimeout(Duration),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Unknown mode {0}")]
    UnknownMode(String),
}

impl PowermonError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, PowermonError::Timeout(_) | PowermonError::WriteTimeout(_))
    }

    pub fn is_protocol(&self) -> bool {
        matches!(self, PowermonError::Protocol(_))
    }

    /// The codec failure behind this error, if any
    pub fn protocol(&self) -> Option<&ProtocolError> {
        match self {
            PowermonError::Protocol(e) => Some(e),
            _ => None,
        }
    }
}
