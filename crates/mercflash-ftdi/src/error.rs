//! Error types for the FTDI bit-bang transport

use thiserror::Error;

/// FTDI transport specific errors
#[derive(Debug, Error)]
pub enum FtdiError {
    /// Failed to find or open the device
    #[error("Failed to open FTDI device {vid:04X}:{pid:04X}: {reason}")]
    OpenFailed {
        vid: u16,
        pid: u16,
        reason: String,
    },

    /// Failed to configure the device
    #[error("Failed to configure device: {0}")]
    ConfigFailed(String),

    /// USB transfer failed
    #[error("USB transfer failed: {0}")]
    TransferFailed(String),

    /// The device found is not the requested board
    #[error("Found FTDI device '{found}' (serial {serial}), expected '{expected}'")]
    WrongDevice {
        expected: String,
        found: String,
        serial: String,
    },

    /// Reading the device strings from the EEPROM failed
    #[error("Failed to read device strings: libftdi returned {0}")]
    EepromFailed(i32),

    /// Pin sampling failed
    #[error("Failed to read pins: libftdi returned {0}")]
    ReadPinsFailed(i32),

    /// Invalid channel/port name
    #[error("Invalid channel '{0}': must be A, B, C, or D")]
    InvalidChannel(String),

    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Result type for FTDI operations
pub type Result<T> = std::result::Result<T, FtdiError>;
