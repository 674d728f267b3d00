use std::io;

use thiserror::Error;

/// Problems with an open serial port.
#[derive(Debug, Error)]
pub enum SerialPortError {
    /// IO related errors.
    #[error("{0}")]
    IO(#[from] io::Error),

    /// Errors reported by the serial port driver.
    #[error("{0}")]
    Driver(#[from] serialport::Error),

    /// Serial port disconnected.
    #[error("Serial port disconnected")]
    Disconnected,
}
