use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::serial::error::SerialPortError;

/// Errors thay may occur in this library.
///
/// The display text of an error is what the user gets to see,
/// so keep it readable.
#[derive(Debug, Error, Serialize, Deserialize, PartialEq, Eq, Clone)]
pub enum Error {
    /// The baud rate text is not a positive integer.
    #[error("Invalid baud rate `{0}`: expected a positive integer")]
    BadBaud(String),

    /// Tried connecting without any port to connect to.
    #[error("No serial port selected")]
    NoPortSelected,

    /// The serial port could not be opened.
    #[error("Could not open port at {path}, problem: {problem}")]
    CouldNotOpen {
        /// The port we tried opening.
        path: String,

        /// What went wrong.
        problem: String,
    },

    /// Tried to use the serial port without being connected.
    #[error("Serial port not connected.")]
    NotConnected,

    /// Problems talking to an open port.
    #[error("{0}")]
    Io(String),

    /// The configuration was not valid.
    #[error("Bad config: {0}")]
    BadConfig(String),
}

impl Error {
    /// Get the problem description if this is a [`Error::BadConfig`].
    pub fn try_into_bad_config(self) -> Option<String> {
        if let Self::BadConfig(problem) = self {
            Some(problem)
        } else {
            None
        }
    }
}

impl From<SerialPortError> for Error {
    fn from(error: SerialPortError) -> Self {
        Self::Io(error.to_string())
    }
}
