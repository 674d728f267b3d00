use std::{fmt::Display, time::Duration};

use crate::error::Error;

/// Serial port related errors.
pub mod error;

/// The serial port driver backed by the operating system.
pub mod serial_port;

/// Codecs for encoding/decoding messages to/from wire.
pub mod codecs;

/// An open connection and the chunking of its input.
pub mod connection;

use error::SerialPortError;

/// The message data type used for serial bytes.
pub type SerialMessageBytes = Vec<u8>;

/// Lists and opens serial ports.
pub trait Transport: Send {
    /// The identifiers of the serial ports currently visible, in enumeration order.
    ///
    /// Problems listing ports result in an empty list.
    fn available_ports(&self) -> Vec<String>;

    /// Open the port at `path`.
    ///
    /// Reads on the returned device block for at most `read_timeout`.
    fn open(
        &self,
        path: &str,
        baud: u32,
        read_timeout: Duration,
    ) -> Result<Box<dyn SerialDevice>, Error>;
}

/// A handle to an opened serial port.
pub trait SerialDevice: Send {
    /// Put all the bytes on the wire.
    fn write(&mut self, bytes: &[u8]) -> Result<(), SerialPortError>;

    /// How many received bytes are waiting to be read.
    fn bytes_waiting(&mut self) -> Result<usize, SerialPortError>;

    /// Change how long a single [`SerialDevice::read`] may block.
    fn set_read_timeout(&mut self, timeout: Duration) -> Result<(), SerialPortError>;

    /// Read into `buf`, blocking until something arrives or the read timeout passes.
    ///
    /// A timeout is not an error, it reads zero bytes.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, SerialPortError>;

    /// Release the port.
    /// Calling this more than once does nothing.
    fn close(&mut self);
}

/// The message data type used for serial.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct SerialMessage(String);

impl SerialMessage {
    /// Create a serial message from bytes, dropping any bad utf8 bytes altogether.
    pub fn new_dropping_invalid<B: AsRef<[u8]>>(bytes: B) -> Self {
        let message = bytes
            .as_ref()
            .utf8_chunks()
            .map(|chunk| chunk.valid())
            .collect::<String>();

        Self(message)
    }

    /// Borrowed form.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for SerialMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.trim())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_utf8_is_dropped() {
        let message = SerialMessage::new_dropping_invalid(b"po\xffng\xfe");
        assert_eq!(message.as_str(), "pong");
    }

    #[test]
    fn display_trims() {
        let message = SerialMessage::new_dropping_invalid("  hello\r\n");
        assert_eq!(message.to_string(), "hello");
    }

    #[test]
    fn multibyte_survives() {
        let message = SerialMessage::new_dropping_invalid("æøå µs".as_bytes());
        assert_eq!(message.as_str(), "æøå µs");
    }
}
