use std::time::{Duration, Instant};

use bytes::BytesMut;
use tokio_util::codec::Decoder;
use tracing::{debug, info, trace};

use crate::serial::{
    codecs::lines::LinesCodec, error::SerialPortError, SerialDevice, SerialMessageBytes,
};

/// How many bytes we ask the device for per read call.
const READ_CHUNK_SIZE: usize = 256;

/// An open serial port session.
///
/// Incoming bytes are accumulated and handed out one newline delimited chunk at a time.
/// Anything after the first newline stays buffered for the next call.
pub struct Connection {
    path: String,
    baud: u32,
    open: bool,
    read_timeout: Duration,
    device: Box<dyn SerialDevice>,
    codec: LinesCodec,
    buffer: BytesMut,
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("path", &self.path)
            .field("baud", &self.baud)
            .field("open", &self.open)
            .field("buffered", &self.buffer.len())
            .finish()
    }
}

impl Connection {
    /// Wrap an opened device.
    pub fn new(path: &str, baud: u32, read_timeout: Duration, device: Box<dyn SerialDevice>) -> Self {
        info!(%path, %baud, "Serial port opened");

        Self {
            path: path.into(),
            baud,
            open: true,
            read_timeout,
            device,
            codec: LinesCodec::default(),
            buffer: BytesMut::new(),
        }
    }

    /// The device path this connection was opened with.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The baud rate this connection was opened with.
    pub fn baud(&self) -> u32 {
        self.baud
    }

    /// Whether the connection has not been closed yet.
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Write the bytes as-is, no line ending is added.
    pub fn write(&mut self, bytes: &[u8]) -> Result<(), SerialPortError> {
        if !self.open {
            return Err(SerialPortError::Disconnected);
        }

        debug!(path = %self.path, bytes = bytes.len(), "Writing");
        self.device.write(bytes)
    }

    /// Whether there are received bytes not yet handed out.
    pub fn has_waiting(&mut self) -> Result<bool, SerialPortError> {
        if !self.open {
            return Ok(false);
        }

        if !self.buffer.is_empty() {
            return Ok(true);
        }

        Ok(self.device.bytes_waiting()? > 0)
    }

    /// Read one newline terminated chunk (the newline is not included).
    ///
    /// Reads until a newline shows up or the read timeout passes.
    /// The timeout bounds the whole call, not each device read.
    /// On timeout whatever arrived so far is returned, which may be nothing.
    pub fn read_chunk(&mut self) -> Result<Option<SerialMessageBytes>, SerialPortError> {
        if !self.open {
            return Err(SerialPortError::Disconnected);
        }

        if let Some(line) = self.codec.decode(&mut self.buffer)? {
            return Ok(Some(line));
        }

        let deadline = Instant::now() + self.read_timeout;
        let mut scratch = [0u8; READ_CHUNK_SIZE];

        loop {
            let now = Instant::now();
            if now >= deadline {
                break;
            }

            self.device.set_read_timeout(deadline - now)?;

            let read = self.device.read(&mut scratch)?;
            trace!(%read, "Read from device");

            if read == 0 {
                break;
            }

            self.buffer.extend_from_slice(&scratch[..read]);

            if let Some(line) = self.codec.decode(&mut self.buffer)? {
                return Ok(Some(line));
            }
        }

        self.codec.decode_eof(&mut self.buffer)
    }

    /// Close the underlying device.
    /// Closing an already closed connection does nothing.
    pub fn close(&mut self) {
        if !self.open {
            return;
        }

        info!(path = %self.path, "Serial port closed");

        self.device.close();
        self.buffer.clear();
        self.open = false;
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::mock::MockTransport;
    use crate::serial::Transport;

    /// A device producing one byte every `every`, never a newline.
    /// Reads honor the read timeout like an OS serial port does.
    struct TricklingDevice {
        every: Duration,
        next_byte_at: Instant,
        timeout: Duration,
    }

    impl TricklingDevice {
        fn new(every: Duration) -> Self {
            Self {
                every,
                next_byte_at: Instant::now() + every,
                timeout: Duration::from_secs(1),
            }
        }
    }

    impl SerialDevice for TricklingDevice {
        fn write(&mut self, _bytes: &[u8]) -> Result<(), SerialPortError> {
            Ok(())
        }

        fn bytes_waiting(&mut self) -> Result<usize, SerialPortError> {
            Ok(1)
        }

        fn set_read_timeout(&mut self, timeout: Duration) -> Result<(), SerialPortError> {
            self.timeout = timeout;
            Ok(())
        }

        fn read(&mut self, buf: &mut [u8]) -> Result<usize, SerialPortError> {
            let now = Instant::now();
            let gives_up_at = now + self.timeout;

            if self.next_byte_at <= gives_up_at {
                std::thread::sleep(self.next_byte_at.saturating_duration_since(now));
                self.next_byte_at += self.every;
                buf[0] = b'x';
                Ok(1)
            } else {
                std::thread::sleep(self.timeout);
                Ok(0)
            }
        }

        fn close(&mut self) {}
    }

    fn connection(transport: &MockTransport) -> Connection {
        let device = transport
            .open("mock-0", 9600, Duration::from_millis(100))
            .unwrap();

        Connection::new("mock-0", 9600, Duration::from_millis(100), device)
    }

    #[test]
    fn chunks_are_handed_out_one_at_a_time() {
        let transport = MockTransport::new(["mock-0"]);
        let mut connection = connection(&transport);

        transport.handle().inject(b"one\ntwo\n");

        assert!(connection.has_waiting().unwrap());
        assert_eq!(connection.read_chunk().unwrap(), Some(b"one".to_vec()));
        assert!(connection.has_waiting().unwrap());
        assert_eq!(connection.read_chunk().unwrap(), Some(b"two".to_vec()));
        assert!(!connection.has_waiting().unwrap());
    }

    #[test]
    fn partial_line_on_timeout() {
        let transport = MockTransport::new(["mock-0"]);
        let mut connection = connection(&transport);

        transport.handle().inject(b"no newline");

        assert_eq!(
            connection.read_chunk().unwrap(),
            Some(b"no newline".to_vec())
        );
        assert_eq!(connection.read_chunk().unwrap(), None);
    }

    #[test]
    fn slow_device_cannot_stretch_a_read_past_the_timeout() {
        let read_timeout = Duration::from_millis(100);
        let mut connection = Connection::new(
            "trickle",
            9600,
            read_timeout,
            Box::new(TricklingDevice::new(Duration::from_millis(90))),
        );

        let started = Instant::now();
        let chunk = connection.read_chunk().unwrap();
        let took = started.elapsed();

        assert_eq!(chunk, Some(b"x".to_vec()));
        assert!(
            took <= read_timeout + Duration::from_millis(40),
            "read_chunk took {took:?}"
        );
    }

    #[test]
    fn write_is_verbatim() {
        let transport = MockTransport::new(["mock-0"]);
        let mut connection = connection(&transport);

        connection.write(b"ping").unwrap();

        assert_eq!(transport.handle().written(), b"ping".to_vec());
    }

    #[test]
    fn closing_twice_closes_once() {
        let transport = MockTransport::new(["mock-0"]);
        let mut connection = connection(&transport);

        connection.close();
        connection.close();
        drop(connection);

        assert_eq!(transport.handle().times_closed(), 1);
    }

    #[test]
    fn closed_connection_refuses_io() {
        let transport = MockTransport::new(["mock-0"]);
        let mut connection = connection(&transport);
        connection.close();

        assert!(!connection.is_open());
        assert!(!connection.has_waiting().unwrap());
        assert!(matches!(
            connection.write(b"x"),
            Err(SerialPortError::Disconnected)
        ));
    }
}
