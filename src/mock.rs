//! A mock, useful to test serial port functionality without the actual serial ports.
//!
//! Every device opened through a [`MockTransport`] shares one [`MockHandle`],
//! which lets tests inject incoming bytes, inspect what was written,
//! and make the next open or read fail.

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use tracing::{debug, info};

use crate::{
    error::Error,
    serial::{error::SerialPortError, SerialDevice, Transport},
};

#[derive(Debug, Default)]
struct MockState {
    ports: Vec<String>,
    incoming: VecDeque<u8>,
    written: Vec<u8>,
    loopback: bool,
    times_opened: usize,
    times_closed: usize,
    fail_next_open: Option<String>,
    fail_next_read: Option<String>,
}

/// Inspects and steers mocked serial ports.
#[derive(Debug, Clone, Default)]
pub struct MockHandle {
    state: Arc<Mutex<MockState>>,
}

impl MockHandle {
    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make bytes available for reading, as if the device sent them.
    pub fn inject<B: AsRef<[u8]>>(&self, bytes: B) {
        self.state().incoming.extend(bytes.as_ref());
    }

    /// Everything written to the device so far.
    pub fn written(&self) -> Vec<u8> {
        self.state().written.clone()
    }

    /// Replace the ports the transport reports.
    pub fn set_ports<S: AsRef<str>>(&self, ports: &[S]) {
        self.state().ports = ports.iter().map(|port| port.as_ref().to_owned()).collect();
    }

    /// The next open attempt fails with this problem.
    pub fn fail_next_open(&self, problem: &str) {
        self.state().fail_next_open = Some(problem.into());
    }

    /// The next read fails with this problem.
    pub fn fail_next_read(&self, problem: &str) {
        self.state().fail_next_read = Some(problem.into());
    }

    /// How many times a device was successfully opened.
    pub fn times_opened(&self) -> usize {
        self.state().times_opened
    }

    /// How many times a device was closed.
    pub fn times_closed(&self) -> usize {
        self.state().times_closed
    }
}

/// A [`Transport`] whose ports only exist in memory.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    handle: MockHandle,
}

impl MockTransport {
    /// A transport reporting the given ports.
    pub fn new<I, S>(ports: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let transport = Self::default();
        transport.handle.state().ports = ports.into_iter().map(Into::into).collect();
        transport
    }

    /// A transport where every written message comes back as a received line.
    pub fn loopback<I, S>(ports: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let transport = Self::new(ports);
        transport.handle.state().loopback = true;
        transport
    }

    /// The handle shared by all devices this transport opens.
    pub fn handle(&self) -> MockHandle {
        self.handle.clone()
    }
}

impl Transport for MockTransport {
    fn available_ports(&self) -> Vec<String> {
        self.handle.state().ports.clone()
    }

    fn open(
        &self,
        path: &str,
        baud: u32,
        _read_timeout: Duration,
    ) -> Result<Box<dyn SerialDevice>, Error> {
        let mut state = self.handle.state();

        if let Some(problem) = state.fail_next_open.take() {
            return Err(Error::CouldNotOpen {
                path: path.into(),
                problem,
            });
        }

        if !state.ports.iter().any(|port| port == path) {
            return Err(Error::CouldNotOpen {
                path: path.into(),
                problem: "No such mocked port".into(),
            });
        }

        info!(%path, %baud, "Opening mock");
        state.times_opened += 1;

        Ok(Box::new(MockDevice {
            handle: self.handle.clone(),
            open: true,
        }))
    }
}

struct MockDevice {
    handle: MockHandle,
    open: bool,
}

impl SerialDevice for MockDevice {
    fn write(&mut self, bytes: &[u8]) -> Result<(), SerialPortError> {
        if !self.open {
            return Err(SerialPortError::Disconnected);
        }

        let mut state = self.handle.state();
        state.written.extend_from_slice(bytes);

        // Emulates a device echoing each message back as a line.
        if state.loopback {
            debug!("Looping back {} byte(s)", bytes.len());
            state.incoming.extend(bytes);
            state.incoming.extend(b"\r\n");
        }

        Ok(())
    }

    fn bytes_waiting(&mut self) -> Result<usize, SerialPortError> {
        Ok(self.handle.state().incoming.len())
    }

    // Mocked reads never block, there is nothing to bound.
    fn set_read_timeout(&mut self, _timeout: Duration) -> Result<(), SerialPortError> {
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, SerialPortError> {
        let mut state = self.handle.state();

        if let Some(problem) = state.fail_next_read.take() {
            return Err(SerialPortError::IO(std::io::Error::new(
                std::io::ErrorKind::Other,
                problem,
            )));
        }

        let amount = buf.len().min(state.incoming.len());
        for (slot, byte) in buf.iter_mut().zip(state.incoming.drain(..amount)) {
            *slot = byte;
        }

        Ok(amount)
    }

    fn close(&mut self) {
        if self.open {
            self.open = false;
            self.handle.state().times_closed += 1;
        }
    }
}
