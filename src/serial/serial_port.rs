use std::{
    io::{self, Read, Write},
    time::Duration,
};

use tracing::{debug, warn};

use crate::{
    error::Error,
    serial::{error::SerialPortError, SerialDevice, Transport},
};

/// The serial ports of the machine we run on.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemTransport;

fn try_open_serial_port(
    path: &str,
    baud: u32,
    read_timeout: Duration,
) -> Result<Box<dyn serialport::SerialPort>, Error> {
    serialport::new(path, baud)
        .data_bits(serialport::DataBits::Eight)
        .parity(serialport::Parity::None)
        .stop_bits(serialport::StopBits::One)
        .flow_control(serialport::FlowControl::None)
        .timeout(read_timeout)
        .open()
        .map_err(|e| Error::CouldNotOpen {
            path: path.into(),
            problem: e.to_string(),
        })
}

impl Transport for SystemTransport {
    fn available_ports(&self) -> Vec<String> {
        match serialport::available_ports() {
            Ok(ports) => {
                let ports = ports
                    .into_iter()
                    .map(|info| info.port_name)
                    .collect::<Vec<_>>();
                debug!(?ports, "Listed serial ports");
                ports
            }
            Err(e) => {
                warn!(?e, "Could not list serial ports");
                vec![]
            }
        }
    }

    fn open(
        &self,
        path: &str,
        baud: u32,
        read_timeout: Duration,
    ) -> Result<Box<dyn SerialDevice>, Error> {
        let port = try_open_serial_port(path, baud, read_timeout)?;

        Ok(Box::new(SystemSerialPort { port: Some(port) }))
    }
}

/// An opened operating system serial port.
/// Dropping the inner port releases it.
struct SystemSerialPort {
    port: Option<Box<dyn serialport::SerialPort>>,
}

impl SystemSerialPort {
    fn port(&mut self) -> Result<&mut Box<dyn serialport::SerialPort>, SerialPortError> {
        self.port.as_mut().ok_or(SerialPortError::Disconnected)
    }
}

impl SerialDevice for SystemSerialPort {
    fn write(&mut self, bytes: &[u8]) -> Result<(), SerialPortError> {
        let port = self.port()?;
        port.write_all(bytes)?;
        port.flush()?;

        Ok(())
    }

    fn bytes_waiting(&mut self) -> Result<usize, SerialPortError> {
        Ok(self.port()?.bytes_to_read()? as usize)
    }

    fn set_read_timeout(&mut self, timeout: Duration) -> Result<(), SerialPortError> {
        Ok(self.port()?.set_timeout(timeout)?)
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, SerialPortError> {
        match self.port()?.read(buf) {
            Ok(read) => Ok(read),
            Err(e) if e.kind() == io::ErrorKind::TimedOut => Ok(0),
            Err(e) => Err(e.into()),
        }
    }

    fn close(&mut self) {
        self.port = None;
    }
}
