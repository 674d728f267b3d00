//! Everything the terminal window does, without the window.
//!
//! The [`Controller`] owns at most one [`Connection`] and the [`PollTimer`] that reads from it.
//! Each public operation corresponds to a user action or a timer firing.
//! Failures never escape an operation: they end up as a [`Dialog`] or a log line.

use std::time::Duration;

use tracing::{debug, info, trace, warn};

use crate::{
    error::Error,
    serial::{connection::Connection, SerialMessage, Transport},
    terminal_log::{LogLine, TerminalLog},
};

/// How often the poll timer fires while connected.
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// The longest a single poll may block waiting for the rest of a line.
pub const READ_TIMEOUT: Duration = Duration::from_millis(100);

/// What the baud rate field holds initially.
pub const DEFAULT_BAUD: u32 = 9600;

/// A recurring trigger for reading incoming data.
///
/// Active exactly while a connection is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollTimer {
    interval: Duration,
    active: bool,
}

impl PollTimer {
    fn new(interval: Duration) -> Self {
        Self {
            interval,
            active: false,
        }
    }

    fn start(&mut self) {
        self.active = true;
    }

    fn stop(&mut self) {
        self.active = false;
    }

    /// Whether the timer is currently firing.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Time between firings.
    pub fn interval(&self) -> Duration {
        self.interval
    }
}

/// A message the user has to acknowledge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dialog {
    /// Connecting failed.
    /// Blocks the rest of the window until dismissed.
    ConnectionError(String),

    /// The user tried sending without being connected.
    Warning(String),
}

impl Dialog {
    /// Window title of the dialog.
    pub fn title(&self) -> &'static str {
        match self {
            Dialog::ConnectionError(_) => "Connection Error",
            Dialog::Warning(_) => "Warning",
        }
    }

    /// The text shown in the dialog.
    pub fn message(&self) -> &str {
        match self {
            Dialog::ConnectionError(message) | Dialog::Warning(message) => message,
        }
    }

    /// Whether other controls are unusable while this is shown.
    pub fn is_blocking(&self) -> bool {
        matches!(self, Dialog::ConnectionError(_))
    }
}

/// Parse user provided baud rate text.
pub fn parse_baud(text: &str) -> Result<u32, Error> {
    match text.trim().parse::<u32>() {
        Ok(baud) if baud > 0 => Ok(baud),
        _ => Err(Error::BadBaud(text.into())),
    }
}

/// The terminal window's state and behavior.
pub struct Controller {
    transport: Box<dyn Transport>,

    ports: Vec<String>,
    selected_port: Option<String>,
    baud_input: String,
    entry: String,

    connection: Option<Connection>,
    poll_timer: PollTimer,

    log: TerminalLog,
    dialog: Option<Dialog>,
}

impl std::fmt::Debug for Controller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Controller")
            .field("ports", &self.ports)
            .field("selected_port", &self.selected_port)
            .field("baud_input", &self.baud_input)
            .field("connection", &self.connection)
            .field("poll_timer", &self.poll_timer)
            .field("dialog", &self.dialog)
            .finish()
    }
}

impl Controller {
    /// Set up a disconnected controller and list the available ports.
    pub fn new(transport: Box<dyn Transport>) -> Self {
        let mut controller = Self {
            transport,
            ports: vec![],
            selected_port: None,
            baud_input: DEFAULT_BAUD.to_string(),
            entry: String::new(),
            connection: None,
            poll_timer: PollTimer::new(POLL_INTERVAL),
            log: TerminalLog::default(),
            dialog: None,
        };

        controller.refresh_ports();
        controller
    }

    /// Start out with this baud rate in the baud field.
    pub fn with_baud(mut self, baud: u32) -> Self {
        self.baud_input = baud.to_string();
        self
    }

    /// Select this port if it is currently listed.
    pub fn with_preferred_port(mut self, port: Option<&str>) -> Self {
        if let Some(port) = port {
            if self.ports.iter().any(|listed| listed == port) {
                self.selected_port = Some(port.to_owned());
            } else {
                debug!(%port, "Preferred port not available");
            }
        }
        self
    }

    /// Re-list the available ports.
    ///
    /// The selection is kept if that port is still there,
    /// otherwise the first port (if any) becomes selected.
    pub fn refresh_ports(&mut self) {
        self.ports = self.transport.available_ports();

        let still_listed = self
            .selected_port
            .as_ref()
            .map_or(false, |selected| self.ports.contains(selected));

        if !still_listed {
            self.selected_port = self.ports.first().cloned();
        }

        debug!(ports = ?self.ports, selected = ?self.selected_port, "Refreshed ports");
    }

    /// Connect if disconnected, disconnect if connected.
    pub fn toggle_connection(&mut self) {
        if self.is_connected() {
            self.disconnect();
            return;
        }

        match self.try_connect() {
            Ok(connection) => {
                self.log.push(LogLine::Connected {
                    port: connection.path().to_owned(),
                    baud: connection.baud(),
                });
                self.connection = Some(connection);
                self.poll_timer.start();
                self.dismiss_warning();
            }
            Err(e) => {
                warn!(%e, "Could not connect");
                self.dialog = Some(Dialog::ConnectionError(e.to_string()));
            }
        }
    }

    fn try_connect(&self) -> Result<Connection, Error> {
        let port = self.selected_port.as_deref().ok_or(Error::NoPortSelected)?;
        let baud = parse_baud(&self.baud_input)?;

        let device = self.transport.open(port, baud, READ_TIMEOUT)?;

        Ok(Connection::new(port, baud, READ_TIMEOUT, device))
    }

    fn disconnect(&mut self) {
        self.poll_timer.stop();

        if let Some(mut connection) = self.connection.take() {
            connection.close();
        }

        self.log.push(LogLine::Disconnected);
    }

    /// Write the entry text to the device.
    ///
    /// Shows a warning when not connected, and leaves the entry alone in that case.
    pub fn send(&mut self) {
        let Some(connection) = self.connection.as_mut().filter(|c| c.is_open()) else {
            self.dialog = Some(Dialog::Warning(Error::NotConnected.to_string()));
            return;
        };

        match connection.write(self.entry.as_bytes()).map_err(Error::from) {
            Ok(()) => {
                let text = std::mem::take(&mut self.entry);
                self.log.push(LogLine::Sent(text));
                self.dismiss_warning();
            }
            Err(e) => {
                warn!(?e, "Write failed");
                self.log.push(LogLine::WriteError(e.to_string()));
            }
        }
    }

    /// Handle one firing of the poll timer.
    ///
    /// Reads at most one line. Problems are logged and the connection stays open.
    pub fn poll_tick(&mut self) {
        if !self.poll_timer.is_active() {
            return;
        }

        let Some(connection) = self.connection.as_mut() else {
            return;
        };

        let chunk = connection
            .has_waiting()
            .and_then(|waiting| {
                if waiting {
                    connection.read_chunk()
                } else {
                    Ok(None)
                }
            })
            .map_err(Error::from);

        match chunk {
            Ok(Some(bytes)) => {
                let message = SerialMessage::new_dropping_invalid(bytes);
                let text = message.as_str().trim();

                if text.is_empty() {
                    trace!("Blank line from port");
                } else {
                    debug!(%message, "Line from port");
                    self.log.push(LogLine::Received(text.to_owned()));
                }
            }
            Ok(None) => {}
            Err(e) => {
                warn!(?e, "Read failed");
                self.log.push(LogLine::ReadError(e.to_string()));
            }
        }
    }

    /// The window is going away: release the port.
    /// Fine to call any number of times.
    pub fn close(&mut self) {
        self.poll_timer.stop();

        if let Some(mut connection) = self.connection.take() {
            info!("Closing port before exit");
            connection.close();
        }
    }

    /// Pick which port to connect to.
    pub fn select_port(&mut self, port: String) {
        self.selected_port = Some(port);
    }

    /// The baud rate text was edited.
    pub fn set_baud_input(&mut self, text: String) {
        self.baud_input = text;
    }

    /// The outgoing text was edited.
    pub fn set_entry(&mut self, text: String) {
        self.entry = text;
    }

    /// The user acknowledged the dialog.
    pub fn dismiss_dialog(&mut self) {
        self.dialog = None;
    }

    // A warning about not being connected is stale once something worked.
    fn dismiss_warning(&mut self) {
        if matches!(self.dialog, Some(Dialog::Warning(_))) {
            self.dialog = None;
        }
    }

    /// Ports as last listed.
    pub fn ports(&self) -> &[String] {
        &self.ports
    }

    /// The port to connect to.
    pub fn selected_port(&self) -> Option<&String> {
        self.selected_port.as_ref()
    }

    /// Current baud rate text.
    pub fn baud_input(&self) -> &str {
        &self.baud_input
    }

    /// Current outgoing text.
    pub fn entry(&self) -> &str {
        &self.entry
    }

    /// Whether a connection is open.
    pub fn is_connected(&self) -> bool {
        self.connection.as_ref().map_or(false, Connection::is_open)
    }

    /// The open connection, if any.
    pub fn connection(&self) -> Option<&Connection> {
        self.connection.as_ref()
    }

    /// The poll timer.
    pub fn poll_timer(&self) -> PollTimer {
        self.poll_timer
    }

    /// Label of the connect/disconnect button.
    pub fn connect_label(&self) -> &'static str {
        if self.is_connected() {
            "Disconnect"
        } else {
            "Connect"
        }
    }

    /// Everything shown in the terminal view.
    pub fn log(&self) -> &TerminalLog {
        &self.log
    }

    /// The dialog waiting to be acknowledged, if any.
    pub fn dialog(&self) -> Option<&Dialog> {
        self.dialog.as_ref()
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        self.close();
    }
}
