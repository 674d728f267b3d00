use std::fmt::Display;

/// One line of the terminal view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogLine {
    /// A connection was opened.
    Connected {
        /// The device path.
        port: String,

        /// The baud rate used.
        baud: u32,
    },

    /// The connection was closed by the user.
    Disconnected,

    /// Text written to the device.
    Sent(String),

    /// A line received from the device.
    Received(String),

    /// Reading from the device failed.
    ReadError(String),

    /// Writing to the device failed.
    WriteError(String),
}

impl Display for LogLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLine::Connected { port, baud } => write!(f, "Connected to {port} at {baud} baud."),
            LogLine::Disconnected => write!(f, "Disconnected."),
            LogLine::Sent(text) => write!(f, "> {text}"),
            LogLine::Received(text) => write!(f, "< {text}"),
            LogLine::ReadError(problem) => write!(f, "Read error: {problem}"),
            LogLine::WriteError(problem) => write!(f, "Write error: {problem}"),
        }
    }
}

/// Append-only list of [`LogLine`]s.
#[derive(Debug, Default, Clone)]
pub struct TerminalLog {
    lines: Vec<LogLine>,
}

impl TerminalLog {
    /// Add a line at the end.
    pub fn push(&mut self, line: LogLine) {
        self.lines.push(line);
    }

    /// The lines as they are displayed, oldest first.
    pub fn rendered(&self) -> impl Iterator<Item = String> + '_ {
        self.lines.iter().map(ToString::to_string)
    }

    /// Number of lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether nothing has been logged.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn lines_render_with_prefixes() {
        let mut log = TerminalLog::default();
        log.push(LogLine::Connected {
            port: "/dev/ttyACM0".into(),
            baud: 115_200,
        });
        log.push(LogLine::Sent("ping".into()));
        log.push(LogLine::Received("pong".into()));
        log.push(LogLine::ReadError("device went away".into()));
        log.push(LogLine::Disconnected);

        assert_eq!(
            log.rendered().collect::<Vec<_>>(),
            vec![
                "Connected to /dev/ttyACM0 at 115200 baud.",
                "> ping",
                "< pong",
                "Read error: device went away",
                "Disconnected.",
            ]
        );
    }
}
