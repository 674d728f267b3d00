use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::Level;

use crate::{
    config::Config,
    error::Error,
    mock::MockTransport,
    serial::{serial_port::SystemTransport, Transport},
};

/// The name of the port the `--mock` transport offers.
pub const MOCK_PORT: &str = "mock-loopback";

/// The command line interface for keel term.
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Path to a configuration file
    pub config: Option<PathBuf>,

    /// Baud rate to start out with (overrides the configuration file)
    #[arg(long)]
    pub baud: Option<u32>,

    /// Port to select at startup if present (overrides the configuration file)
    #[arg(long)]
    pub port: Option<String>,

    /// Use an in-memory loopback port instead of real serial ports
    #[arg(long)]
    pub mock: bool,

    /// Log level for stdout
    #[arg(long, default_value_t = Level::INFO)]
    pub log_level: Level,

    /// Also log (at debug level) to daily rotated files in this directory
    #[arg(long)]
    pub log_dir: Option<PathBuf>,

    /// Subcommands
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Commands available in the command line interface.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Examples for user convenience.
    #[clap(subcommand)]
    Examples(Examples),

    /// List the serial ports currently available, one per line.
    Ports,
}

/// Helpful examples for users.
#[derive(Subcommand, Clone, Debug)]
pub enum Examples {
    /// Show an example of a configuration file's contents.
    Config,
}

impl Cli {
    /// The configuration file (or defaults) with command line overrides applied.
    pub fn resolve_config(&self) -> Result<Config, Error> {
        let mut config = match &self.config {
            Some(path) => Config::new_from_path(path)?,
            None => Config::default(),
        };

        if let Some(baud) = self.baud {
            config.baud = baud;
        }

        if let Some(port) = &self.port {
            config.port = Some(port.clone());
        }

        config.mock |= self.mock;
        config.validate()?;

        Ok(config)
    }
}

/// The transport to use given whether mocking was asked for.
pub fn transport(mock: bool) -> Box<dyn Transport> {
    if mock {
        Box::new(MockTransport::loopback([MOCK_PORT]))
    } else {
        Box::new(SystemTransport)
    }
}

/// Run a subcommand, printing its output to stdout.
pub fn handle_command(command: Commands, mock: bool) -> Result<(), Error> {
    match command {
        Commands::Examples(example) => match example {
            Examples::Config => {
                println!("{}", Config::example().serialize_pretty()?);
            }
        },
        Commands::Ports => {
            for port in transport(mock).available_ports() {
                println!("{port}");
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn overrides_apply() {
        let cli = Cli::parse_from(["keel-term", "--baud", "115200", "--port", "COM4", "--mock"]);
        let config = cli.resolve_config().unwrap();

        assert_eq!(config.baud, 115_200);
        assert_eq!(config.port.as_deref(), Some("COM4"));
        assert!(config.mock);
        assert_eq!(cli.log_level, Level::INFO);
    }

    #[test]
    fn zero_baud_is_rejected() {
        let cli = Cli::parse_from(["keel-term", "--baud", "0"]);

        assert!(matches!(cli.resolve_config(), Err(Error::BadConfig(_))));
    }

    #[test]
    fn subcommands_parse() {
        let cli = Cli::parse_from(["keel-term", "ports"]);
        assert!(matches!(cli.command, Some(Commands::Ports)));

        let cli = Cli::parse_from(["keel-term", "examples", "config"]);
        assert!(matches!(
            cli.command,
            Some(Commands::Examples(Examples::Config))
        ));
    }

    #[test]
    fn mock_transport_lists_the_loopback_port() {
        assert_eq!(transport(true).available_ports(), vec![MOCK_PORT.to_string()]);
    }
}
