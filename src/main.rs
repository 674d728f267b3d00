use clap::Parser;
use color_eyre::Result;
use keel_term::{cli, gui, logging};
use tracing::{debug, info, Level};

fn main() -> Result<()> {
    color_eyre::install()?;

    let mut cli = cli::Cli::parse();

    if let Some(command) = cli.command.take() {
        cli::handle_command(command, cli.mock)?;

        return Ok(());
    }

    logging::init(
        cli.log_level,
        cli.log_dir.clone().map(|dir| (Level::DEBUG, dir)),
    );

    let config = cli.resolve_config()?;
    debug!(?config, "Using config");

    gui::run(cli::transport(config.mock), config)?;

    info!("Window closed, quitting");

    Ok(())
}
