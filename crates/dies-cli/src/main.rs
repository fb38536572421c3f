use std::{path::PathBuf, str::FromStr};

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use dies_core::WorldSettings;

mod commands;

#[derive(Debug, Parser)]
#[command(name = "dies-cli")]
pub(crate) struct Args {
    #[command(subcommand)]
    command: Command,

    #[clap(long, default_value = "info")]
    log_level: String,

    /// Write logs as JSON
    #[clap(long, default_value = "false")]
    json_logs: bool,

    /// World settings (JSON). Defaults are used if the file does not exist.
    #[clap(long, default_value = "world_settings.json")]
    settings: PathBuf,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Feed a JSON-lines event file through the world info collector and print
    /// every world frame as one JSON line.
    Replay {
        input: PathBuf,

        /// Write frames to this file instead of stdout
        #[clap(long, short)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Set up tracing. Logs go to stderr so that frames on stdout stay parseable.
    let log_level = tracing::Level::from_str(&args.log_level)
        .map_err(|_| anyhow!("Invalid log level: {}", args.log_level))?;
    let builder = tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .without_time();
    // `try_init` also forwards records of the `log` crate
    let init = if args.json_logs {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    init.map_err(|err| anyhow!("Unable to set global tracing subscriber: {}", err))?;

    let settings = WorldSettings::load_or_default(&args.settings)?;

    match args.command {
        Command::Replay { input, output } => {
            let frames = commands::replay::replay(&input, output.as_deref(), settings).await?;
            tracing::info!("Published {} world frames", frames);
        }
    }

    Ok(())
}
