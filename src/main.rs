// tabfd: hybrid sampling/validation discovery of minimal functional
// dependencies in relational tables, plus a minimal-cover reducer.
// Copyright (C) 2017-2022 Alex Jago <abjago@abjago.net>.
// Released under the MIT or Apache-2.0 licenses, at your option.

use clap::Parser;
use color_eyre::eyre::{Context, Result};
use std::path::Path;
use tabfd::app::{self, Cli, CliCommands};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    let (debug, mute, logfile) = match &cli.command {
        CliCommands::Discover(d) => (d.debug, d.mute, d.logfile.clone()),
        CliCommands::MinCover(_) => (false, false, None),
    };
    init_logging(debug, mute, logfile.as_deref())?;

    app::actual(cli)
}

/// Sets up `tracing_subscriber`: `--debug` widens the filter to `trace`,
/// `--mute` narrows it to `error`, `--logfile` redirects to a file instead
/// of stderr. `RUST_LOG` always takes precedence when set.
fn init_logging(debug: bool, mute: bool, logfile: Option<&Path>) -> Result<()> {
    let default_level = if mute {
        "error"
    } else if debug {
        "trace"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    if let Some(path) = logfile {
        let file = std::fs::File::create(path)
            .with_context(|| format!("could not create log file {}", path.display()))?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::sync::Mutex::new(file))
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
    Ok(())
}
