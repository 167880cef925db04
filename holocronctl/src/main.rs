//! `holocronctl`: browse the film catalog with posters, character portraits
//! and metadata from the command line.

mod app;
mod cli;
mod commands;

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use holocron_config::{ConfigLoad, ConfigLoader, ConfigLoaderOptions};
use holocron_core::CoreError;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::app::App;
use crate::cli::{Cli, Command};
use crate::commands::Interrupted;

const EXIT_FAILURE: u8 = 1;
const EXIT_NOT_FOUND: u8 = 2;
const EXIT_INTERRUPTED: u8 = 130;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,holocron_core=info,holocronctl=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let token = CancellationToken::new();
    let on_interrupt = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, cancelling");
            on_interrupt.cancel();
        }
    });

    match run(cli, &token).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => exit_code_for(&err),
    }
}

async fn run(cli: Cli, token: &CancellationToken) -> anyhow::Result<()> {
    let ConfigLoad { config, warnings } =
        ConfigLoader::with_options(ConfigLoaderOptions {
            config_path: cli.global.config.clone(),
            env_file: cli.global.env_file.clone(),
        })
        .load()
        .context("failed to load configuration")?;

    if config.source.env_file_loaded {
        info!("loaded .env file");
    }
    for warning in warnings.iter() {
        warn!(message = %warning, "configuration warning");
    }

    let app = App::build(&config, cli.global.ephemeral).await?;

    match cli.command {
        Command::Films { posters } => commands::films(&app, posters, token).await,
        Command::Film { slug, id } => commands::film(&app, &slug, id, token).await,
        Command::Character { slug, id } => {
            commands::character(&app, &slug, id, token).await
        }
        Command::Search { name } => commands::search(&app, &name).await,
        Command::Posters => commands::posters(&app, token).await,
        Command::Cache { action } => commands::cache(&app, action).await,
    }
}

fn exit_code_for(err: &anyhow::Error) -> ExitCode {
    if err.downcast_ref::<Interrupted>().is_some() {
        eprintln!("interrupted");
        return ExitCode::from(EXIT_INTERRUPTED);
    }
    match err.downcast_ref::<CoreError>() {
        Some(core @ CoreError::NotFound { .. }) => {
            eprintln!("{core}");
            ExitCode::from(EXIT_NOT_FOUND)
        }
        Some(core @ CoreError::Catalog(_)) => {
            error!(error = %core, "catalog request failed");
            eprintln!("{core}");
            ExitCode::from(EXIT_FAILURE)
        }
        None => {
            eprintln!("error: {err:#}");
            ExitCode::from(EXIT_FAILURE)
        }
    }
}
