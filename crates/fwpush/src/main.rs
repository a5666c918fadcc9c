// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of fwpush.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz


//! fwpush - command line entry point

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use fwpush::output::TableFormatter;
use fwpush::{AppConfig, CommandRegistry, Session};
use fwpush_client::ResourceClient;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "fwpush")]
#[command(author, version, about = "Staged firmware rollout for gateway fleets")]
#[command(
    long_about = "Lists firmware builds that may be rolled out, the devices you are allowed to \
    upgrade, and dispatches upgrade commands.\n\
    \nNew builds are held for 14 days after release before they are offered.\n\
    \nExamples:\n  \
    fwpush versions\n  \
    fwpush select --version 3.1.0\n  \
    fwpush upgrade --version 3.1.0 --device 0123-4567 --yes"
)]
struct Cli {
    /// Configuration file; credentials fall back to FWPUSH_* variables
    #[arg(long, default_value = "fwpush.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List firmware builds and their rollout status
    Versions,

    /// List devices you may upgrade
    Devices,

    /// Show which devices a firmware version would be installed on
    Select {
        #[arg(long)]
        version: String,

        /// Agent type name, needed when several types publish the version
        #[arg(long)]
        agent_type: Option<String>,
    },

    /// Install a firmware version on the selected devices
    Upgrade {
        #[arg(long)]
        version: String,

        #[arg(long)]
        agent_type: Option<String>,

        /// Restrict the upgrade to these device ids (repeatable)
        #[arg(long = "device")]
        devices: Vec<String>,

        /// Dispatch without stopping at the preview
        #[arg(long)]
        yes: bool,
    },

    /// Invoke a registered command with JSON arguments
    Call {
        name: String,

        #[arg(long, default_value = "{}")]
        args: String,
    },
}

fn load_config(path: &Path) -> anyhow::Result<AppConfig> {
    if path.exists() {
        info!("Loading config from {}", path.display());
        Ok(AppConfig::from_file(path)?)
    } else {
        info!("{} not found, using environment", path.display());
        Ok(AppConfig::from_env()?)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("fwpush=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli.config)?;
    let client = ResourceClient::new(config.client_config())?;
    let mut session = Session::new(client, config.rollout, config.permissions);

    match cli.command {
        Commands::Versions => {
            let firmware = session.list_firmware().await?;
            print!("{}", TableFormatter::firmware(firmware));
        }
        Commands::Devices => {
            let devices = session.authorized_devices().await?;
            print!("{}", TableFormatter::devices(&devices));
        }
        Commands::Select {
            version,
            agent_type,
        } => {
            session
                .select_firmware(&version, agent_type.as_deref())
                .await?;
            print_candidates(&session);
        }
        Commands::Upgrade {
            version,
            agent_type,
            devices,
            yes,
        } => {
            session
                .select_firmware(&version, agent_type.as_deref())
                .await?;
            print_candidates(&session);

            if !yes {
                println!("Re-run with --yes to dispatch the upgrade");
                return Ok(());
            }

            let report = session.install_selected(&devices).await?;
            print!("{}", TableFormatter::report(&report));
            if !report.all_dispatched() {
                bail!("{} of {} upgrades failed", report.failed.len(), report.attempted());
            }
        }
        Commands::Call { name, args } => {
            let args: Value = serde_json::from_str(&args).context("--args must be JSON")?;
            let registry = CommandRegistry::with_builtins();
            if !registry.names().any(|n| n == name) {
                warn!(
                    "Known commands: {}",
                    registry.names().collect::<Vec<_>>().join(", ")
                );
            }
            let result = registry.dispatch(&name, &mut session, args).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
    }

    Ok(())
}

fn print_candidates(session: &Session) {
    if let Some(target) = session.target() {
        print!(
            "{}",
            TableFormatter::candidates(&target.artifact, session.selected_devices())
        );
    }
}
