//! # doorscan kiosk
//!
//! Runs a QR check-in scanner in a terminal. Scanned codes arrive as lines on
//! stdin; lines starting with the command prefix (`/` unless configured) are
//! operator commands (`/start`, `/stop`, `/restart`, `/manual <code>`,
//! `/quit`). `/manual` submits the configured form.

use anyhow::Context;
use clap::Parser;
use doorscan_kiosk::{
    Kiosk,
    config::{self, ConfigLoad, ConfigLoader, KioskArgs},
};
use tokio::io::BufReader;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// CLI entry point
#[derive(Parser, Debug)]
#[command(name = "doorscan-kiosk")]
#[command(about = "QR check-in kiosk for a keyboard-wedge reader")]
struct Cli {
    #[command(flatten)]
    args: KioskArgs,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let ConfigLoad {
        mut config,
        mut warnings,
    } = ConfigLoader::with_options(cli.args.loader_options())
        .load()
        .context("failed to load kiosk configuration")?;
    cli.args.apply(&mut config);
    for warning in config::validate(&config).context("invalid command-line flags")? {
        if !warnings.contains(&warning) {
            warnings.push(warning);
        }
    }

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_filter)),
        )
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    for warning in &warnings {
        warn!(target: "doorscan::kiosk", "{warning}");
    }
    info!(
        target: "doorscan::kiosk",
        config = ?config.metadata.config_path,
        env_file = config.metadata.env_file_loaded,
        auto_submit = ?config.scanner.submit_target(),
        precheck = config.scanner.precheck_enabled(),
        command_prefix = %config.command_prefix,
        "starting kiosk"
    );

    let kiosk = Kiosk::from_config(&config)?;

    let shutdown = CancellationToken::new();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                shutdown.cancel();
            }
        }
    });

    kiosk
        .run(BufReader::new(tokio::io::stdin()), shutdown)
        .await
}
