mod config;
mod emit;
mod predict;
mod scheduler;
#[cfg(test)]
mod test_log;
mod visibility;

use clap::Parser;
use std::future::Future;
use std::process::ExitCode;
use tokio::sync::oneshot;

use crate::config::Config;
use crate::predict::HttpPassProvider;
use crate::scheduler::{RunMode, Scheduler};

const DEFAULT_CONFIG: &str = "/app/config.yaml";

#[derive(Parser)]
#[command(name = "satlight")]
#[command(about = "Report which tracked satellites are overhead")]
struct Cli {
    /// Path to the YAML config
    #[arg(short, long, default_value = DEFAULT_CONFIG)]
    config: String,
    /// Run a single cycle and exit
    #[arg(long)]
    once: bool,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let config = match Config::from_file(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            log::error!("Failed to load config {}: {}", cli.config, e);
            return ExitCode::FAILURE;
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            log::error!("Failed to start runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let mode = if cli.once {
        RunMode::Once
    } else {
        RunMode::Forever
    };
    runtime.block_on(run(config, mode))
}

async fn run(config: Config, mode: RunMode) -> ExitCode {
    let provider = match HttpPassProvider::new(&config.api) {
        Ok(p) => p,
        Err(e) => {
            log::error!("Failed to build HTTP client: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let stop = match stop_signals() {
        Ok(stop) => stop,
        Err(e) => {
            log::error!("Cannot listen for stop signals: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let (stop_tx, stop_rx) = oneshot::channel();
    tokio::spawn(async move {
        let name = stop.await;
        log::info!("Received {}, stopping", name);
        let _ = stop_tx.send(());
    });

    log::info!(
        "Tracking {} satellites from ({}, {}), min elevation {}°, period {}, outputs [{}]",
        config.satellites.len(),
        config.location.latitude_deg,
        config.location.longitude_deg,
        config.min_elevation_deg,
        humantime::format_duration(config.period),
        config
            .outputs
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    );

    let mut scheduler = Scheduler::new(&config, provider);
    let cycles = scheduler.run(mode, stop_rx).await;
    log::info!("Stopped after {} cycles", cycles);
    ExitCode::SUCCESS
}

/// Registers the handlers right away so a signal arriving before the first
/// poll is not lost. Resolves with the name of the first signal seen.
#[cfg(unix)]
fn stop_signals() -> std::io::Result<impl Future<Output = &'static str> + Send + 'static> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;
    Ok(async move {
        tokio::select! {
            _ = interrupt.recv() => "SIGINT",
            _ = terminate.recv() => "SIGTERM",
        }
    })
}

#[cfg(not(unix))]
fn stop_signals() -> std::io::Result<impl Future<Output = &'static str> + Send + 'static> {
    Ok(async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => "Ctrl-C",
            Err(_) => std::future::pending().await,
        }
    })
}
