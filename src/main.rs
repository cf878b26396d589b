//! Echo client: calls TestService over JSON and protobuf, then waits for a
//! termination signal.
//!
//! ```bash
//! APP_CONF_FILE=conf/client.toml micro-echo-client
//! micro-echo-client --config conf/client.toml
//! ```

use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use micro_echo_client::config::{AppConfig, LogFormat};
use micro_echo_client::context::CallSequence;
use micro_echo_client::diagnostics::{self, DiagnosticsState};
use micro_echo_client::lifecycle::{self, Signals};
use micro_echo_client::registry::StaticRegistry;
use micro_echo_client::rng::TimeSeededRandom;
use micro_echo_client::{demo, RpcClient, VERSION};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Parser)]
#[command(version, about = "Registry-backed RPC echo client")]
struct Cli {
    /// Path to the TOML config file.
    #[arg(short, long, env = "APP_CONF_FILE")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load(&cli.config)
        .with_context(|| format!("loading config from {}", cli.config.display()))?;

    init_logging(config.log_format);

    let registry = Arc::new(StaticRegistry::from_config(&config.registry));
    let client = Arc::new(
        RpcClient::from_config(&config.client, registry, Arc::new(TimeSeededRandom::new()))
            .context("creating rpc client")?,
    );

    let _diagnostics = diagnostics::start(
        config.profile_addr()?,
        Arc::new(DiagnosticsState::new(&config.app_name, client.stats())),
    );
    tracing::info!(app = %config.app_name, version = VERSION, "started successfully");

    let demo_client = Arc::clone(&client);
    let rounds = config.demo_rounds;
    tokio::spawn(async move {
        let seq = CallSequence::new();
        let report = demo::run(&demo_client, &seq, rounds).await;
        tracing::info!(
            succeeded = report.succeeded,
            failed = report.failed,
            "demo calls finished"
        );
    });

    let mut signals = Signals::install().context("installing signal handlers")?;
    lifecycle::wait_for_shutdown(&mut signals).await;

    let outcome = lifecycle::shutdown(&client, config.fail_fast_timeout()).await;
    std::process::exit(outcome.exit_code());
}

fn init_logging(format: LogFormat) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let use_json = match format {
        LogFormat::Json => true,
        LogFormat::Text => false,
        LogFormat::Auto => !std::io::stdout().is_terminal(),
    };

    if use_json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json().flatten_event(true).with_current_span(false))
            .init();
    } else {
        tracing_subscriber::registry().with(env_filter).with(fmt::layer()).init();
    }
}
