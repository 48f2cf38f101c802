//! Paste API server entrypoint.

use pastectl_server::{
    config::Config, serve_router, spawn_sweeper, sweeper, AppState, RedbStore, DEFAULT_PORT,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct CliFlags {
    help: bool,
    sweep_once: bool,
}

fn parse_cli_flags(args: &[String]) -> anyhow::Result<CliFlags> {
    let mut flags = CliFlags::default();
    for arg in args.iter().skip(1) {
        match arg.as_str() {
            "--help" => flags.help = true,
            "--sweep-once" => flags.sweep_once = true,
            value if value.starts_with('-') => {
                anyhow::bail!(
                    "Unknown option: '{}'. Use --help to see supported options.",
                    value
                );
            }
            value => {
                anyhow::bail!(
                    "Unexpected positional argument: '{}'. Use --help to see supported options.",
                    value
                );
            }
        }
    }
    Ok(flags)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pastectl=info,tower_http=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args: Vec<String> = std::env::args().collect();
    let cli_flags = parse_cli_flags(&args)?;

    if cli_flags.help {
        print_help();
        return Ok(());
    }

    let config = Config::from_env();
    let store = RedbStore::open(&config.db_path)?;
    let state = AppState::new(config.clone(), store);

    if cli_flags.sweep_once {
        return match sweeper::run_sweep(state.service.clone()).await {
            Some(removed) => {
                println!("Removed {} expired paste(s)", removed);
                Ok(())
            }
            None => anyhow::bail!("Expiry sweep failed; see log for details"),
        };
    }

    let sweeper = spawn_sweeper(state.service.clone(), config.sweep_interval());

    let bind_addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    let actual_addr = listener.local_addr().unwrap_or(bind_addr);
    tracing::info!("pastectl running at http://{}", actual_addr);

    let serve_result = serve_router(listener, state, shutdown_signal()).await;

    sweeper.shutdown().await;
    tracing::info!("Server stopped");

    serve_result?;

    Ok(())
}

fn print_help() {
    println!("pastectl server\n");
    println!("Usage: pastectl [OPTIONS]\n");
    println!("Options:");
    println!("  --sweep-once      Purge expired pastes once and exit");
    println!("  --help            Show this help message");
    println!("\nEnvironment variables:");
    println!("  DB_PATH           Database directory (default: ~/.cache/pastectl/db)");
    println!(
        "  PORT              Port to listen on, all interfaces (default: {})",
        DEFAULT_PORT
    );
    println!("  MAX_PASTE_SIZE    Maximum paste size in bytes (default: 10MB)");
    println!("  FRONTEND_URL      Web frontend origin allowed by CORS");
    println!("  SWEEP_INTERVAL_SECS  Seconds between expiry sweeps (default: 7200)");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!("Failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
