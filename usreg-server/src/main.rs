//! usreg server
//!
//! A long-lived in-memory user registry fed through a rendezvous intake
//! channel.

mod config;
mod driver;
mod shutdown;

use clap::Parser;
use config::ConfigLoader;
use shutdown::shutdown_signal;
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use usreg_core::Registry;

/// usreg - In-memory user registry
#[derive(Parser, Debug)]
#[command(name = "usreg")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the configuration file [default: ./usreg.toml, optional]
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Admit a user through the intake channel (repeatable)
    #[arg(short, long = "user", value_name = "ID")]
    users: Vec<String>,

    /// Admit a user directly before the event loop starts (repeatable)
    #[arg(short, long = "direct", value_name = "ID")]
    direct: Vec<String>,

    /// Admit one user per line read from standard input
    #[arg(long, default_value = "false")]
    stdin: bool,

    /// Run the producer/consumer message helpers once
    #[arg(long, default_value = "false")]
    hello: bool,

    /// Shut down once the configured admissions are done instead of
    /// waiting for SIGINT/SIGTERM
    #[arg(long, default_value = "false")]
    exit_when_done: bool,

    /// Print the final user mapping as JSON on exit
    #[arg(long, default_value = "false")]
    dump: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Load configuration; the log filter comes from it
    let config_loader = ConfigLoader::new(args.config.as_deref())
        .with_users(args.direct.clone(), args.users.clone());
    let config = config_loader.load()?;

    init_tracing(&config.logging.filter);

    tracing::info!("Starting usreg v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Configuration loaded from {:?}", config_loader.config_path());

    let registry = Registry::new();

    // Direct admissions happen before the loop exists, so nothing races them
    for user in &config.registry.seed_users {
        registry.admit_direct(user.as_str());
    }
    let loop_handle = registry.start()?;

    driver::admit_all(&registry, &config.registry.intake_users).await?;

    if args.hello {
        driver::greet().await;
    }

    if args.exit_when_done {
        if args.stdin {
            let admitted = driver::admit_from_stdin(registry.intake()).await?;
            tracing::info!(admitted, "Standard input exhausted");
        }
    } else {
        let stdin_task = args
            .stdin
            .then(|| tokio::spawn(driver::admit_from_stdin(registry.intake())));

        tracing::info!("Registry running, waiting for shutdown signal");
        shutdown_signal().await?;

        if let Some(task) = stdin_task {
            task.abort();
        }
    }

    registry.shutdown();
    loop_handle.await?;
    tracing::info!(users = registry.len(), "Registry shutdown complete");

    if args.dump {
        println!("{}", serde_json::to_string_pretty(&registry.snapshot())?);
    }

    Ok(())
}

/// Initialize the tracing subscriber.
///
/// `RUST_LOG` wins over the configured filter. Logs go to standard error so
/// standard output only carries admission notices and messages.
fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
