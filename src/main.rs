//! Cubby notifier: periodic due-reminder push notifications.
//!
//! Main entry point that loads configuration, wires the crates together,
//! and runs the selected subcommand.

use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt};

use cubby_core::config::AppConfig;
use cubby_core::error::AppError;
use cubby_core::types::id::UserId;
use cubby_database::{DatabasePool, PgNotificationStore};
use cubby_entity::push_token::Platform;
use cubby_worker::{NotificationPass, NotificationScheduler};

#[derive(Debug, Parser)]
#[command(name = "cubby-notifier", version, about = "Cubby due-reminder notifier")]
struct Cli {
    /// Configuration environment; selects `config/{env}.toml`.
    #[arg(long, default_value_t = default_env())]
    env: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the reminder scheduler until interrupted (default).
    Serve,
    /// Run a single reminder pass and exit.
    RunOnce,
    /// Register a device push token for a user.
    RegisterToken {
        /// User the device belongs to.
        #[arg(long)]
        user: UserId,
        /// Opaque device token issued by the push provider.
        #[arg(long)]
        token: String,
        /// Device platform: web, ios or android.
        #[arg(long)]
        platform: String,
    },
    /// Send a test notification to every device of a user.
    TestPush {
        /// User to notify.
        #[arg(long)]
        user: UserId,
    },
}

fn default_env() -> String {
    std::env::var("CUBBY_ENV").unwrap_or_else(|_| "development".to_string())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match AppConfig::load(&cli.env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    init_logging(&config);
    tracing::debug!(env = %cli.env, "Configuration loaded");

    match run(cli.command.unwrap_or(Command::Serve), config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Cubby notifier failed");
            ExitCode::FAILURE
        }
    }
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
        _ => {
            fmt().pretty().with_env_filter(filter).with_target(true).init();
        }
    }
}

async fn run(command: Command, config: AppConfig) -> Result<(), AppError> {
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        push_provider = %config.push.provider,
        "Starting Cubby notifier"
    );

    let db = DatabasePool::connect(&config.database).await?;
    if !db.health_check().await? {
        return Err(AppError::database("Database health check returned an unexpected value"));
    }
    let store = Arc::new(PgNotificationStore::new(db.pool()));
    let gateway = cubby_push::build_gateway(&config.push)?;
    let pass = Arc::new(NotificationPass::new(
        store.clone(),
        gateway,
        &config.notifier,
        &config.push,
    ));

    let result = match command {
        Command::Serve => serve(pass, &config).await,
        Command::RunOnce => match pass.run_one_pass().await {
            Ok(report) => {
                tracing::info!(
                    due = report.due_trackers,
                    delivered = report.dispatch.delivered,
                    "Single pass complete"
                );
                Ok(())
            }
            Err(e) => Err(AppError::from(e)),
        },
        Command::RegisterToken {
            user,
            token,
            platform,
        } => {
            let platform: Platform = platform.parse()?;
            store.tokens().save(user, &token, platform).await.map(|saved| {
                tracing::info!(
                    %user,
                    token_id = %saved.id,
                    %platform,
                    "Push token registered"
                );
            })
        }
        Command::TestPush { user } => {
            let outcomes = pass.send_test_notification(user).await?;
            let accepted = outcomes.iter().filter(|o| o.success).count();
            if accepted == 0 {
                Err(AppError::external_service(format!(
                    "No device of user {user} accepted the test notification"
                )))
            } else {
                Ok(())
            }
        }
    };

    db.close().await;
    result
}

async fn serve(pass: Arc<NotificationPass>, config: &AppConfig) -> Result<(), AppError> {
    if !config.notifier.enabled {
        tracing::warn!("Notifier disabled by configuration, waiting for shutdown");
        shutdown_signal().await;
        return Ok(());
    }

    let handle = NotificationScheduler::new(pass, config.notifier.clone()).start()?;
    shutdown_signal().await;

    tracing::info!("Shutdown signal received, stopping scheduler...");
    handle.shutdown().await;
    tracing::info!("Cubby notifier shut down gracefully");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
