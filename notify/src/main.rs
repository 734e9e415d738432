//! Notification agent - main entry point.
//!
//! A long-running host for the scheduler: loads configuration, pulls
//! settings and activity from the member API, arms timers, and
//! re-initializes on a fixed cadence so each day's reminders reflect that
//! day's activity. Shuts down cleanly on SIGINT/SIGTERM, cancelling all
//! pending timers.
//!
//! # Example
//!
//! ```bash
//! FORGEPATH_API_URL=https://api.forgepath.app \
//! FORGEPATH_USER_ID=550e8400-e29b-41d4-a716-446655440000 \
//! cargo run --bin notify-agent
//! ```

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use forgepath_notify::{
    ApiClient, Config, Dispatcher, PermissionGate, PermissionState, Scheduler, StaticPermission,
    SystemClock, TracingSink,
};

#[tokio::main]
async fn main() -> ExitCode {
    init_logging();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            error!(error = %err, "Failed to load configuration");
            eprintln!("Error: {err}");
            eprintln!();
            eprintln!("Required environment variables:");
            eprintln!("  FORGEPATH_API_URL              - Base URL of the member API");
            eprintln!("  FORGEPATH_USER_ID              - Member UUID to schedule for");
            eprintln!();
            eprintln!("Optional environment variables:");
            eprintln!("  FORGEPATH_STALL_THRESHOLD_DAYS - Stalled-course threshold (default: 7)");
            eprintln!("  FORGEPATH_REINIT_INTERVAL_SECS - Re-init cadence (default: 86400)");
            eprintln!("  RUST_LOG                       - Log level filter (default: info)");
            return ExitCode::from(1);
        }
    };

    info!(
        api_url = %config.api_url,
        user_id = %config.user_id,
        reinit_interval_secs = config.reinit_interval_secs,
        "Notification agent starting"
    );

    let api = ApiClient::new(config.api_url.clone());
    let dispatcher = Dispatcher::new(Arc::new(TracingSink));
    // The agent is headless; permission prompting belongs to interactive
    // hosts, so dispatch is always allowed here.
    let gate = PermissionGate::new(Arc::new(StaticPermission(PermissionState::Granted)));
    let scheduler = Scheduler::new(dispatcher, gate, Arc::new(SystemClock))
        .with_stall_threshold(config.stall_threshold_days);

    let reinit_interval = Duration::from_secs(config.reinit_interval_secs);

    loop {
        initialize_cycle(&api, &scheduler, &config).await;

        tokio::select! {
            () = tokio::time::sleep(reinit_interval) => {
                info!("Re-initialization interval elapsed");
            }
            result = shutdown_signal() => {
                if let Err(err) = result {
                    error!(error = %err, "Failed to listen for shutdown signal");
                }
                break;
            }
        }
    }

    scheduler.cancel_all();
    info!("Notification agent stopped");
    ExitCode::SUCCESS
}

/// Fetches fresh inputs and re-initializes the scheduler.
///
/// Fetch failures skip the cycle: timers stay unarmed until the next
/// interval rather than being armed from stale guesses. Absent records
/// (404) are not failures; the scheduler applies its defaults.
async fn initialize_cycle(api: &ApiClient, scheduler: &Scheduler, config: &Config) {
    let settings = match api.fetch_settings(config.user_id).await {
        Ok(settings) => settings,
        Err(err) => {
            warn!(error = %err, "Failed to fetch settings, skipping this cycle");
            return;
        }
    };

    let activity = match api.fetch_activity(config.user_id).await {
        Ok(activity) => activity,
        Err(err) => {
            warn!(error = %err, "Failed to fetch activity, skipping this cycle");
            return;
        }
    };

    scheduler.initialize_for_user(settings, activity);
}

/// Completes when SIGINT or SIGTERM arrives.
async fn shutdown_signal() -> std::io::Result<()> {
    #[cfg(unix)]
    {
        let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())?;
        tokio::select! {
            result = signal::ctrl_c() => {
                info!("Received SIGINT, shutting down");
                result
            }
            _ = sigterm.recv() => {
                info!("Received SIGTERM, shutting down");
                Ok(())
            }
        }
    }

    #[cfg(not(unix))]
    {
        let result = signal::ctrl_c().await;
        info!("Received Ctrl-C, shutting down");
        result
    }
}

/// Initializes structured logging with an env-configurable filter.
fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true))
        .init();
}
