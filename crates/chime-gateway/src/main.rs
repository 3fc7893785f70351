use std::sync::Arc;

use tracing::{error, info, warn};

use chime_agent::{ReminderService, ToolRegistry};
use chime_core::{ChimeConfig, ChimeError};
use chime_scheduler::{resolve_timezone, NotificationBridge, ReminderScheduler};
use chime_telegram::TelegramAdapter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "chime_gateway=info,chime_scheduler=info,chime_telegram=info".into()
            }),
        )
        .init();

    // load config: CHIME_CONFIG env > ~/.chime/chime.toml
    let config_path = std::env::var("CHIME_CONFIG").ok();
    let config = ChimeConfig::load(config_path.as_deref()).unwrap_or_else(|e| {
        warn!("Config load failed ({}), using defaults", e);
        ChimeConfig::default()
    });

    if let Err(e) = resolve_timezone(&config.scheduler.default_timezone) {
        warn!(
            "scheduler.default_timezone is invalid ({}); calls without a timezone will fail",
            e
        );
    }

    // bridge: engine thread → delivery task on this runtime
    let bridge = Arc::new(NotificationBridge::new());
    let scheduler = Arc::new(ReminderScheduler::start(Arc::clone(&bridge))?);
    let service = Arc::new(ReminderService::new(
        Arc::clone(&scheduler),
        &config.scheduler,
    ));
    let registry = Arc::new(ToolRegistry::reminders(service));
    info!(tools = ?registry.names(), "reminder tools registered");

    let telegram = match config.channels.telegram {
        Some(ref tg_cfg) => {
            let adapter = TelegramAdapter::new(tg_cfg, Arc::clone(&registry), Arc::clone(&bridge));
            info!("Telegram bot starting");
            Some(tokio::spawn(adapter.run()))
        }
        None => {
            warn!("no [channels.telegram] configured; reminders cannot be delivered");
            None
        }
    };

    match telegram {
        Some(task) => {
            tokio::select! {
                res = task => match res {
                    Ok(Ok(())) => info!("Telegram adapter exited"),
                    Ok(Err(e)) => {
                        let e = ChimeError::from(e);
                        error!(code = e.code(), error = %e, "Telegram adapter failed");
                    }
                    Err(e) => error!(error = %e, "Telegram adapter task panicked"),
                },
                _ = tokio::signal::ctrl_c() => info!("shutdown signal received"),
            }
        }
        None => {
            tokio::signal::ctrl_c().await?;
            info!("shutdown signal received");
        }
    }

    let pending = scheduler.active_jobs().len();
    scheduler.shutdown();
    info!(pending, "scheduler stopped; pending reminders discarded");
    Ok(())
}
