//! Intake application binary - composition root.
//!
//! Ties together all intake crates into a single executable:
//! 1. Load configuration from TOML
//! 2. Open the SQLite contact store
//! 3. Build the flow engine (keywords, state machine, session store)
//! 4. Start the idle sweeper and the inbound event loop
//! 5. Start the axum status server

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::sync::mpsc;

use intake_api::{routes, AppState};
use intake_core::config::IntakeConfig;
use intake_core::sink::CompletionSink;
use intake_core::store::ContactStore;
use intake_core::transport::Transport;
use intake_flow::{FlowEngine, IdleSweeper, IntakeMachine, ReplyPacer, SessionStore, TypingPacer};
use intake_notify::{Dispatcher, HttpWebhook, WebhookSink};
use intake_storage::{ContactRepository, Database};

mod cli;
mod console;

use cli::CliArgs;
use console::ConsoleTransport;

/// Expand ~ to home directory in a path string.
fn resolve_data_dir(data_dir: &str) -> PathBuf {
    if let Some(rest) = data_dir.strip_prefix("~/") {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(rest)
    } else {
        PathBuf::from(data_dir)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config first; the log level may come from it.
    let config_file = args.resolve_config_path();
    let config = IntakeConfig::load_or_default(&config_file)?;

    let log_level = args
        .log_level
        .clone()
        .unwrap_or_else(|| config.general.log_level.clone());
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .init();

    tracing::info!("Starting intake service v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config_file.display(), "Configuration loaded");

    // Storage.
    let data_dir = resolve_data_dir(
        &args
            .resolve_data_dir()
            .unwrap_or_else(|| config.general.data_dir.clone()),
    );
    std::fs::create_dir_all(&data_dir)?;

    let db_path = data_dir.join("intake.db");
    let db = Arc::new(Database::new(&db_path)?);
    let contacts: Arc<dyn ContactStore> = Arc::new(ContactRepository::new(Arc::clone(&db)));
    tracing::info!(path = %db_path.display(), "Contact store opened");

    // Transport. The console transport stands in for the messaging client;
    // a real channel adapter plugs in here without touching the rest.
    let transport: Arc<dyn Transport> = Arc::new(ConsoleTransport);

    // Completion effects.
    let webhook: Option<Arc<dyn WebhookSink>> = if config.webhook.enabled {
        let hook = HttpWebhook::new(&config.webhook)?;
        tracing::info!(url = %config.webhook.url, "Webhook delivery enabled");
        Some(Arc::new(hook))
    } else {
        None
    };
    let dispatcher: Arc<dyn CompletionSink> = Arc::new(Dispatcher::new(
        Arc::clone(&transport),
        Arc::clone(&contacts),
        webhook,
        config.notify.recipient_id.clone(),
    ));

    // Flow engine.
    let machine = IntakeMachine::new(&config)?;
    let sessions = Arc::new(SessionStore::new());
    let pacer: Arc<dyn ReplyPacer> = Arc::new(TypingPacer::new(config.reply.clone()));
    let engine = Arc::new(FlowEngine::new(
        machine,
        Arc::clone(&sessions),
        Arc::clone(&contacts),
        Arc::clone(&transport),
        pacer,
        dispatcher,
    ));

    // === Background tasks ===

    // Idle sweeper.
    let sweeper = Arc::new(IdleSweeper::new(
        Arc::clone(&sessions),
        Arc::clone(&transport),
        &config,
    ));
    let sweeper_task = Arc::clone(&sweeper);
    tokio::spawn(async move {
        sweeper_task.run().await;
    });

    // Inbound events: console reader feeding the engine.
    let (tx, mut rx) = mpsc::channel(64);
    tokio::spawn(console::read_events(tx));
    let engine_task = Arc::clone(&engine);
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            engine_task.process_event(event).await;
        }
    });

    // === Status server ===

    let port = args.resolve_port(config.general.port);
    let state = AppState::new(Arc::clone(&transport), Arc::clone(&sessions));
    routes::start_server(port, state).await?;

    sweeper.shutdown();
    Ok(())
}
