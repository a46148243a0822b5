//! Funds Transfer Service
//!
//! ```text
//!                                  ┌──────────────┐
//!                             ┌───▶│   Accounts   │ (Postgres)
//!                             │    └──────────────┘
//! ┌──────────┐    ┌───────────┴─┐  ┌──────────────┐
//! │  Client  │───▶│   Gateway   │─▶│ Reservation  │ (ledger HTTP)
//! └──────────┘    │   + Saga    │  └──────────────┘
//!                 └───────────┬─┘  ┌──────────────┐
//!                             └───▶│    Kafka     │ (fulfillment)
//!                                  └──────────────┘
//! ```

use std::sync::Arc;

use anyhow::Context;

use funds_transfer::config::AppConfig;
use funds_transfer::gateway::{self, state::AppState};
use funds_transfer::logging::init_logging;
use funds_transfer::transfer::adapters::{HttpReservationClient, KafkaProducer, PgAccountGateway};
use funds_transfer::transfer::{MessageDispatcher, ReservationGateway, TransferOrchestrator};

fn get_env() -> String {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if (args[i] == "--env" || args[i] == "-e") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }
    "dev".to_string()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = get_env();
    let app_config = AppConfig::load(&env)?;
    let _log_guard = init_logging(&app_config);

    tracing::info!(
        git_hash = env!("GIT_HASH"),
        "Starting funds transfer service in {} mode",
        env
    );
    app_config.log_effective();

    let accounts = PgAccountGateway::connect(&app_config.postgres_url)
        .await
        .context("Failed to connect to the account store")?;

    let reservation_client = HttpReservationClient::new(&app_config.reservation, &app_config.ait_id)
        .context("Failed to build reservation HTTP client")?;
    let reservations = ReservationGateway::new(
        Arc::new(reservation_client),
        app_config.reservation.retry_policy(),
    );

    let producer = KafkaProducer::from_config(&app_config.broker)
        .context("Failed to create Kafka producer")?;
    let dispatcher =
        MessageDispatcher::from_config(Arc::new(producer), &app_config.broker, &app_config.ait_id);

    let orchestrator = TransferOrchestrator::new(Arc::new(accounts), reservations, dispatcher);
    let state = Arc::new(AppState::new(Arc::new(orchestrator)));

    gateway::run_server(&app_config.gateway, state).await
}
