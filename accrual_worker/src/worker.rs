use log::*;
use loyalty_engine::{
    accrual::{AccrualClient, HttpAccrualTransport},
    pipeline::{AccrualPipeline, OrderProcessor, ShutdownOutcome},
    LoyaltyDatabase,
    OrderFlowApi,
    SqliteDatabase,
};

use crate::{config::WorkerConfig, errors::WorkerError, redrive_worker::start_redrive_worker};

/// Runs the accrual pipeline and the re-drive worker until Ctrl-C is received, then shuts both down.
pub async fn run_worker(config: WorkerConfig) -> Result<(), WorkerError> {
    let mut db = SqliteDatabase::new_with_url(&config.database_url, config.db_max_connections).await?;
    info!("🗃️ Connected to database at {}", db.url());
    if config.skip_migrations {
        info!("🚀️ Skipping database migrations");
    } else {
        db.run_migrations().await?;
    }
    let transport = HttpAccrualTransport::new(config.accrual.clone())?;
    let client = AccrualClient::new(transport, &config.accrual);
    let processor = OrderProcessor::new(db.clone(), client);
    let pipeline = AccrualPipeline::start(config.pipeline.clone(), processor);
    let api = OrderFlowApi::new(db.clone(), pipeline.queue());
    let redrive = start_redrive_worker(api, config.redrive.clone());
    info!("🚀️ Accrual worker running against {}. Press Ctrl-C to stop.", config.accrual.base_url);

    tokio::signal::ctrl_c().await?;
    info!("🚀️ Ctrl-C received. Shutting down.");
    redrive.abort();
    match pipeline.shutdown().await {
        ShutdownOutcome::Drained => info!("🚀️ All queued orders were processed"),
        ShutdownOutcome::Aborted => warn!("🚀️ Some orders were interrupted. They will be re-driven on the next start."),
    }
    db.close().await?;
    Ok(())
}
