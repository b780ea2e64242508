use crate::{
    indexer::{self, RunningPoller},
    settings::Settings,
};
use anyhow::Context;
use blockscout_service_launcher::database;
use migration::Migrator;
use std::{future::Future, sync::Arc};
use tokio::task::JoinHandle;
use vault_indexer_logic::SyncStatus;

const SERVICE_NAME: &str = "vault_indexer";

pub async fn run(settings: Settings) -> Result<(), anyhow::Error> {
    blockscout_service_launcher::tracing::init_logs(
        SERVICE_NAME,
        &settings.tracing,
        &settings.jaeger,
    )?;

    let db_connection =
        Arc::new(database::initialize_postgres::<Migrator>(&settings.database).await?);
    let status = Arc::new(SyncStatus::default());

    let publisher = indexer::spawn_dispatcher(&settings, db_connection.clone())?;
    let poller = indexer::spawn_poller(&settings, db_connection, publisher, status).await?;

    let (lock, handle) = match poller {
        Some(RunningPoller { lock, handle }) => (Some(lock), Some(handle)),
        None => (None, None),
    };
    let result = wait_for_shutdown(handle, async {
        tokio::signal::ctrl_c().await.context("failed to listen for ctrl-c")
    })
    .await;

    if let Some(lock) = lock {
        lock.release().await?;
    }
    result
}

/// Resolves on the shutdown signal, or with an error as soon as the poller
/// task stops on its own.
async fn wait_for_shutdown(
    poller: Option<JoinHandle<()>>,
    shutdown: impl Future<Output = anyhow::Result<()>>,
) -> anyhow::Result<()> {
    let Some(poller) = poller else {
        shutdown.await?;
        tracing::info!("shutting down");
        return Ok(());
    };

    tokio::select! {
        result = poller => {
            match result {
                Ok(()) => tracing::error!("poller task stopped"),
                Err(err) => tracing::error!(err = ?err, "poller task failed"),
            }
            anyhow::bail!("poller task stopped unexpectedly")
        }
        result = shutdown => {
            result?;
            tracing::info!("shutting down");
            Ok(())
        }
    }
}
