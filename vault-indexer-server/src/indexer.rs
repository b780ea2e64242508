use crate::Settings;
use anyhow::Context;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tokio::{sync::mpsc, task::JoinHandle};
use vault_indexer_logic::{
    AlloyChainClient, ChainPoller, EventPublisher, NotificationDispatcher, PollerConfig,
    PollerLock, SyncStatus, lock_key,
    notifications::DbSubscriptionStore,
    publish::NoopPublisher,
};

/// Starts the dispatcher task and returns the publisher the poller should
/// hand new events to.
pub fn spawn_dispatcher(
    settings: &Settings,
    db: Arc<DatabaseConnection>,
) -> anyhow::Result<Arc<dyn EventPublisher>> {
    if !settings.notifications.enabled {
        tracing::warn!("notifications are disabled in settings");
        return Ok(Arc::new(NoopPublisher));
    }

    let store = Arc::new(DbSubscriptionStore::new(db));
    let dispatcher = NotificationDispatcher::from_settings(store, &settings.notifications)
        .context("failed to initialize notification channels")?;
    let (sender, receiver) = mpsc::unbounded_channel();
    Arc::new(dispatcher).spawn(receiver, settings.notifications.max_concurrent_deliveries);

    Ok(Arc::new(sender))
}

pub struct RunningPoller {
    /// Held for as long as the poller task runs.
    pub lock: PollerLock,
    pub handle: JoinHandle<()>,
}

/// Spawns the poller if this replica wins the advisory lock. Lock errors are
/// logged and leave this replica without a poller.
pub async fn spawn_poller(
    settings: &Settings,
    db: Arc<DatabaseConnection>,
    publisher: Arc<dyn EventPublisher>,
    status: Arc<SyncStatus>,
) -> anyhow::Result<Option<RunningPoller>> {
    if !settings.indexer.enabled {
        tracing::warn!("indexer is disabled in settings");
        return Ok(None);
    }

    let key = lock_key(&settings.indexer.contract_address, settings.indexer.lock_id);
    let lock = match PollerLock::try_acquire(db.as_ref(), key).await {
        Ok(Some(lock)) => lock,
        Ok(None) => {
            tracing::warn!(
                lock_key = key,
                "poller lock is held by another replica, polling is disabled on this one"
            );
            return Ok(None);
        }
        Err(err) => {
            tracing::error!(
                err = ?err,
                lock_key = key,
                "failed to acquire poller lock, polling is disabled on this replica"
            );
            return Ok(None);
        }
    };

    tracing::info!(lock_key = key, rpc_url = %settings.indexer.rpc_url, "connecting to rpc");
    let client = AlloyChainClient::connect_http(
        settings.indexer.rpc_url.clone(),
        settings.indexer.rpc_timeout,
    );
    let handle = ChainPoller::new(
        db,
        Arc::new(client),
        publisher,
        status,
        PollerConfig::from(&settings.indexer),
    )
    .spawn();

    Ok(Some(RunningPoller { lock, handle }))
}
