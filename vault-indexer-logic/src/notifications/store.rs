use crate::repository::notification_subscriptions;
use alloy::primitives::{Address, B256};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use vault_indexer_entity::{
    notification_subscriptions::Model as Subscription, sea_orm_active_enums::DeliveryStatus,
};

/// Subscription lookups needed by the dispatcher.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    async fn find_active(
        &self,
        chain_id: i64,
        contract: Address,
        package_key: B256,
    ) -> anyhow::Result<Vec<Subscription>>;

    async fn record_delivery(
        &self,
        id: i64,
        status: DeliveryStatus,
        at: NaiveDateTime,
    ) -> anyhow::Result<()>;
}

#[derive(Clone)]
pub struct DbSubscriptionStore {
    db: Arc<DatabaseConnection>,
}

impl DbSubscriptionStore {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SubscriptionStore for DbSubscriptionStore {
    async fn find_active(
        &self,
        chain_id: i64,
        contract: Address,
        package_key: B256,
    ) -> anyhow::Result<Vec<Subscription>> {
        let subscriptions =
            notification_subscriptions::find_active(self.db.as_ref(), chain_id, contract, package_key)
                .await?;
        Ok(subscriptions)
    }

    async fn record_delivery(
        &self,
        id: i64,
        status: DeliveryStatus,
        at: NaiveDateTime,
    ) -> anyhow::Result<()> {
        notification_subscriptions::record_delivery(self.db.as_ref(), id, status, at).await?;
        Ok(())
    }
}
