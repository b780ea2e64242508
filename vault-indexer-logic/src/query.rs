use crate::{
    projection::PackageProjection,
    repository::{event_records, package_projections},
    status::SyncStatus,
};
use alloy::primitives::{Address, B256};
use anyhow::Context;
use chrono::{DateTime, Utc};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use vault_indexer_entity::event_records::Model as EventRecord;

pub const DEFAULT_PAGE_SIZE: u64 = 50;
pub const MAX_PAGE_SIZE: u64 = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventQuery {
    pub chain_id: i64,
    pub contract_address: Address,
    pub package_key: Option<B256>,
    /// Zero based.
    pub page: u64,
    pub page_size: u64,
}

impl EventQuery {
    pub fn new(chain_id: i64, contract_address: Address) -> Self {
        Self {
            chain_id,
            contract_address,
            package_key: None,
            page: 0,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_package_key(mut self, package_key: B256) -> Self {
        self.package_key = Some(package_key);
        self
    }

    pub fn with_page(mut self, page: u64, page_size: u64) -> Self {
        self.page = page;
        self.page_size = page_size;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventPage {
    pub items: Vec<EventRecord>,
    pub total: u64,
    pub next_page: Option<u64>,
}

/// Read-only access to indexed state for API layers.
#[derive(Clone)]
pub struct EventQueryService {
    db: Arc<DatabaseConnection>,
    status: Arc<SyncStatus>,
}

impl EventQueryService {
    pub fn new(db: Arc<DatabaseConnection>, status: Arc<SyncStatus>) -> Self {
        Self { db, status }
    }

    pub async fn list_events(&self, query: &EventQuery) -> anyhow::Result<EventPage> {
        let page_size = query.page_size.clamp(1, MAX_PAGE_SIZE);
        let filter = event_records::EventFilter {
            chain_id: query.chain_id,
            contract_address: query.contract_address,
            package_key: query.package_key,
        };

        let (items, total) = event_records::list(self.db.as_ref(), &filter, query.page, page_size)
            .await
            .inspect_err(|err| tracing::error!(err = ?err, "failed to list event records"))
            .context("listing event records")?;

        let next_page = ((query.page + 1) * page_size < total).then_some(query.page + 1);
        Ok(EventPage {
            items,
            total,
            next_page,
        })
    }

    pub async fn get_projection(
        &self,
        chain_id: i64,
        contract_address: Address,
        package_key: B256,
    ) -> anyhow::Result<Option<PackageProjection>> {
        package_projections::find(self.db.as_ref(), chain_id, contract_address, package_key)
            .await
            .context("loading package projection")
    }

    pub fn last_sync_timestamp(&self) -> Option<DateTime<Utc>> {
        self.status.last_sync_timestamp()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{CHAIN_ID, CONTRACT, PACKAGE_KEY, init_db, insert_event_record};
    use pretty_assertions::assert_eq;

    #[tokio::test]
    #[ignore = "needs database to run"]
    async fn pages_through_events_in_chain_order() {
        let guard = init_db("query_pages_through_events").await;
        let db = guard.client();
        for (block, log_index) in [(12, 1), (10, 0), (12, 0), (11, 3), (10, 2)] {
            insert_event_record(db.as_ref(), block, log_index).await;
        }
        let service = EventQueryService::new(db.clone(), Arc::new(SyncStatus::default()));
        let query = EventQuery::new(CHAIN_ID, CONTRACT).with_package_key(PACKAGE_KEY);

        let first = service.list_events(&query.clone().with_page(0, 2)).await.unwrap();
        assert_eq!(first.total, 5);
        assert_eq!(first.next_page, Some(1));
        let order: Vec<_> = first
            .items
            .iter()
            .map(|event| (event.block_number, event.log_index))
            .collect();
        assert_eq!(order, vec![(10, 0), (10, 2)]);

        let last = service.list_events(&query.clone().with_page(2, 2)).await.unwrap();
        assert_eq!(last.items.len(), 1);
        assert_eq!(last.items[0].block_number, 12);
        assert_eq!(last.items[0].log_index, 1);
        assert_eq!(last.next_page, None);

        let other_package = service
            .list_events(&EventQuery::new(CHAIN_ID, CONTRACT).with_package_key(B256::repeat_byte(0x01)))
            .await
            .unwrap();
        assert_eq!(other_package.total, 0);
        assert!(other_package.items.is_empty());
        assert_eq!(service.last_sync_timestamp(), None);
    }

    #[tokio::test]
    #[ignore = "needs database to run"]
    async fn missing_projection_is_none() {
        let guard = init_db("query_missing_projection_is_none").await;
        let service = EventQueryService::new(guard.client(), Arc::new(SyncStatus::default()));

        let projection = service
            .get_projection(CHAIN_ID, CONTRACT, PACKAGE_KEY)
            .await
            .unwrap();
        assert_eq!(projection, None);
    }
}
