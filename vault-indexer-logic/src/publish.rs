use crate::events::EventKind;
use alloy::primitives::{Address, B256};
use serde_json::Value;
use tokio::sync::mpsc;

/// A newly persisted event record, handed to downstream consumers.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedEvent {
    pub chain_id: i64,
    pub contract_address: Address,
    pub package_key: B256,
    pub kind: EventKind,
    pub block_number: u64,
    pub tx_hash: B256,
    pub log_index: u64,
    pub payload: Value,
}

/// Called once per stored event, after its transaction committed.
/// Implementations must not block the poller.
pub trait EventPublisher: Send + Sync {
    fn publish(&self, event: IndexedEvent);
}

impl EventPublisher for mpsc::UnboundedSender<IndexedEvent> {
    fn publish(&self, event: IndexedEvent) {
        if let Err(err) = self.send(event) {
            tracing::warn!(
                package_key = %err.0.package_key,
                event_type = %err.0.kind,
                "notification dispatcher is not running, event dropped"
            );
        }
    }
}

/// Used when notifications are disabled.
pub struct NoopPublisher;

impl EventPublisher for NoopPublisher {
    fn publish(&self, _event: IndexedEvent) {}
}
