use crate::{
    error::DeliveryError,
    notifications::{ChannelAdapter, ChannelType, SubscriptionStore},
    publish::{EventPublisher, IndexedEvent},
};
use alloy::primitives::{Address, B256};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use parking_lot::Mutex;
use vault_indexer_entity::{
    notification_subscriptions::Model as Subscription, sea_orm_active_enums::DeliveryStatus,
};

#[derive(Default)]
pub struct RecordingPublisher {
    events: Mutex<Vec<IndexedEvent>>,
}

impl RecordingPublisher {
    pub fn events(&self) -> Vec<IndexedEvent> {
        self.events.lock().clone()
    }
}

impl EventPublisher for RecordingPublisher {
    fn publish(&self, event: IndexedEvent) {
        self.events.lock().push(event);
    }
}

pub struct InMemorySubscriptionStore {
    subscriptions: Vec<Subscription>,
    deliveries: Mutex<Vec<(i64, DeliveryStatus)>>,
}

impl InMemorySubscriptionStore {
    pub fn new(subscriptions: Vec<Subscription>) -> Self {
        Self {
            subscriptions,
            deliveries: Mutex::new(Vec::new()),
        }
    }

    /// Recorded delivery outcomes in call order.
    pub fn deliveries(&self) -> Vec<(i64, DeliveryStatus)> {
        self.deliveries.lock().clone()
    }
}

#[async_trait]
impl SubscriptionStore for InMemorySubscriptionStore {
    async fn find_active(
        &self,
        chain_id: i64,
        contract: Address,
        package_key: B256,
    ) -> anyhow::Result<Vec<Subscription>> {
        Ok(self
            .subscriptions
            .iter()
            .filter(|s| {
                s.active
                    && s.chain_id == chain_id
                    && s.contract_address == contract.as_slice()
                    && s.package_key == package_key.as_slice()
            })
            .cloned()
            .collect())
    }

    async fn record_delivery(
        &self,
        id: i64,
        status: DeliveryStatus,
        _at: NaiveDateTime,
    ) -> anyhow::Result<()> {
        self.deliveries.lock().push((id, status));
        Ok(())
    }
}

/// Adapter that records every attempt and either always succeeds or always fails.
pub struct MockAdapter {
    channel: ChannelType,
    fail: bool,
    targets: Mutex<Vec<String>>,
}

impl MockAdapter {
    pub fn succeeding(channel: ChannelType) -> Self {
        Self {
            channel,
            fail: false,
            targets: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(channel: ChannelType) -> Self {
        Self {
            fail: true,
            ..Self::succeeding(channel)
        }
    }

    /// Targets of every attempt, including failed ones.
    pub fn targets(&self) -> Vec<String> {
        self.targets.lock().clone()
    }
}

#[async_trait]
impl ChannelAdapter for MockAdapter {
    fn channel_type(&self) -> ChannelType {
        self.channel
    }

    async fn deliver(&self, target: &str, _event: &IndexedEvent) -> Result<(), DeliveryError> {
        self.targets.lock().push(target.to_string());
        if self.fail {
            return Err(DeliveryError::Status(reqwest::StatusCode::SERVICE_UNAVAILABLE));
        }
        Ok(())
    }
}
