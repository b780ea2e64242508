use super::{
    channels::{ChannelAdapter, ChannelType, EmailChannel, PushChannel, WebhookChannel},
    retry::RetryPolicy,
    store::SubscriptionStore,
};
use crate::{publish::IndexedEvent, settings::NotificationSettings};
use chrono::Utc;
use std::{collections::HashMap, str::FromStr, sync::Arc};
use tokio::{
    sync::{Semaphore, mpsc},
    task::JoinHandle,
};
use vault_indexer_entity::{
    notification_subscriptions::Model as Subscription, sea_orm_active_enums::DeliveryStatus,
};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchSummary {
    pub delivered: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// Fans an indexed event out to the active subscriptions of its package.
pub struct NotificationDispatcher {
    store: Arc<dyn SubscriptionStore>,
    adapters: HashMap<ChannelType, Arc<dyn ChannelAdapter>>,
    retry: RetryPolicy,
}

impl NotificationDispatcher {
    pub fn new(store: Arc<dyn SubscriptionStore>, retry: RetryPolicy) -> Self {
        Self {
            store,
            adapters: HashMap::new(),
            retry,
        }
    }

    pub fn with_adapter(mut self, adapter: Arc<dyn ChannelAdapter>) -> Self {
        self.adapters.insert(adapter.channel_type(), adapter);
        self
    }

    /// Registers webhook and push adapters, and email when smtp is configured.
    pub fn from_settings(
        store: Arc<dyn SubscriptionStore>,
        settings: &NotificationSettings,
    ) -> anyhow::Result<Self> {
        let mut dispatcher = Self::new(store, RetryPolicy::from(&settings.retry))
            .with_adapter(Arc::new(WebhookChannel::new(&settings.webhook)?))
            .with_adapter(Arc::new(PushChannel));

        match &settings.email {
            Some(email) => {
                dispatcher = dispatcher.with_adapter(Arc::new(EmailChannel::new(email)?));
            }
            None => tracing::warn!("smtp is not configured, email notifications are disabled"),
        }
        Ok(dispatcher)
    }

    /// Never fails: delivery problems are logged and recorded per subscription.
    pub async fn dispatch(&self, event: &IndexedEvent) -> DispatchSummary {
        let mut summary = DispatchSummary::default();
        let subscriptions = match self
            .store
            .find_active(event.chain_id, event.contract_address, event.package_key)
            .await
        {
            Ok(subscriptions) => subscriptions,
            Err(err) => {
                tracing::error!(
                    err = ?err,
                    package_key = %event.package_key,
                    "failed to load notification subscriptions"
                );
                return summary;
            }
        };

        let event_type = event.kind.to_string();
        let subscribed = subscriptions
            .iter()
            .filter(|subscription| subscription.event_types.contains(&event_type));

        for subscription in subscribed {
            match self.deliver(subscription, event).await {
                Some(DeliveryStatus::Delivered) => summary.delivered += 1,
                Some(DeliveryStatus::Failed) => summary.failed += 1,
                None => summary.skipped += 1,
            }
        }

        tracing::debug!(
            package_key = %event.package_key,
            %event_type,
            delivered = summary.delivered,
            failed = summary.failed,
            skipped = summary.skipped,
            "notifications dispatched"
        );
        summary
    }

    async fn deliver(
        &self,
        subscription: &Subscription,
        event: &IndexedEvent,
    ) -> Option<DeliveryStatus> {
        let adapter = ChannelType::from_str(&subscription.channel_type)
            .ok()
            .and_then(|channel| self.adapters.get(&channel));
        let Some(adapter) = adapter else {
            tracing::warn!(
                subscription_id = subscription.id,
                channel_type = %subscription.channel_type,
                "no adapter for subscription channel, skipping"
            );
            return None;
        };

        let result = self
            .retry
            .run(|_| adapter.deliver(&subscription.channel_value, event))
            .await;

        let status = match result {
            Ok(()) => DeliveryStatus::Delivered,
            Err(exhausted) => {
                tracing::warn!(
                    subscription_id = subscription.id,
                    channel_type = %subscription.channel_type,
                    attempts = exhausted.attempts,
                    err = %exhausted.last_error,
                    "notification delivery failed"
                );
                DeliveryStatus::Failed
            }
        };

        if let Err(err) = self
            .store
            .record_delivery(subscription.id, status, Utc::now().naive_utc())
            .await
        {
            tracing::error!(
                err = ?err,
                subscription_id = subscription.id,
                "failed to record delivery outcome"
            );
        }
        Some(status)
    }

    /// Consumes published events until the sender side is dropped. At most
    /// `max_concurrent` events are dispatched at the same time.
    pub fn spawn(
        self: Arc<Self>,
        mut events: mpsc::UnboundedReceiver<IndexedEvent>,
        max_concurrent: usize,
    ) -> JoinHandle<()> {
        let semaphore = Arc::new(Semaphore::new(max_concurrent.max(1)));
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                let Ok(permit) = semaphore.clone().acquire_owned().await else {
                    break;
                };
                let this = self.clone();
                tokio::spawn(async move {
                    this.dispatch(&event).await;
                    drop(permit);
                });
            }
            tracing::info!("notification dispatcher stopped");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        events::EventKind,
        test_utils::{InMemorySubscriptionStore, MockAdapter, indexed_event, subscription},
    };
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn retry() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn delivers_only_subscribed_event_types() {
        let store = Arc::new(InMemorySubscriptionStore::new(vec![
            subscription(1, "webhook", "https://example.com/a", &["Revoked"]),
            subscription(2, "webhook", "https://example.com/b", &["Released"]),
            subscription(3, "webhook", "https://example.com/c", &[]),
        ]));
        let webhook = Arc::new(MockAdapter::succeeding(ChannelType::Webhook));
        let dispatcher = NotificationDispatcher::new(store.clone(), retry()).with_adapter(webhook.clone());

        let summary = dispatcher.dispatch(&indexed_event(EventKind::Revoked, 150)).await;

        assert_eq!(
            summary,
            DispatchSummary {
                delivered: 1,
                failed: 0,
                skipped: 0
            }
        );
        assert_eq!(webhook.targets(), vec!["https://example.com/a".to_string()]);
        assert_eq!(store.deliveries(), vec![(1, DeliveryStatus::Delivered)]);
    }

    #[tokio::test(start_paused = true)]
    async fn failing_channel_is_retried_then_marked_failed() {
        let store = Arc::new(InMemorySubscriptionStore::new(vec![
            subscription(1, "webhook", "https://unreachable.example", &["CheckIn"]),
            subscription(2, "email", "owner@example.com", &["CheckIn"]),
        ]));
        let webhook = Arc::new(MockAdapter::failing(ChannelType::Webhook));
        let email = Arc::new(MockAdapter::succeeding(ChannelType::Email));
        let dispatcher = NotificationDispatcher::new(store.clone(), retry())
            .with_adapter(webhook.clone())
            .with_adapter(email.clone());

        let start = tokio::time::Instant::now();
        let summary = dispatcher.dispatch(&indexed_event(EventKind::CheckIn, 7)).await;

        assert_eq!(summary.delivered, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(webhook.targets().len(), 3);
        assert_eq!(email.targets().len(), 1);
        assert_eq!(start.elapsed(), Duration::from_secs(3));

        assert_eq!(
            store.deliveries(),
            vec![(1, DeliveryStatus::Failed), (2, DeliveryStatus::Delivered)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_or_unconfigured_channel_is_skipped() {
        let store = Arc::new(InMemorySubscriptionStore::new(vec![
            subscription(1, "sms", "+100000000", &["Revoked"]),
            subscription(2, "email", "owner@example.com", &["Revoked"]),
        ]));
        let dispatcher = NotificationDispatcher::new(store.clone(), retry())
            .with_adapter(Arc::new(MockAdapter::succeeding(ChannelType::Webhook)));

        let summary = dispatcher.dispatch(&indexed_event(EventKind::Revoked, 1)).await;

        assert_eq!(summary.skipped, 2);
        assert!(store.deliveries().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn push_channel_ends_up_failed() {
        let store = Arc::new(InMemorySubscriptionStore::new(vec![subscription(
            5,
            "push",
            "device-token",
            &["Released"],
        )]));
        let dispatcher =
            NotificationDispatcher::new(store.clone(), retry()).with_adapter(Arc::new(PushChannel));

        let summary = dispatcher.dispatch(&indexed_event(EventKind::Released, 1)).await;

        assert_eq!(summary.failed, 1);
        assert_eq!(store.deliveries(), vec![(5, DeliveryStatus::Failed)]);
    }

    #[tokio::test(start_paused = true)]
    async fn spawned_dispatcher_drains_channel() {
        let store = Arc::new(InMemorySubscriptionStore::new(vec![subscription(
            1,
            "webhook",
            "https://example.com/hook",
            &["CheckIn", "Renewed"],
        )]));
        let webhook = Arc::new(MockAdapter::succeeding(ChannelType::Webhook));
        let dispatcher =
            Arc::new(NotificationDispatcher::new(store.clone(), retry()).with_adapter(webhook.clone()));

        let (tx, rx) = mpsc::unbounded_channel();
        let handle = dispatcher.spawn(rx, 2);
        tx.send(indexed_event(EventKind::CheckIn, 1)).unwrap();
        tx.send(indexed_event(EventKind::Renewed, 2)).unwrap();
        drop(tx);
        handle.await.unwrap();

        // spawned deliveries may still be running after the receiver loop ends
        while store.deliveries().len() < 2 {
            tokio::task::yield_now().await;
        }
        assert_eq!(webhook.targets().len(), 2);
    }
}
