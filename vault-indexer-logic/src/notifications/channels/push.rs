use super::{ChannelAdapter, ChannelType};
use crate::{error::DeliveryError, publish::IndexedEvent};
use async_trait::async_trait;

/// Placeholder for push notifications. Every attempt fails, so subscriptions
/// on this channel end up with a recorded `failed` delivery.
#[derive(Debug, Default, Clone)]
pub struct PushChannel;

#[async_trait]
impl ChannelAdapter for PushChannel {
    fn channel_type(&self) -> ChannelType {
        ChannelType::Push
    }

    async fn deliver(&self, _target: &str, _event: &IndexedEvent) -> Result<(), DeliveryError> {
        Err(DeliveryError::NotImplemented(ChannelType::Push))
    }
}
