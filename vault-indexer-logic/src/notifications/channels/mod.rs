mod email;
mod push;
mod webhook;

pub use email::EmailChannel;
pub use push::PushChannel;
pub use webhook::WebhookChannel;

use crate::{error::DeliveryError, publish::IndexedEvent};
use async_trait::async_trait;
use strum_macros::{AsRefStr, Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum ChannelType {
    Email,
    Webhook,
    Push,
}

/// Delivers one notification to one subscriber address. A single call is a
/// single attempt; retries are handled by the dispatcher.
#[async_trait]
pub trait ChannelAdapter: Send + Sync {
    fn channel_type(&self) -> ChannelType;

    async fn deliver(&self, target: &str, event: &IndexedEvent) -> Result<(), DeliveryError>;
}

/// First ten characters of a hex package key, as shown to humans.
pub(crate) fn short_key(event: &IndexedEvent) -> String {
    let key = format!("{:#x}", event.package_key);
    format!("{}...", &key[..10])
}
