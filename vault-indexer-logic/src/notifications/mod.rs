pub mod channels;
mod dispatcher;
pub mod retry;
mod store;
pub mod subscriptions;

pub use channels::{ChannelAdapter, ChannelType};
pub use dispatcher::{DispatchSummary, NotificationDispatcher};
pub use retry::{RetryExhausted, RetryPolicy};
pub use store::{DbSubscriptionStore, SubscriptionStore};
