mod error;
pub mod events;
pub mod lock;
pub mod notifications;
pub mod poller;
pub mod projection;
pub mod publish;
pub mod query;
pub mod reorg;
pub mod repository;
pub mod rpc;
pub mod settings;
pub mod status;
#[cfg(test)]
pub mod test_utils;

pub use error::{DecodeError, DeliveryError, PollError, RpcError};
pub use events::{DecodedEvent, DecodedLog, EventKind, RawLog, VaultEvent, decode_log};
pub use lock::{PollerLock, lock_key};
pub use notifications::{NotificationDispatcher, SubscriptionStore};
pub use poller::{ChainPoller, CycleOutcome, PollerConfig};
pub use projection::PackageProjection;
pub use publish::{EventPublisher, IndexedEvent};
pub use query::{EventPage, EventQuery, EventQueryService};
pub use reorg::{ReorgCheck, ReorgDetector};
pub use rpc::{AlloyChainClient, BlockHeader, ChainClient};
pub use settings::{IndexerSettings, NotificationSettings};
pub use status::SyncStatus;
