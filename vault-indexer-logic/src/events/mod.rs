pub mod abi;
mod decoder;
mod types;

pub use decoder::{DecodedEvent, DecodedLog, RawLog, decode_log};
pub use types::{EventKind, PackageActivated, PendingRelease, VaultEvent};
