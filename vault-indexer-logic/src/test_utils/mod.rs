use crate::{
    events::{EventKind, RawLog},
    publish::IndexedEvent,
};
use alloy::primitives::{Address, B256, LogData, U256, address, keccak256};
use blockscout_service_launcher::test_database::TestDbGuard;
use chrono::NaiveDateTime;
use sea_orm::{ActiveValue::Set, ConnectionTrait, EntityTrait};
use serde_json::json;
use vault_indexer_entity::{event_records, notification_subscriptions};

mod mock_chain;
mod mock_notifications;

pub use mock_chain::MockChainClient;
pub use mock_notifications::{InMemorySubscriptionStore, MockAdapter, RecordingPublisher};

pub const CHAIN_ID: i64 = 11155111;
pub const CONTRACT: Address = address!("0x5FbDB2315678afecb367f032d93F642f64180aa3");
pub const PACKAGE_KEY: B256 = B256::repeat_byte(0xaa);

pub async fn init_db(name: &str) -> TestDbGuard {
    TestDbGuard::new::<migration::Migrator>(name).await
}

pub fn block_hash(number: u64) -> B256 {
    keccak256(number.to_be_bytes())
}

pub fn block_timestamp(number: u64) -> u64 {
    1_700_000_000 + number * 12
}

pub fn tx_hash(block_number: u64, log_index: u64) -> B256 {
    B256::from(U256::from((block_number << 32) | log_index))
}

/// A log emitted by [`CONTRACT`] at the given position, in a block whose hash
/// is [`block_hash`].
pub fn raw_log(data: LogData, block_number: u64, log_index: u64) -> RawLog {
    let (topics, data) = data.split();
    RawLog {
        address: CONTRACT,
        topics,
        data,
        block_number,
        block_hash: block_hash(block_number),
        block_timestamp: Some(block_timestamp(block_number)),
        tx_hash: tx_hash(block_number, log_index),
        log_index,
    }
}

pub async fn insert_event_record<C: ConnectionTrait>(db: &C, block_number: u64, log_index: u64) {
    event_records::Entity::insert(event_records::ActiveModel {
        chain_id: Set(CHAIN_ID),
        contract_address: Set(CONTRACT.to_vec()),
        package_key: Set(PACKAGE_KEY.to_vec()),
        event_type: Set(EventKind::CheckIn.to_string()),
        emitting_address: Set(CONTRACT.to_vec()),
        block_number: Set(block_number as i64),
        block_hash: Set(block_hash(block_number).to_vec()),
        tx_hash: Set(tx_hash(block_number, log_index).to_vec()),
        log_index: Set(log_index as i64),
        block_timestamp: Set(NaiveDateTime::default()),
        payload: Set(json!({})),
        created_at: Set(NaiveDateTime::default()),
        ..Default::default()
    })
    .exec(db)
    .await
    .unwrap();
}

pub fn indexed_event(kind: EventKind, block_number: u64) -> IndexedEvent {
    IndexedEvent {
        chain_id: CHAIN_ID,
        contract_address: CONTRACT,
        package_key: PACKAGE_KEY,
        kind,
        block_number,
        tx_hash: tx_hash(block_number, 0),
        log_index: 0,
        payload: json!({}),
    }
}

pub fn subscription(
    id: i64,
    channel_type: &str,
    channel_value: &str,
    event_types: &[&str],
) -> notification_subscriptions::Model {
    notification_subscriptions::Model {
        id,
        chain_id: CHAIN_ID,
        contract_address: CONTRACT.to_vec(),
        package_key: PACKAGE_KEY.to_vec(),
        subscriber_address: Address::repeat_byte(0x11).to_vec(),
        event_types: event_types.iter().map(|t| t.to_string()).collect(),
        channel_type: channel_type.to_string(),
        channel_value: channel_value.to_string(),
        active: true,
        created_at: NaiveDateTime::default(),
        last_delivery_attempt: None,
        last_delivery_status: None,
    }
}
