use alloy::primitives::Address;
use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use std::time::Duration;
use url::Url;

#[serde_as]
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct IndexerSettings {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    pub chain_id: i64,
    pub contract_address: Address,
    pub rpc_url: Url,
    #[serde(default = "default_confirmation_depth")]
    pub confirmation_depth: u64,
    #[serde(default)]
    pub start_block: u64,
    #[serde(default = "default_poll_interval")]
    #[serde_as(as = "serde_with::DurationSeconds<u64>")]
    pub poll_interval: Duration,
    #[serde(default = "default_rpc_timeout")]
    #[serde_as(as = "serde_with::DurationSeconds<u64>")]
    pub rpc_timeout: Duration,
    #[serde(default = "default_max_block_range")]
    pub max_block_range: u64,
    #[serde(default = "default_block_fetch_concurrency")]
    pub block_fetch_concurrency: usize,
    /// Overrides the advisory lock key derived from the contract address.
    #[serde(default)]
    pub lock_id: Option<i64>,
}

impl IndexerSettings {
    pub fn new(chain_id: i64, contract_address: Address, rpc_url: Url) -> Self {
        Self {
            enabled: default_enabled(),
            chain_id,
            contract_address,
            rpc_url,
            confirmation_depth: default_confirmation_depth(),
            start_block: 0,
            poll_interval: default_poll_interval(),
            rpc_timeout: default_rpc_timeout(),
            max_block_range: default_max_block_range(),
            block_fetch_concurrency: default_block_fetch_concurrency(),
            lock_id: None,
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.max_block_range == 0 {
            anyhow::bail!("indexer.max_block_range must be greater than zero");
        }
        if self.block_fetch_concurrency == 0 {
            anyhow::bail!("indexer.block_fetch_concurrency must be greater than zero");
        }
        Ok(())
    }
}

fn default_enabled() -> bool {
    true
}

fn default_confirmation_depth() -> u64 {
    12
}

fn default_poll_interval() -> Duration {
    Duration::from_secs(15)
}

fn default_rpc_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_max_block_range() -> u64 {
    1000
}

fn default_block_fetch_concurrency() -> usize {
    10
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct NotificationSettings {
    pub enabled: bool,
    pub max_concurrent_deliveries: usize,
    pub retry: RetrySettings,
    pub webhook: WebhookSettings,
    pub email: Option<EmailSettings>,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            max_concurrent_deliveries: 8,
            retry: Default::default(),
            webhook: Default::default(),
            email: None,
        }
    }
}

impl NotificationSettings {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.retry.max_attempts == 0 {
            anyhow::bail!("notifications.retry.max_attempts must be greater than zero");
        }
        if self.max_concurrent_deliveries == 0 {
            anyhow::bail!("notifications.max_concurrent_deliveries must be greater than zero");
        }
        Ok(())
    }
}

#[serde_as]
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct RetrySettings {
    pub max_attempts: u32,
    #[serde_as(as = "serde_with::DurationMilliSeconds<u64>")]
    pub base_delay: Duration,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
        }
    }
}

#[serde_as]
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct WebhookSettings {
    #[serde_as(as = "serde_with::DurationSeconds<u64>")]
    pub timeout: Duration,
}

impl Default for WebhookSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
        }
    }
}

#[serde_as]
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct EmailSettings {
    pub smtp_host: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    pub from: String,
    #[serde(default = "default_smtp_timeout")]
    #[serde_as(as = "serde_with::DurationSeconds<u64>")]
    pub timeout: Duration,
}

fn default_smtp_port() -> u16 {
    587
}

fn default_smtp_timeout() -> Duration {
    Duration::from_secs(10)
}
