use super::{block_hash, block_timestamp};
use crate::{
    error::RpcError,
    events::RawLog,
    rpc::{BlockHeader, ChainClient},
};
use alloy::primitives::{Address, B256};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::{collections::HashMap, sync::Arc};

/// In-memory chain with controllable head, logs and block hashes.
#[derive(Clone, Default)]
pub struct MockChainClient {
    head: Arc<RwLock<u64>>,
    logs: Arc<RwLock<Vec<RawLog>>>,
    hashes: Arc<RwLock<HashMap<u64, B256>>>,
    should_fail: Arc<RwLock<bool>>,
    get_logs_calls: Arc<RwLock<Vec<(u64, u64)>>>,
}

impl MockChainClient {
    pub fn new(head: u64) -> Self {
        let client = Self::default();
        client.set_head(head);
        client
    }

    pub fn set_head(&self, head: u64) {
        *self.head.write() = head;
    }

    pub fn push_log(&self, log: RawLog) {
        self.logs.write().push(log);
    }

    pub fn set_should_fail(&self, fail: bool) {
        *self.should_fail.write() = fail;
    }

    /// Replaces block `number` with a sibling: its hash changes and its logs
    /// are replaced by `logs`.
    pub fn reorg_block(&self, number: u64, hash: B256, logs: Vec<RawLog>) {
        self.hashes.write().insert(number, hash);
        let mut stored = self.logs.write();
        stored.retain(|log| log.block_number != number);
        stored.extend(logs.into_iter().map(|log| RawLog {
            block_hash: hash,
            ..log
        }));
    }

    /// Ranges passed to `get_logs`, in call order.
    pub fn get_logs_calls(&self) -> Vec<(u64, u64)> {
        self.get_logs_calls.read().clone()
    }

    fn check_failure(&self) -> Result<(), RpcError> {
        if *self.should_fail.read() {
            return Err(RpcError::Timeout("mock"));
        }
        Ok(())
    }
}

#[async_trait]
impl ChainClient for MockChainClient {
    async fn current_block_height(&self) -> Result<u64, RpcError> {
        self.check_failure()?;
        Ok(*self.head.read())
    }

    async fn get_logs(
        &self,
        contract: Address,
        from: u64,
        to: u64,
    ) -> Result<Vec<RawLog>, RpcError> {
        self.check_failure()?;
        self.get_logs_calls.write().push((from, to));
        let logs = self
            .logs
            .read()
            .iter()
            .filter(|log| log.address == contract && (from..=to).contains(&log.block_number))
            .cloned()
            .collect();
        Ok(logs)
    }

    async fn get_block_header(&self, number: u64) -> Result<BlockHeader, RpcError> {
        self.check_failure()?;
        if number > *self.head.read() {
            return Err(RpcError::BlockNotFound(number));
        }
        let hash = self
            .hashes
            .read()
            .get(&number)
            .copied()
            .unwrap_or_else(|| block_hash(number));
        Ok(BlockHeader {
            number,
            hash,
            timestamp: block_timestamp(number),
        })
    }
}
