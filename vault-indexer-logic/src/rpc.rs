use crate::{error::RpcError, events::RawLog};
use alloy::{
    eips::BlockNumberOrTag,
    network::Ethereum,
    primitives::{Address, B256},
    providers::{DynProvider, Provider, ProviderBuilder},
    rpc::types::Filter,
    transports::TransportResult,
};
use async_trait::async_trait;
use std::{future::Future, time::Duration};
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockHeader {
    pub number: u64,
    pub hash: B256,
    pub timestamp: u64,
}

#[async_trait]
pub trait ChainClient: Send + Sync {
    async fn current_block_height(&self) -> Result<u64, RpcError>;

    /// All logs emitted by `contract` in the inclusive block range.
    async fn get_logs(&self, contract: Address, from: u64, to: u64)
    -> Result<Vec<RawLog>, RpcError>;

    async fn get_block_header(&self, number: u64) -> Result<BlockHeader, RpcError>;

    async fn get_block_hash(&self, number: u64) -> Result<B256, RpcError> {
        Ok(self.get_block_header(number).await?.hash)
    }

    async fn get_block_timestamp(&self, number: u64) -> Result<u64, RpcError> {
        Ok(self.get_block_header(number).await?.timestamp)
    }
}

#[derive(Clone, Debug)]
pub struct AlloyChainClient {
    provider: DynProvider<Ethereum>,
    timeout: Duration,
}

impl AlloyChainClient {
    pub fn new(provider: DynProvider<Ethereum>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    pub fn connect_http(rpc_url: Url, timeout: Duration) -> Self {
        let provider = ProviderBuilder::new().connect_http(rpc_url).erased();
        Self::new(provider, timeout)
    }

    async fn with_timeout<T>(
        &self,
        method: &'static str,
        call: impl Future<Output = TransportResult<T>>,
    ) -> Result<T, RpcError> {
        tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| RpcError::Timeout(method))?
            .map_err(RpcError::from)
    }
}

#[async_trait]
impl ChainClient for AlloyChainClient {
    async fn current_block_height(&self) -> Result<u64, RpcError> {
        self.with_timeout("eth_blockNumber", async {
            self.provider.get_block_number().await
        })
        .await
    }

    async fn get_logs(
        &self,
        contract: Address,
        from: u64,
        to: u64,
    ) -> Result<Vec<RawLog>, RpcError> {
        let filter = Filter::new()
            .address(contract)
            .from_block(from)
            .to_block(to);
        let logs = self
            .with_timeout("eth_getLogs", async { self.provider.get_logs(&filter).await })
            .await?;

        logs.into_iter()
            .map(|log| RawLog::try_from(log).map_err(RpcError::from))
            .collect()
    }

    async fn get_block_header(&self, number: u64) -> Result<BlockHeader, RpcError> {
        let block = self
            .with_timeout("eth_getBlockByNumber", async {
                self.provider
                    .get_block_by_number(BlockNumberOrTag::Number(number))
                    .await
            })
            .await?
            .ok_or(RpcError::BlockNotFound(number))?;

        Ok(BlockHeader {
            number,
            hash: block.header.hash,
            timestamp: block.header.timestamp,
        })
    }
}
