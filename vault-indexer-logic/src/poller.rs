use crate::{
    error::PollError,
    events::{DecodedEvent, DecodedLog, RawLog, decode_log},
    projection::{PackageProjection, ProjectionEffect},
    publish::{EventPublisher, IndexedEvent},
    reorg::{ReorgCheck, ReorgDetector},
    repository::{event_records, package_projections, processed_blocks},
    rpc::{BlockHeader, ChainClient},
    settings::IndexerSettings,
    status::SyncStatus,
};
use alloy::primitives::{Address, B256};
use chrono::{DateTime, NaiveDateTime, Utc};
use futures::{StreamExt, TryStreamExt, stream};
use itertools::{Either, Itertools};
use sea_orm::{ActiveValue::Set, DatabaseConnection, TransactionTrait};
use std::{collections::HashMap, sync::Arc, time::Duration};
use tokio::task::JoinHandle;
use tracing::instrument;
use vault_indexer_entity::event_records::ActiveModel as EventRecordModel;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollerConfig {
    pub chain_id: i64,
    pub contract_address: Address,
    pub confirmation_depth: u64,
    pub start_block: u64,
    pub poll_interval: Duration,
    pub max_block_range: u64,
    pub block_fetch_concurrency: usize,
}

impl From<&IndexerSettings> for PollerConfig {
    fn from(settings: &IndexerSettings) -> Self {
        Self {
            chain_id: settings.chain_id,
            contract_address: settings.contract_address,
            confirmation_depth: settings.confirmation_depth,
            start_block: settings.start_block,
            poll_interval: settings.poll_interval,
            max_block_range: settings.max_block_range.max(1),
            block_fetch_concurrency: settings.block_fetch_concurrency.max(1),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleStats {
    pub stored: usize,
    pub duplicates: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Nothing new is confirmed yet.
    Idle,
    Indexed { from: u64, to: u64, stats: CycleStats },
    /// A reorg was detected and indexed state was purged from `fork_point`.
    Rewound { fork_point: u64 },
}

enum LogOutcome {
    Stored,
    Duplicate,
    Skipped,
    Rewound { fork_point: u64 },
}

/// Per-cycle knowledge about blocks in the scanned range.
#[derive(Default)]
struct BlockCache {
    headers: HashMap<u64, BlockHeader>,
    hashes: HashMap<u64, B256>,
}

pub struct ChainPoller {
    db: Arc<DatabaseConnection>,
    client: Arc<dyn ChainClient>,
    publisher: Arc<dyn EventPublisher>,
    reorg: ReorgDetector,
    status: Arc<SyncStatus>,
    config: PollerConfig,
}

impl ChainPoller {
    pub fn new(
        db: Arc<DatabaseConnection>,
        client: Arc<dyn ChainClient>,
        publisher: Arc<dyn EventPublisher>,
        status: Arc<SyncStatus>,
        config: PollerConfig,
    ) -> Self {
        let reorg = ReorgDetector::new(db.clone(), config.chain_id, config.contract_address);
        Self {
            db,
            client,
            publisher,
            reorg,
            status,
            config,
        }
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Runs cycles forever with a fixed delay between the end of one cycle
    /// and the start of the next.
    pub async fn run(self) {
        tracing::info!(
            chain_id = self.config.chain_id,
            contract = %self.config.contract_address,
            start_block = self.config.start_block,
            confirmation_depth = self.config.confirmation_depth,
            "starting chain poller"
        );

        loop {
            match self.run_cycle().await {
                Ok(CycleOutcome::Indexed { from, to, stats }) => {
                    tracing::info!(
                        from,
                        to,
                        stored = stats.stored,
                        duplicates = stats.duplicates,
                        skipped = stats.skipped,
                        "indexed block range"
                    );
                }
                Ok(CycleOutcome::Rewound { fork_point }) => {
                    tracing::warn!(fork_point, "poll cycle ended by reorg rewind");
                }
                Ok(CycleOutcome::Idle) => {
                    tracing::debug!("no new confirmed blocks");
                }
                Err(err) => {
                    tracing::error!(err = ?err, "poll cycle failed, range will be retried");
                }
            }
            tokio::time::sleep(self.config.poll_interval).await;
        }
    }

    #[instrument(
        name = "poll_cycle",
        skip_all,
        level = "debug",
        fields(chain_id = self.config.chain_id)
    )]
    pub async fn run_cycle(&self) -> Result<CycleOutcome, PollError> {
        let head = self.client.current_block_height().await?;
        let Some(confirmed_head) = head.checked_sub(self.config.confirmation_depth) else {
            self.status.mark_synced(Utc::now());
            return Ok(CycleOutcome::Idle);
        };

        let last_processed = processed_blocks::max_block_number(
            self.db.as_ref(),
            self.config.chain_id,
            self.config.contract_address,
        )
        .await?;
        let from = match last_processed {
            Some(last) => last + 1,
            None => self.config.start_block,
        };
        if from > confirmed_head {
            self.status.mark_synced(Utc::now());
            return Ok(CycleOutcome::Idle);
        }

        if let Some(tip) = last_processed {
            let hash = self.client.get_block_hash(tip).await?;
            if let ReorgCheck::Rewound { fork_point } = self.reorg.check(tip, hash).await? {
                return Ok(CycleOutcome::Rewound { fork_point });
            }
        }

        let range_end = from.saturating_add(self.config.max_block_range.saturating_sub(1));
        let to = confirmed_head.min(range_end);
        let mut logs = self
            .client
            .get_logs(self.config.contract_address, from, to)
            .await?;
        logs.sort_by_key(|log| (log.block_number, log.log_index));
        tracing::debug!(from, to, logs = logs.len(), "fetched contract logs");

        let mut blocks = BlockCache::default();
        let mut stats = CycleStats::default();
        for log in &logs {
            match self.process_log(log, &mut blocks).await? {
                LogOutcome::Stored => stats.stored += 1,
                LogOutcome::Duplicate => stats.duplicates += 1,
                LogOutcome::Skipped => stats.skipped += 1,
                LogOutcome::Rewound { fork_point } => {
                    return Ok(CycleOutcome::Rewound { fork_point });
                }
            }
        }

        self.mark_processed(from, to, &blocks).await?;
        self.status.mark_synced(Utc::now());

        Ok(CycleOutcome::Indexed { from, to, stats })
    }

    async fn process_log(
        &self,
        log: &RawLog,
        blocks: &mut BlockCache,
    ) -> Result<LogOutcome, PollError> {
        let decoded = match decode_log(log) {
            Ok(DecodedLog::Known(decoded)) => decoded,
            Ok(DecodedLog::Unrecognized(topic0)) => {
                tracing::debug!(
                    block_number = log.block_number,
                    tx_hash = %log.tx_hash,
                    log_index = log.log_index,
                    topic0 = ?topic0,
                    "skipping unrecognized log"
                );
                return Ok(LogOutcome::Skipped);
            }
            Err(err) => {
                tracing::warn!(
                    err = %err,
                    block_number = log.block_number,
                    tx_hash = %log.tx_hash,
                    log_index = log.log_index,
                    "failed to decode log, skipping"
                );
                return Ok(LogOutcome::Skipped);
            }
        };

        if let ReorgCheck::Rewound { fork_point } =
            self.reorg.check(log.block_number, log.block_hash).await?
        {
            return Ok(LogOutcome::Rewound { fork_point });
        }
        blocks.hashes.insert(log.block_number, log.block_hash);

        if event_records::exists(self.db.as_ref(), log.tx_hash, log.log_index).await? {
            tracing::debug!(
                tx_hash = %log.tx_hash,
                log_index = log.log_index,
                "event already indexed"
            );
            return Ok(LogOutcome::Duplicate);
        }

        let block_timestamp = match log.block_timestamp {
            Some(timestamp) => timestamp,
            None => self.block_header(log.block_number, blocks).await?.timestamp,
        };
        let indexed = self.to_indexed_event(log, &decoded)?;
        let now = Utc::now().naive_utc();
        let block_time = unix_to_naive(block_timestamp).unwrap_or_else(|| {
            tracing::warn!(
                block_number = log.block_number,
                block_timestamp,
                "block timestamp out of range, storing processing time instead"
            );
            now
        });

        let tx = self.db.begin().await?;
        let inserted =
            event_records::insert(&tx, new_event_record(log, &indexed, block_time, now)).await?;
        if !inserted {
            tx.rollback().await?;
            return Ok(LogOutcome::Duplicate);
        }

        let existing = package_projections::find(
            &tx,
            self.config.chain_id,
            self.config.contract_address,
            decoded.package_key,
        )
        .await?;
        let is_new = existing.is_none();
        let mut projection = existing.unwrap_or_else(|| {
            PackageProjection::new(
                self.config.chain_id,
                self.config.contract_address,
                decoded.package_key,
                now,
            )
        });
        match projection.apply(&decoded.event, log.block_number, now) {
            ProjectionEffect::Applied => {
                package_projections::upsert(&tx, &projection).await?;
            }
            // the package row exists from its first event on, even when that
            // event leaves every field untouched
            ProjectionEffect::NoEffect if is_new => {
                package_projections::upsert(&tx, &projection).await?;
            }
            ProjectionEffect::Stale => {
                tracing::debug!(
                    package_key = %decoded.package_key,
                    block_number = log.block_number,
                    last_indexed_block = projection.last_indexed_block,
                    "event older than projection, not applied"
                );
            }
            ProjectionEffect::NoEffect => {}
        }
        tx.commit().await?;

        self.publisher.publish(indexed);
        Ok(LogOutcome::Stored)
    }

    async fn block_header(
        &self,
        number: u64,
        blocks: &mut BlockCache,
    ) -> Result<BlockHeader, PollError> {
        if let Some(header) = blocks.headers.get(&number) {
            return Ok(*header);
        }
        let header = self.client.get_block_header(number).await?;
        blocks.headers.insert(number, header);
        Ok(header)
    }

    async fn mark_processed(&self, from: u64, to: u64, blocks: &BlockCache) -> Result<(), PollError> {
        let known = |number: u64| {
            blocks
                .hashes
                .get(&number)
                .copied()
                .or_else(|| blocks.headers.get(&number).map(|header| header.hash))
        };

        let (mut marks, missing): (Vec<(u64, B256)>, Vec<u64>) =
            (from..=to).partition_map(|number| match known(number) {
                Some(hash) => Either::Left((number, hash)),
                None => Either::Right(number),
            });

        let fetched: Vec<(u64, B256)> = stream::iter(missing)
            .map(|number| async move {
                self.client
                    .get_block_hash(number)
                    .await
                    .map(|hash| (number, hash))
            })
            .buffer_unordered(self.config.block_fetch_concurrency)
            .try_collect()
            .await?;
        marks.extend(fetched);

        processed_blocks::insert_many(
            self.db.as_ref(),
            self.config.chain_id,
            self.config.contract_address,
            marks,
        )
        .await?;
        Ok(())
    }

    fn to_indexed_event(
        &self,
        log: &RawLog,
        decoded: &DecodedEvent,
    ) -> Result<IndexedEvent, PollError> {
        Ok(IndexedEvent {
            chain_id: self.config.chain_id,
            contract_address: self.config.contract_address,
            package_key: decoded.package_key,
            kind: decoded.event.kind(),
            block_number: log.block_number,
            tx_hash: log.tx_hash,
            log_index: log.log_index,
            payload: decoded.event.payload()?,
        })
    }
}

fn new_event_record(
    log: &RawLog,
    event: &IndexedEvent,
    block_timestamp: NaiveDateTime,
    now: NaiveDateTime,
) -> EventRecordModel {
    EventRecordModel {
        chain_id: Set(event.chain_id),
        contract_address: Set(event.contract_address.to_vec()),
        package_key: Set(event.package_key.to_vec()),
        event_type: Set(event.kind.to_string()),
        emitting_address: Set(log.address.to_vec()),
        block_number: Set(log.block_number as i64),
        block_hash: Set(log.block_hash.to_vec()),
        tx_hash: Set(log.tx_hash.to_vec()),
        log_index: Set(log.log_index as i64),
        block_timestamp: Set(block_timestamp),
        payload: Set(event.payload.clone()),
        created_at: Set(now),
        ..Default::default()
    }
}

fn unix_to_naive(seconds: u64) -> Option<NaiveDateTime> {
    i64::try_from(seconds)
        .ok()
        .and_then(|seconds| DateTime::from_timestamp(seconds, 0))
        .map(|time| time.naive_utc())
}
