use crate::repository::{event_records, package_projections, processed_blocks};
use alloy::primitives::{Address, B256};
use sea_orm::{DatabaseConnection, DbErr, TransactionTrait};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReorgCheck {
    Consistent,
    /// Everything at or above `fork_point` was purged.
    Rewound { fork_point: u64 },
}

/// Compares observed block hashes with the processed-range ledger.
///
/// Only the observed block itself is compared; a fork that started below it
/// is detected once that lower block is observed again.
#[derive(Clone)]
pub struct ReorgDetector {
    db: Arc<DatabaseConnection>,
    chain_id: i64,
    contract: Address,
}

impl ReorgDetector {
    pub fn new(db: Arc<DatabaseConnection>, chain_id: i64, contract: Address) -> Self {
        Self {
            db,
            chain_id,
            contract,
        }
    }

    pub async fn check(&self, block_number: u64, observed_hash: B256) -> Result<ReorgCheck, DbErr> {
        let stored = processed_blocks::find_hash(
            self.db.as_ref(),
            self.chain_id,
            self.contract,
            block_number,
        )
        .await?;

        match stored {
            Some(stored) if stored != observed_hash => {
                tracing::warn!(
                    chain_id = self.chain_id,
                    block_number,
                    %stored,
                    observed = %observed_hash,
                    "chain reorganization detected, rewinding"
                );
                self.rewind(block_number).await?;
                Ok(ReorgCheck::Rewound {
                    fork_point: block_number,
                })
            }
            _ => Ok(ReorgCheck::Consistent),
        }
    }

    /// Deletes events and ledger entries at or above `fork_point` atomically.
    pub async fn rewind(&self, fork_point: u64) -> Result<(), DbErr> {
        let tx = self.db.begin().await?;

        let events =
            event_records::delete_from(&tx, self.chain_id, self.contract, fork_point).await?;
        let blocks =
            processed_blocks::delete_from(&tx, self.chain_id, self.contract, fork_point).await?;
        let projections = package_projections::clamp_last_indexed_block(
            &tx,
            self.chain_id,
            self.contract,
            fork_point,
        )
        .await?;

        tx.commit().await?;

        tracing::info!(
            chain_id = self.chain_id,
            fork_point,
            events,
            blocks,
            projections,
            "rewound indexed state"
        );
        Ok(())
    }
}
