//! Read-side cache of a package, derived only from indexed events.
//!
//! The projection is advisory: the contract remains the source of truth and
//! the row may lag behind the chain by the confirmation depth.

use crate::events::VaultEvent;
use alloy::primitives::{Address, B256};
use chrono::{DateTime, NaiveDateTime};
use vault_indexer_entity::sea_orm_active_enums::PackageStatus;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageProjection {
    pub chain_id: i64,
    pub contract_address: Address,
    pub package_key: B256,
    pub owner: Option<Address>,
    pub beneficiary: Option<Address>,
    pub manifest_uri: Option<String>,
    pub status: PackageStatus,
    pub guardians: Vec<Address>,
    pub pending_since: Option<NaiveDateTime>,
    pub released_at: Option<NaiveDateTime>,
    pub last_check_in: Option<NaiveDateTime>,
    pub paid_until: Option<NaiveDateTime>,
    pub last_indexed_block: u64,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectionEffect {
    Applied,
    NoEffect,
    /// The event is older than the last event applied to this package.
    Stale,
}

impl PackageProjection {
    pub fn new(chain_id: i64, contract_address: Address, package_key: B256, now: NaiveDateTime) -> Self {
        Self {
            chain_id,
            contract_address,
            package_key,
            owner: None,
            beneficiary: None,
            manifest_uri: None,
            status: PackageStatus::Active,
            guardians: Vec::new(),
            pending_since: None,
            released_at: None,
            last_check_in: None,
            paid_until: None,
            last_indexed_block: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Applies the effect of `event` observed at `block_number`.
    /// Timestamps of status changes use the processing time `now`.
    pub fn apply(
        &mut self,
        event: &VaultEvent,
        block_number: u64,
        now: NaiveDateTime,
    ) -> ProjectionEffect {
        if block_number < self.last_indexed_block {
            return ProjectionEffect::Stale;
        }

        match event {
            VaultEvent::PackageActivated(activated) => {
                self.status = PackageStatus::Active;
                self.owner = Some(activated.owner);
                self.beneficiary = Some(activated.beneficiary);
                self.manifest_uri = Some(activated.manifest_uri.clone());
                self.guardians = activated.guardians.clone();
            }
            VaultEvent::ManifestUpdated { manifest_uri } => {
                self.manifest_uri = Some(manifest_uri.clone());
            }
            VaultEvent::CheckIn => {
                self.last_check_in = Some(now);
            }
            VaultEvent::Renewed { paid_until } => match unix_seconds(*paid_until) {
                Some(paid_until) => self.paid_until = Some(paid_until),
                None => return ProjectionEffect::NoEffect,
            },
            VaultEvent::PendingRelease(_) => {
                self.status = PackageStatus::PendingRelease;
                self.pending_since = Some(now);
            }
            VaultEvent::Released => {
                self.status = PackageStatus::Released;
                self.released_at = Some(now);
            }
            VaultEvent::Revoked => {
                self.status = PackageStatus::Revoked;
            }
            VaultEvent::PackageRescued => {
                self.status = PackageStatus::Active;
                self.pending_since = None;
            }
            VaultEvent::GuardianApproved { .. }
            | VaultEvent::GuardianVetoed { .. }
            | VaultEvent::GuardianVetoRescinded { .. }
            | VaultEvent::GuardianApproveRescinded { .. }
            | VaultEvent::GuardianStateReset => return ProjectionEffect::NoEffect,
        }

        self.last_indexed_block = block_number;
        self.updated_at = now;
        ProjectionEffect::Applied
    }
}

// Zero means "not set" on chain.
fn unix_seconds(seconds: u64) -> Option<NaiveDateTime> {
    if seconds == 0 {
        return None;
    }
    let seconds = i64::try_from(seconds).ok()?;
    DateTime::from_timestamp(seconds, 0).map(|at| at.naive_utc())
}
