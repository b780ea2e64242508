use super::{
    abi::IPackagePolicy,
    types::{EventKind, PackageActivated, PendingRelease, VaultEvent},
};
use crate::error::DecodeError;
use alloy::{
    primitives::{Address, B256, Bytes, LogData, U256},
    rpc::types::Log,
    sol_types::{SolEvent, SolType, sol_data},
};

/// A confirmed contract log with its chain location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLog {
    pub address: Address,
    pub topics: Vec<B256>,
    pub data: Bytes,
    pub block_number: u64,
    pub block_hash: B256,
    pub block_timestamp: Option<u64>,
    pub tx_hash: B256,
    pub log_index: u64,
}

impl TryFrom<Log> for RawLog {
    type Error = DecodeError;

    fn try_from(log: Log) -> Result<Self, Self::Error> {
        if log.removed {
            return Err(DecodeError::RemovedLog);
        }
        let block_number = log
            .block_number
            .ok_or(DecodeError::IncompleteLog("block number"))?;
        let block_hash = log
            .block_hash
            .ok_or(DecodeError::IncompleteLog("block hash"))?;
        let tx_hash = log
            .transaction_hash
            .ok_or(DecodeError::IncompleteLog("transaction hash"))?;
        let log_index = log
            .log_index
            .ok_or(DecodeError::IncompleteLog("log index"))?;
        let address = log.inner.address;
        let (topics, data) = log.inner.data.split();

        Ok(Self {
            address,
            topics,
            data,
            block_number,
            block_hash,
            block_timestamp: log.block_timestamp,
            tx_hash,
            log_index,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedEvent {
    pub package_key: B256,
    pub event: VaultEvent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedLog {
    Known(DecodedEvent),
    /// topic0 of the log, if it had one.
    Unrecognized(Option<B256>),
}

pub fn decode_log(log: &RawLog) -> Result<DecodedLog, DecodeError> {
    let Some(topic0) = log.topics.first() else {
        return Ok(DecodedLog::Unrecognized(None));
    };
    let Some(kind) = EventKind::from_signature_hash(topic0) else {
        return Ok(DecodedLog::Unrecognized(Some(*topic0)));
    };
    let package_key = *log
        .topics
        .get(1)
        .ok_or(DecodeError::MissingPackageKey(kind))?;

    let log_data = LogData::new_unchecked(log.topics.clone(), log.data.clone());
    let event = match kind {
        EventKind::PackageActivated => {
            let event = decode_event::<IPackagePolicy::PackageActivated>(kind, &log_data)?;
            VaultEvent::PackageActivated(PackageActivated {
                owner: event.owner,
                beneficiary: event.beneficiary,
                manifest_uri: event.manifestUri,
                guardians: event.guardians,
                guardian_quorum: narrow(kind, "guardianQuorum", event.guardianQuorum)?,
                warn_threshold: narrow(kind, "warnThreshold", event.warnThreshold)?,
                inactivity_threshold: narrow(
                    kind,
                    "inactivityThreshold",
                    event.inactivityThreshold,
                )?,
            })
        }
        EventKind::ManifestUpdated => {
            let event = decode_event::<IPackagePolicy::ManifestUpdated>(kind, &log_data)?;
            VaultEvent::ManifestUpdated {
                manifest_uri: event.manifestUri,
            }
        }
        EventKind::CheckIn => {
            decode_event::<IPackagePolicy::CheckIn>(kind, &log_data)?;
            VaultEvent::CheckIn
        }
        EventKind::Renewed => {
            let event = decode_event::<IPackagePolicy::Renewed>(kind, &log_data)?;
            VaultEvent::Renewed {
                paid_until: narrow(kind, "paidUntil", event.paidUntil)?,
            }
        }
        EventKind::GuardianApproved => VaultEvent::GuardianApproved {
            guardian: guardian_address(kind, log)?,
        },
        EventKind::GuardianVetoed => VaultEvent::GuardianVetoed {
            guardian: guardian_address(kind, log)?,
        },
        EventKind::GuardianVetoRescinded => VaultEvent::GuardianVetoRescinded {
            guardian: guardian_address(kind, log)?,
        },
        EventKind::GuardianApproveRescinded => VaultEvent::GuardianApproveRescinded {
            guardian: guardian_address(kind, log)?,
        },
        EventKind::GuardianStateReset => {
            decode_event::<IPackagePolicy::GuardianStateReset>(kind, &log_data)?;
            VaultEvent::GuardianStateReset
        }
        EventKind::PendingRelease => {
            let event = decode_event::<IPackagePolicy::PendingRelease>(kind, &log_data)?;
            VaultEvent::PendingRelease(PendingRelease::from_flags(narrow(
                kind,
                "reasonFlags",
                event.reasonFlags,
            )?))
        }
        EventKind::Released => {
            decode_event::<IPackagePolicy::Released>(kind, &log_data)?;
            VaultEvent::Released
        }
        EventKind::Revoked => {
            decode_event::<IPackagePolicy::Revoked>(kind, &log_data)?;
            VaultEvent::Revoked
        }
        EventKind::PackageRescued => {
            decode_event::<IPackagePolicy::PackageRescued>(kind, &log_data)?;
            VaultEvent::PackageRescued
        }
    };

    Ok(DecodedLog::Known(DecodedEvent { package_key, event }))
}

fn decode_event<E: SolEvent>(kind: EventKind, log_data: &LogData) -> Result<E, DecodeError> {
    E::decode_log_data(log_data).map_err(|source| DecodeError::Payload { kind, source })
}

fn narrow(kind: EventKind, field: &'static str, value: U256) -> Result<u64, DecodeError> {
    u64::try_from(value).map_err(|_| DecodeError::ValueOutOfRange { kind, field })
}

// Older deployments emit the guardian unindexed, in the data section.
fn guardian_address(kind: EventKind, log: &RawLog) -> Result<Address, DecodeError> {
    if let Some(topic) = log.topics.get(2) {
        return Ok(Address::from_word(*topic));
    }
    <sol_data::Address as SolType>::abi_decode(&log.data)
        .map_err(|source| DecodeError::Payload { kind, source })
}
