use super::abi::IPackagePolicy;
use alloy::{
    primitives::{Address, B256},
    sol_types::SolEvent,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
    Serialize,
    Deserialize,
)]
pub enum EventKind {
    PackageActivated,
    ManifestUpdated,
    CheckIn,
    Renewed,
    GuardianApproved,
    GuardianVetoed,
    GuardianVetoRescinded,
    GuardianApproveRescinded,
    GuardianStateReset,
    PendingRelease,
    Released,
    Revoked,
    PackageRescued,
}

impl EventKind {
    pub fn from_signature_hash(topic0: &B256) -> Option<Self> {
        let kind = match *topic0 {
            IPackagePolicy::PackageActivated::SIGNATURE_HASH => Self::PackageActivated,
            IPackagePolicy::ManifestUpdated::SIGNATURE_HASH => Self::ManifestUpdated,
            IPackagePolicy::CheckIn::SIGNATURE_HASH => Self::CheckIn,
            IPackagePolicy::Renewed::SIGNATURE_HASH => Self::Renewed,
            IPackagePolicy::GuardianApproved::SIGNATURE_HASH => Self::GuardianApproved,
            IPackagePolicy::GuardianVetoed::SIGNATURE_HASH => Self::GuardianVetoed,
            IPackagePolicy::GuardianVetoRescinded::SIGNATURE_HASH => Self::GuardianVetoRescinded,
            IPackagePolicy::GuardianApproveRescinded::SIGNATURE_HASH => {
                Self::GuardianApproveRescinded
            }
            IPackagePolicy::GuardianStateReset::SIGNATURE_HASH => Self::GuardianStateReset,
            IPackagePolicy::PendingRelease::SIGNATURE_HASH => Self::PendingRelease,
            IPackagePolicy::Released::SIGNATURE_HASH => Self::Released,
            IPackagePolicy::Revoked::SIGNATURE_HASH => Self::Revoked,
            IPackagePolicy::PackageRescued::SIGNATURE_HASH => Self::PackageRescued,
            _ => return None,
        };
        Some(kind)
    }

    pub fn signature_hash(self) -> B256 {
        match self {
            Self::PackageActivated => IPackagePolicy::PackageActivated::SIGNATURE_HASH,
            Self::ManifestUpdated => IPackagePolicy::ManifestUpdated::SIGNATURE_HASH,
            Self::CheckIn => IPackagePolicy::CheckIn::SIGNATURE_HASH,
            Self::Renewed => IPackagePolicy::Renewed::SIGNATURE_HASH,
            Self::GuardianApproved => IPackagePolicy::GuardianApproved::SIGNATURE_HASH,
            Self::GuardianVetoed => IPackagePolicy::GuardianVetoed::SIGNATURE_HASH,
            Self::GuardianVetoRescinded => IPackagePolicy::GuardianVetoRescinded::SIGNATURE_HASH,
            Self::GuardianApproveRescinded => {
                IPackagePolicy::GuardianApproveRescinded::SIGNATURE_HASH
            }
            Self::GuardianStateReset => IPackagePolicy::GuardianStateReset::SIGNATURE_HASH,
            Self::PendingRelease => IPackagePolicy::PendingRelease::SIGNATURE_HASH,
            Self::Released => IPackagePolicy::Released::SIGNATURE_HASH,
            Self::Revoked => IPackagePolicy::Revoked::SIGNATURE_HASH,
            Self::PackageRescued => IPackagePolicy::PackageRescued::SIGNATURE_HASH,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageActivated {
    pub owner: Address,
    pub beneficiary: Address,
    pub manifest_uri: String,
    pub guardians: Vec<Address>,
    pub guardian_quorum: u64,
    pub warn_threshold: u64,
    pub inactivity_threshold: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PendingRelease {
    pub reason_flags: u64,
    pub inactivity: bool,
    pub funding_lapse: bool,
}

impl PendingRelease {
    pub fn from_flags(reason_flags: u64) -> Self {
        Self {
            reason_flags,
            inactivity: reason_flags & 1 != 0,
            funding_lapse: reason_flags & 2 != 0,
        }
    }
}

/// Decoded policy contract event. Guardian votes are recorded but never
/// change the package projection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VaultEvent {
    PackageActivated(PackageActivated),
    ManifestUpdated { manifest_uri: String },
    CheckIn,
    /// Unix timestamp in seconds.
    Renewed { paid_until: u64 },
    GuardianApproved { guardian: Address },
    GuardianVetoed { guardian: Address },
    GuardianVetoRescinded { guardian: Address },
    GuardianApproveRescinded { guardian: Address },
    GuardianStateReset,
    PendingRelease(PendingRelease),
    Released,
    Revoked,
    PackageRescued,
}

impl VaultEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::PackageActivated(_) => EventKind::PackageActivated,
            Self::ManifestUpdated { .. } => EventKind::ManifestUpdated,
            Self::CheckIn => EventKind::CheckIn,
            Self::Renewed { .. } => EventKind::Renewed,
            Self::GuardianApproved { .. } => EventKind::GuardianApproved,
            Self::GuardianVetoed { .. } => EventKind::GuardianVetoed,
            Self::GuardianVetoRescinded { .. } => EventKind::GuardianVetoRescinded,
            Self::GuardianApproveRescinded { .. } => EventKind::GuardianApproveRescinded,
            Self::GuardianStateReset => EventKind::GuardianStateReset,
            Self::PendingRelease(_) => EventKind::PendingRelease,
            Self::Released => EventKind::Released,
            Self::Revoked => EventKind::Revoked,
            Self::PackageRescued => EventKind::PackageRescued,
        }
    }

    /// Event specific fields as stored in the event record and sent to subscribers.
    pub fn payload(&self) -> Result<Value, serde_json::Error> {
        match self {
            Self::PackageActivated(activated) => serde_json::to_value(activated),
            Self::ManifestUpdated { manifest_uri } => Ok(json!({ "manifestUri": manifest_uri })),
            Self::Renewed { paid_until } => Ok(json!({ "paidUntil": paid_until })),
            Self::GuardianApproved { guardian }
            | Self::GuardianVetoed { guardian }
            | Self::GuardianVetoRescinded { guardian }
            | Self::GuardianApproveRescinded { guardian } => {
                Ok(json!({ "guardian": guardian }))
            }
            Self::PendingRelease(pending) => serde_json::to_value(pending),
            Self::CheckIn
            | Self::GuardianStateReset
            | Self::Released
            | Self::Revoked
            | Self::PackageRescued => Ok(json!({})),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;
    use pretty_assertions::assert_eq;
    use strum::IntoEnumIterator;

    #[test]
    fn signature_hashes_round_trip_for_every_kind() {
        for kind in EventKind::iter() {
            assert_eq!(
                EventKind::from_signature_hash(&kind.signature_hash()),
                Some(kind)
            );
        }
        assert_eq!(EventKind::from_signature_hash(&B256::repeat_byte(0x01)), None);
    }

    #[test]
    fn event_kind_names_match_contract_event_names() {
        assert_eq!(EventKind::PackageActivated.to_string(), "PackageActivated");
        assert_eq!(
            "GuardianApproveRescinded".parse::<EventKind>().unwrap(),
            EventKind::GuardianApproveRescinded
        );
    }

    #[test]
    fn pending_release_flags_are_split() {
        assert_eq!(
            PendingRelease::from_flags(3),
            PendingRelease {
                reason_flags: 3,
                inactivity: true,
                funding_lapse: true,
            }
        );
        let funding_only = PendingRelease::from_flags(2);
        assert!(!funding_only.inactivity);
        assert!(funding_only.funding_lapse);
    }

    #[test]
    fn payload_uses_contract_field_names() {
        let event = VaultEvent::PackageActivated(PackageActivated {
            owner: address!("0x1111111111111111111111111111111111111111"),
            beneficiary: address!("0x2222222222222222222222222222222222222222"),
            manifest_uri: "ipfs://Qm1".to_string(),
            guardians: vec![],
            guardian_quorum: 2,
            warn_threshold: 86400,
            inactivity_threshold: 172800,
        });
        let payload = event.payload().unwrap();
        assert_eq!(payload["manifestUri"], "ipfs://Qm1");
        assert_eq!(payload["guardianQuorum"], 2);
        assert_eq!(payload["inactivityThreshold"], 172800);

        let pending = VaultEvent::PendingRelease(PendingRelease::from_flags(1));
        assert_eq!(
            pending.payload().unwrap(),
            json!({ "reason_flags": 1, "inactivity": true, "funding_lapse": false })
        );
        assert_eq!(VaultEvent::Revoked.payload().unwrap(), json!({}));
    }
}
