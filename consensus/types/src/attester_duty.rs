use crate::{AttestationData, Slot};
use serde_derive::{Deserialize, Serialize};

/// The scheduling coordinates of a single attester, as learned from a beacon node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttesterDuty {
    pub slot: Slot,
    /// The index of the committee the validator sits in at `slot`.
    ///
    /// Post-Electra the attestation data's own index field is always zero; this field retains the
    /// scheduled committee and is the one lookups are keyed by.
    #[serde(with = "eth2_serde_utils::quoted_u64")]
    pub committee_index: u64,
    #[serde(with = "eth2_serde_utils::quoted_u64")]
    pub committee_length: u64,
    #[serde(with = "eth2_serde_utils::quoted_u64")]
    pub committees_at_slot: u64,
    /// The validator's position within its committee.
    #[serde(with = "eth2_serde_utils::quoted_u64")]
    pub validator_committee_index: u64,
    #[serde(with = "eth2_serde_utils::quoted_u64")]
    pub validator_index: u64,
}

/// An unsigned attestation payload: the signable template joined with the duty it answers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttestationTemplate {
    pub data: AttestationData,
    pub duty: AttesterDuty,
}
