use crate::{
    Attestation, AttestationTemplate, DutyType, EthSpec, PublicKeyBytes,
    SyncCommitteeContribution, VersionedBlockProposal,
};
use serde_derive::{Deserialize, Serialize};
use std::collections::HashMap;

/// An unsigned duty payload of one of the storable duty kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound = "E: EthSpec")]
pub enum UnsignedData<E: EthSpec> {
    Proposal(VersionedBlockProposal),
    Attestation(AttestationTemplate),
    AggregatedAttestation(Attestation<E>),
    SyncContribution(SyncCommitteeContribution<E>),
}

impl<E: EthSpec> UnsignedData<E> {
    /// The duty kind this payload belongs to.
    pub fn duty_type(&self) -> DutyType {
        match self {
            UnsignedData::Proposal(_) => DutyType::Proposer,
            UnsignedData::Attestation(_) => DutyType::Attester,
            UnsignedData::AggregatedAttestation(_) => DutyType::Aggregator,
            UnsignedData::SyncContribution(_) => DutyType::SyncContribution,
        }
    }
}

/// One batch of unsigned payloads submitted for a single duty, keyed by validator public key.
///
/// The key is meaningful for attester batches (it is recorded for pubkey lookups); for other
/// kinds it merely identifies the submitting validator.
pub type UnsignedDataSet<E> = HashMap<PublicKeyBytes, UnsignedData<E>>;
