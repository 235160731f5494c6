use crate::{AttestationData, EthSpec, Hash256, SignatureBytes};
use serde_derive::{Deserialize, Serialize};
use ssz_derive::{Decode, Encode};
use ssz_types::{BitList, BitVector};
use superstruct::superstruct;
use tree_hash::TreeHash;
use tree_hash_derive::TreeHash;

#[derive(Debug, PartialEq)]
pub enum Error {
    IncorrectVariant,
}

/// An aggregated attestation, versioned across the Electra committee-restructuring fork.
///
/// Two aggregates whose `data` hash to the same root are carriers of the same vote and differ
/// only in accumulated signatures.
#[superstruct(
    variants(Base, Electra),
    variant_attributes(
        derive(Debug, Clone, Serialize, Deserialize, Encode, Decode, TreeHash, PartialEq),
        serde(bound = "E: EthSpec", deny_unknown_fields),
    ),
    cast_error(ty = "Error", expr = "Error::IncorrectVariant"),
    partial_getter_error(ty = "Error", expr = "Error::IncorrectVariant")
)]
#[derive(Debug, Clone, Serialize, Deserialize, Encode, TreeHash, PartialEq)]
#[serde(untagged)]
#[serde(bound = "E: EthSpec")]
#[tree_hash(enum_behaviour = "transparent")]
#[ssz(enum_behaviour = "transparent")]
pub struct Attestation<E: EthSpec> {
    #[superstruct(only(Base), partial_getter(rename = "aggregation_bits_base"))]
    pub aggregation_bits: BitList<E::MaxValidatorsPerCommittee>,
    #[superstruct(only(Electra), partial_getter(rename = "aggregation_bits_electra"))]
    pub aggregation_bits: BitList<E::MaxValidatorsPerSlot>,
    pub data: AttestationData,
    #[superstruct(only(Electra))]
    pub committee_bits: BitVector<E::MaxCommitteesPerSlot>,
    pub signature: SignatureBytes,
}

impl<E: EthSpec> Attestation<E> {
    /// The content hash of the attestation template this aggregate carries.
    pub fn data_root(&self) -> Hash256 {
        self.data().tree_hash_root()
    }
}
