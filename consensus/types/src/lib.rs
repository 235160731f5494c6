//! Duty descriptors and unsigned duty payload types for the duty rendezvous database.
//!
//! Payload types carry the two capabilities the duty layer relies on: deep copies via `Clone`
//! and Merkleized content hashes via `tree_hash::TreeHash`.

pub mod attestation;
pub mod attestation_data;
pub mod attester_duty;
pub mod beacon_block_header;
pub mod block_proposal;
pub mod checkpoint;
pub mod duty;
pub mod eth_spec;
pub mod fork_name;
pub mod public_key_bytes;
pub mod signature_bytes;
pub mod slot_epoch;
pub mod sync_committee_contribution;
pub mod unsigned_data;

pub use crate::attestation::{Attestation, AttestationBase, AttestationElectra};
pub use crate::attestation_data::AttestationData;
pub use crate::attester_duty::{AttestationTemplate, AttesterDuty};
pub use crate::beacon_block_header::BeaconBlockHeader;
pub use crate::block_proposal::VersionedBlockProposal;
pub use crate::checkpoint::Checkpoint;
pub use crate::duty::{Duty, DutyType};
pub use crate::eth_spec::{EthSpec, MainnetEthSpec, MinimalEthSpec};
pub use crate::fork_name::ForkName;
pub use crate::public_key_bytes::{BytesError, PublicKeyBytes};
pub use crate::signature_bytes::SignatureBytes;
pub use crate::slot_epoch::{Epoch, Slot};
pub use crate::sync_committee_contribution::SyncCommitteeContribution;
pub use crate::unsigned_data::{UnsignedData, UnsignedDataSet};

pub type Hash256 = ethereum_types::H256;

pub type CommitteeIndex = u64;

/// The byte-length of a compressed BLS public key.
pub const BLS_PUBLIC_KEY_BYTES_LEN: usize = 48;

/// The byte-length of a compressed BLS signature.
pub const BLS_SIGNATURE_BYTES_LEN: usize = 96;
