use crate::{Checkpoint, Hash256, Slot};
use serde_derive::{Deserialize, Serialize};
use ssz_derive::{Decode, Encode};
use tree_hash_derive::TreeHash;

/// The data upon which an attestation is based.
///
/// This is the signable template served to attesters; its `tree_hash_root` is the content hash
/// under which equivalent attestations are identified.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Encode, Decode, TreeHash,
)]
pub struct AttestationData {
    pub slot: Slot,
    #[serde(with = "eth2_serde_utils::quoted_u64")]
    pub index: u64,

    // LMD GHOST vote
    pub beacon_block_root: Hash256,

    // FFG Vote
    pub source: Checkpoint,
    pub target: Checkpoint,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tree_hash::TreeHash;

    #[test]
    fn root_tracks_content() {
        let mut a = AttestationData {
            slot: Slot::new(1),
            index: 0,
            beacon_block_root: Hash256::from_low_u64_be(1),
            source: Checkpoint::default(),
            target: Checkpoint::default(),
        };
        let root = a.tree_hash_root();

        assert_eq!(a.tree_hash_root(), root);

        a.beacon_block_root = Hash256::from_low_u64_be(2);
        assert_ne!(a.tree_hash_root(), root);
    }
}
