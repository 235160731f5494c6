use crate::{BeaconBlockHeader, ForkName, Hash256, Slot};
use serde_derive::{Deserialize, Serialize};

/// An unsigned block proposal tagged with the fork it was produced under.
///
/// The header's tree hash root equals the root of the full block, so header-level identity is
/// sufficient for rendezvous and clash detection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionedBlockProposal {
    pub version: ForkName,
    pub message: BeaconBlockHeader,
}

impl VersionedBlockProposal {
    pub fn slot(&self) -> Slot {
        self.message.slot
    }

    /// The block root of the proposal.
    pub fn canonical_root(&self) -> Hash256 {
        self.message.canonical_root()
    }
}
