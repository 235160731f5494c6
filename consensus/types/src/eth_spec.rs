use serde_derive::{Deserialize, Serialize};
use ssz_types::typenum::{Unsigned, U128, U131072, U2048, U4, U64, U8, U8192};
use std::fmt::Debug;

/// Compile-time preset parameters sizing the aggregation bitfields carried by duty payloads.
///
/// Only the capacities exercised by this workspace are included.
pub trait EthSpec: 'static + Default + Sync + Send + Clone + Debug + PartialEq + Eq {
    /// Pre-Electra attestation aggregation bitfield capacity.
    type MaxValidatorsPerCommittee: Unsigned + Clone + Sync + Send + Debug + PartialEq + Eq;
    /// Electra attestation aggregation bitfield capacity (all committees of a slot).
    type MaxValidatorsPerSlot: Unsigned + Clone + Sync + Send + Debug + PartialEq + Eq;
    /// Electra committee bitfield capacity.
    type MaxCommitteesPerSlot: Unsigned + Clone + Sync + Send + Debug + PartialEq + Eq;
    /// Participation bitfield capacity of a sync-committee subcommittee.
    type SyncSubcommitteeSize: Unsigned + Clone + Sync + Send + Debug + PartialEq + Eq;
}

/// Ethereum Foundation mainnet specification.
#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct MainnetEthSpec;

impl EthSpec for MainnetEthSpec {
    type MaxValidatorsPerCommittee = U2048;
    type MaxValidatorsPerSlot = U131072;
    type MaxCommitteesPerSlot = U64;
    type SyncSubcommitteeSize = U128;
}

/// Ethereum Foundation minimal specification, used in testing.
#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct MinimalEthSpec;

impl EthSpec for MinimalEthSpec {
    type MaxValidatorsPerCommittee = U2048;
    type MaxValidatorsPerSlot = U8192;
    type MaxCommitteesPerSlot = U4;
    type SyncSubcommitteeSize = U8;
}
