use types::{Duty, DutyType, Slot};

#[derive(Debug, PartialEq)]
pub enum Error {
    /// The deadliner refused the duty: its deadline has already passed. Nothing was stored.
    ExpiredDuty(Duty),
    /// A proposer store may carry at most one payload.
    UnexpectedProposerPayloads(usize),
    /// A second store under an existing key carried different content. The stored entry is
    /// preserved.
    ClashingData { duty_type: DutyType, slot: Slot },
    /// A conflicting public key was supplied for an attester key. The stored entry is preserved.
    ClashingPubKey {
        slot: Slot,
        committee_index: u64,
        validator_index: u64,
    },
    /// Builder-proposer duties are no longer supported.
    DeprecatedDuty(DutyType),
    /// The database does not store payloads for this duty kind.
    UnsupportedDutyType(DutyType),
    /// No public key is recorded for the attester coordinates.
    PubKeyNotFound {
        slot: Slot,
        committee_index: u64,
        validator_index: u64,
    },
    /// The payload variant does not match the duty kind being stored.
    InvalidUnsignedData { expected: DutyType },
    /// The database has shut down; no further lookups will be served.
    Shutdown,
}
