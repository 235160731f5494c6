use crate::Slot;
use serde_derive::{Deserialize, Serialize};
use std::fmt;

/// The kind of work a validator is scheduled to perform.
///
/// The duty database stores payloads for the proposer, attester, aggregator and
/// sync-contribution kinds; the remaining kinds flow through the wider duty pipeline but carry no
/// unsigned payload here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DutyType {
    Proposer,
    Attester,
    Aggregator,
    SyncMessage,
    SyncContribution,
    Randao,
    VoluntaryExit,
    /// Blinded block production via external builders. No longer supported.
    BuilderProposer,
}

impl fmt::Display for DutyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DutyType::Proposer => "proposer",
            DutyType::Attester => "attester",
            DutyType::Aggregator => "aggregator",
            DutyType::SyncMessage => "sync_message",
            DutyType::SyncContribution => "sync_contribution",
            DutyType::Randao => "randao",
            DutyType::VoluntaryExit => "voluntary_exit",
            DutyType::BuilderProposer => "builder_proposer",
        };
        write!(f, "{}", s)
    }
}

/// A unit of scheduled validator work: one kind at one slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Duty {
    pub slot: Slot,
    pub kind: DutyType,
}

impl Duty {
    pub fn new(kind: DutyType, slot: Slot) -> Self {
        Self { slot, kind }
    }
}

impl fmt::Display for Duty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.slot, self.kind)
    }
}
