//! The duty database: an in-memory rendezvous store between the duty-fetching pipeline and
//! validator-facing lookups.
//!
//! The duty-fetching side publishes unsigned duty payloads with [`MemoryDutyDb::store`];
//! validator-facing callers issue `await_*` lookups which return immediately when the payload is
//! already present and otherwise suspend until it arrives, the caller gives up, or the database
//! shuts down. Stored content is immutable per key (conflicting stores are rejected) and entries
//! are evicted once the duty's deadline passes.

mod error;
mod memory;

pub use crate::error::Error;
pub use crate::memory::MemoryDutyDb;
pub use deadliner::{Deadliner, ManualDeadliner, SlotDeadliner};
