//! The in-memory duty database.
//!
//! All state lives behind one coarse mutex: map operations and waiter sweeps are short, and
//! holding the lock across a registration and its resolution pass is what makes an
//! already-present payload reach the caller without suspending. No `await` point ever holds the
//! lock; each blocked lookup waits on its own capacity-one delivery channel outside the critical
//! section.

use crate::Error;
use deadliner::Deadliner;
use parking_lot::Mutex;
use slog::{debug, Logger};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::oneshot;
use tree_hash::TreeHash;
use types::{
    Attestation, AttestationData, CommitteeIndex, Duty, DutyType, EthSpec, Hash256,
    PublicKeyBytes, Slot, SyncCommitteeContribution, UnsignedData, UnsignedDataSet,
    VersionedBlockProposal,
};

/// An in-memory rendezvous store for unsigned duty payloads.
///
/// One instance is shared (by `Arc`) between the duty-fetching pipeline, which stores payloads,
/// and the validator-facing API, which awaits them. Every stored duty is offered to the
/// deadliner; expirations it emits are absorbed on subsequent stores and evict all entries of
/// the expired duty.
pub struct MemoryDutyDb<E: EthSpec, D: Deadliner> {
    inner: Mutex<Inner<E>>,
    deadliner: D,
    exit: exit_future::Exit,
    shutdown_signal: Mutex<Option<exit_future::Signal>>,
    log: Logger,
}

impl<E: EthSpec, D: Deadliner> MemoryDutyDb<E, D> {
    pub fn new(deadliner: D, log: Logger) -> Self {
        let (signal, exit) = exit_future::signal();

        Self {
            inner: Mutex::new(Inner {
                attestations: HashMap::new(),
                attestation_pubkeys: HashMap::new(),
                attestation_keys_by_slot: HashMap::new(),
                attestation_waiters: vec![],
                proposals: HashMap::new(),
                proposal_waiters: vec![],
                aggregates: HashMap::new(),
                aggregate_keys_by_slot: HashMap::new(),
                aggregate_waiters: vec![],
                contributions: HashMap::new(),
                contribution_keys_by_slot: HashMap::new(),
                contribution_waiters: vec![],
                is_shutdown: false,
            }),
            deadliner,
            exit,
            shutdown_signal: Mutex::new(Some(signal)),
            log,
        }
    }

    /// Stores a batch of unsigned payloads for the given duty.
    ///
    /// Returns [`Error::ExpiredDuty`] without storing anything if the duty's deadline has
    /// already passed. A successful store completes every queued lookup the new entries match
    /// before returning.
    pub fn store(&self, duty: Duty, unsigned_set: UnsignedDataSet<E>) -> Result<(), Error> {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;

        if !self.deadliner.add(duty) {
            return Err(Error::ExpiredDuty(duty));
        }

        match duty.kind {
            DutyType::Proposer => {
                // Sanity check, max one proposer per slot.
                if unsigned_set.len() > 1 {
                    return Err(Error::UnexpectedProposerPayloads(unsigned_set.len()));
                }
                for unsigned in unsigned_set.into_values() {
                    Self::insert_proposal(inner, unsigned)?;
                }
                resolve_waiters(&inner.proposals, &mut inner.proposal_waiters);
            }
            DutyType::BuilderProposer => return Err(Error::DeprecatedDuty(duty.kind)),
            DutyType::Attester => {
                for (pubkey, unsigned) in unsigned_set {
                    Self::insert_attestation(inner, pubkey, unsigned)?;
                }
                resolve_waiters(&inner.attestations, &mut inner.attestation_waiters);
            }
            DutyType::Aggregator => {
                for unsigned in unsigned_set.into_values() {
                    Self::insert_aggregate(inner, unsigned)?;
                }
                resolve_waiters(&inner.aggregates, &mut inner.aggregate_waiters);
            }
            DutyType::SyncContribution => {
                for unsigned in unsigned_set.into_values() {
                    Self::insert_contribution(inner, unsigned)?;
                }
                resolve_waiters(&inner.contributions, &mut inner.contribution_waiters);
            }
            kind => return Err(Error::UnsupportedDutyType(kind)),
        }

        debug!(self.log, "Stored unsigned duty data"; "duty" => %duty);

        // Absorb all expirations the deadliner has emitted since the last store.
        while let Some(expired) = self.deadliner.try_recv_expired() {
            Self::evict_duty(inner, expired)?;
            debug!(self.log, "Evicted expired duty"; "duty" => %expired);
        }

        Ok(())
    }

    /// Returns the block proposal for the slot, waiting for it if necessary.
    pub async fn await_proposal(&self, slot: Slot) -> Result<Arc<VersionedBlockProposal>, Error> {
        let (sender, receiver) = oneshot::channel();

        {
            let mut guard = self.inner.lock();
            let inner = &mut *guard;
            if inner.is_shutdown {
                return Err(Error::Shutdown);
            }
            inner.proposal_waiters.push(Waiter { key: slot, sender });
            resolve_waiters(&inner.proposals, &mut inner.proposal_waiters);
        }

        self.wait(receiver).await
    }

    /// Returns the attestation template for the slot and committee, waiting for it if necessary.
    pub async fn await_attestation(
        &self,
        slot: Slot,
        committee_index: CommitteeIndex,
    ) -> Result<Arc<AttestationData>, Error> {
        let (sender, receiver) = oneshot::channel();
        let key = AttestationKey {
            slot,
            committee_index,
        };

        {
            let mut guard = self.inner.lock();
            let inner = &mut *guard;
            if inner.is_shutdown {
                return Err(Error::Shutdown);
            }
            inner.attestation_waiters.push(Waiter { key, sender });
            resolve_waiters(&inner.attestations, &mut inner.attestation_waiters);
        }

        self.wait(receiver).await
    }

    /// Returns the aggregated attestation whose template hashes to `attestation_root`, waiting
    /// for it if necessary.
    ///
    /// The result is a copy of the stored aggregate: callers aggregate further signatures into
    /// it, which must never reach the stored entry.
    pub async fn await_aggregated_attestation(
        &self,
        slot: Slot,
        attestation_root: Hash256,
    ) -> Result<Attestation<E>, Error> {
        let (sender, receiver) = oneshot::channel();
        let key = AggregateKey {
            slot,
            root: attestation_root,
        };

        {
            let mut guard = self.inner.lock();
            let inner = &mut *guard;
            if inner.is_shutdown {
                return Err(Error::Shutdown);
            }
            inner.aggregate_waiters.push(Waiter { key, sender });
            resolve_waiters(&inner.aggregates, &mut inner.aggregate_waiters);
        }

        self.wait(receiver).await
    }

    /// Returns the sync-committee contribution for the subcommittee and block root, waiting for
    /// it if necessary.
    pub async fn await_sync_contribution(
        &self,
        slot: Slot,
        subcommittee_index: u64,
        beacon_block_root: Hash256,
    ) -> Result<Arc<SyncCommitteeContribution<E>>, Error> {
        let (sender, receiver) = oneshot::channel();
        let key = ContributionKey {
            slot,
            subcommittee_index,
            beacon_block_root,
        };

        {
            let mut guard = self.inner.lock();
            let inner = &mut *guard;
            if inner.is_shutdown {
                return Err(Error::Shutdown);
            }
            inner.contribution_waiters.push(Waiter { key, sender });
            resolve_waiters(&inner.contributions, &mut inner.contribution_waiters);
        }

        self.wait(receiver).await
    }

    /// Returns the public key of the validator attesting at the given coordinates. Never
    /// blocks.
    pub fn pubkey_by_attestation(
        &self,
        slot: Slot,
        committee_index: CommitteeIndex,
        validator_index: u64,
    ) -> Result<PublicKeyBytes, Error> {
        let key = PubkeyKey {
            slot,
            committee_index,
            validator_index,
        };

        self.inner
            .lock()
            .attestation_pubkeys
            .get(&key)
            .copied()
            .ok_or(Error::PubKeyNotFound {
                slot,
                committee_index,
                validator_index,
            })
    }

    /// Fails all outstanding lookups with [`Error::Shutdown`] and makes subsequent ones return
    /// it immediately. Note this may only be called once.
    pub fn shutdown(&self) {
        self.inner.lock().is_shutdown = true;

        if let Some(signal) = self.shutdown_signal.lock().take() {
            let _ = signal.fire();
        }
    }

    /// Waits for delivery or shutdown, whichever happens first. Dropping the returned future is
    /// how callers cancel: the closed channel is observed by the next resolver sweep.
    async fn wait<V>(&self, receiver: oneshot::Receiver<V>) -> Result<V, Error> {
        let exit = self.exit.clone();

        tokio::select! {
            _ = exit => Err(Error::Shutdown),
            value = receiver => value.map_err(|_| Error::Shutdown),
        }
    }

    fn insert_proposal(inner: &mut Inner<E>, unsigned: UnsignedData<E>) -> Result<(), Error> {
        let proposal = match unsigned {
            UnsignedData::Proposal(proposal) => proposal,
            _ => {
                return Err(Error::InvalidUnsignedData {
                    expected: DutyType::Proposer,
                })
            }
        };

        let slot = proposal.slot();
        match inner.proposals.get(&slot) {
            Some(existing) => {
                if existing.canonical_root() != proposal.canonical_root() {
                    return Err(Error::ClashingData {
                        duty_type: DutyType::Proposer,
                        slot,
                    });
                }
            }
            None => {
                inner.proposals.insert(slot, Arc::new(proposal));
            }
        }

        Ok(())
    }

    fn insert_attestation(
        inner: &mut Inner<E>,
        pubkey: PublicKeyBytes,
        unsigned: UnsignedData<E>,
    ) -> Result<(), Error> {
        let template = match unsigned {
            UnsignedData::Attestation(template) => template,
            _ => {
                return Err(Error::InvalidUnsignedData {
                    expected: DutyType::Attester,
                })
            }
        };

        let duty = template.duty;
        let data = Arc::new(template.data);

        // Each template is recorded twice, under the scheduled committee index and under
        // committee index 0, since post-Electra validator clients request index 0
        // unconditionally while older ones still pass the scheduled index.
        // TODO: drop the duplicate write once all supported validator clients request index 0.
        for committee_index in [duty.committee_index, 0] {
            let pubkey_key = PubkeyKey {
                slot: data.slot,
                committee_index,
                validator_index: duty.validator_index,
            };
            match inner.attestation_pubkeys.get(&pubkey_key) {
                Some(existing) if *existing != pubkey => {
                    return Err(Error::ClashingPubKey {
                        slot: pubkey_key.slot,
                        committee_index,
                        validator_index: duty.validator_index,
                    });
                }
                Some(_) => {}
                None => {
                    inner.attestation_pubkeys.insert(pubkey_key, pubkey);
                    inner
                        .attestation_keys_by_slot
                        .entry(duty.slot)
                        .or_default()
                        .push(pubkey_key);
                }
            }

            let key = AttestationKey {
                slot: data.slot,
                committee_index,
            };
            match inner.attestations.get(&key) {
                Some(existing) if **existing != *data => {
                    return Err(Error::ClashingData {
                        duty_type: DutyType::Attester,
                        slot: key.slot,
                    });
                }
                Some(_) => {}
                None => {
                    inner.attestations.insert(key, data.clone());
                }
            }
        }

        Ok(())
    }

    fn insert_aggregate(inner: &mut Inner<E>, unsigned: UnsignedData<E>) -> Result<(), Error> {
        let aggregate = match unsigned {
            UnsignedData::AggregatedAttestation(aggregate) => aggregate,
            _ => {
                return Err(Error::InvalidUnsignedData {
                    expected: DutyType::Aggregator,
                })
            }
        };

        let slot = aggregate.data().slot;
        let data_root = aggregate.data_root();
        let key = AggregateKey {
            slot,
            root: data_root,
        };

        match inner.aggregates.get(&key) {
            Some(existing) => {
                if existing.data_root() != data_root {
                    return Err(Error::ClashingData {
                        duty_type: DutyType::Aggregator,
                        slot,
                    });
                }
                // Same template root: the latest aggregate wins, it may carry additional
                // signatures.
                inner.aggregates.insert(key, aggregate);
            }
            None => {
                inner.aggregates.insert(key, aggregate);
                inner
                    .aggregate_keys_by_slot
                    .entry(slot)
                    .or_default()
                    .push(key);
            }
        }

        Ok(())
    }

    fn insert_contribution(inner: &mut Inner<E>, unsigned: UnsignedData<E>) -> Result<(), Error> {
        let contribution = match unsigned {
            UnsignedData::SyncContribution(contribution) => contribution,
            _ => {
                return Err(Error::InvalidUnsignedData {
                    expected: DutyType::SyncContribution,
                })
            }
        };

        let root = contribution.tree_hash_root();
        let key = ContributionKey {
            slot: contribution.slot,
            subcommittee_index: contribution.subcommittee_index,
            beacon_block_root: contribution.beacon_block_root,
        };

        match inner.contributions.get(&key) {
            Some(existing) => {
                if existing.tree_hash_root() != root {
                    return Err(Error::ClashingData {
                        duty_type: DutyType::SyncContribution,
                        slot: key.slot,
                    });
                }
            }
            None => {
                inner.contributions.insert(key, Arc::new(contribution));
                inner
                    .contribution_keys_by_slot
                    .entry(key.slot)
                    .or_default()
                    .push(key);
            }
        }

        Ok(())
    }

    /// Removes every entry pertaining to the expired duty, including its slot index record.
    fn evict_duty(inner: &mut Inner<E>, duty: Duty) -> Result<(), Error> {
        match duty.kind {
            DutyType::Proposer => {
                inner.proposals.remove(&duty.slot);
            }
            DutyType::BuilderProposer => return Err(Error::DeprecatedDuty(duty.kind)),
            DutyType::Attester => {
                for key in inner
                    .attestation_keys_by_slot
                    .remove(&duty.slot)
                    .unwrap_or_default()
                {
                    inner.attestation_pubkeys.remove(&key);
                    inner.attestations.remove(&AttestationKey {
                        slot: key.slot,
                        committee_index: key.committee_index,
                    });
                }
            }
            DutyType::Aggregator => {
                for key in inner
                    .aggregate_keys_by_slot
                    .remove(&duty.slot)
                    .unwrap_or_default()
                {
                    inner.aggregates.remove(&key);
                }
            }
            DutyType::SyncContribution => {
                for key in inner
                    .contribution_keys_by_slot
                    .remove(&duty.slot)
                    .unwrap_or_default()
                {
                    inner.contributions.remove(&key);
                }
            }
            kind => return Err(Error::UnsupportedDutyType(kind)),
        }

        Ok(())
    }
}

/// All mutable state, guarded by the single database mutex.
struct Inner<E: EthSpec> {
    attestations: HashMap<AttestationKey, Arc<AttestationData>>,
    attestation_pubkeys: HashMap<PubkeyKey, PublicKeyBytes>,
    attestation_keys_by_slot: HashMap<Slot, Vec<PubkeyKey>>,
    attestation_waiters: Vec<Waiter<AttestationKey, Arc<AttestationData>>>,

    proposals: HashMap<Slot, Arc<VersionedBlockProposal>>,
    proposal_waiters: Vec<Waiter<Slot, Arc<VersionedBlockProposal>>>,

    aggregates: HashMap<AggregateKey, Attestation<E>>,
    aggregate_keys_by_slot: HashMap<Slot, Vec<AggregateKey>>,
    aggregate_waiters: Vec<Waiter<AggregateKey, Attestation<E>>>,

    contributions: HashMap<ContributionKey, Arc<SyncCommitteeContribution<E>>>,
    contribution_keys_by_slot: HashMap<Slot, Vec<ContributionKey>>,
    contribution_waiters: Vec<Waiter<ContributionKey, Arc<SyncCommitteeContribution<E>>>>,

    is_shutdown: bool,
}

/// A queued lookup: its key and the single-use channel the payload is delivered on.
struct Waiter<K, V> {
    key: K,
    sender: oneshot::Sender<V>,
}

/// Completes every waiter whose key is present, drops every abandoned waiter and retains the
/// rest. Sending consumes the channel, so no waiter can ever be completed twice; a send to a
/// concurrently-dropped receiver is indistinguishable from cancellation and ignored.
///
/// Callers must hold the state lock.
fn resolve_waiters<K: Eq + std::hash::Hash, V: Clone>(
    entries: &HashMap<K, V>,
    waiters: &mut Vec<Waiter<K, V>>,
) {
    let pending = std::mem::take(waiters);
    for waiter in pending {
        if waiter.sender.is_closed() {
            // The caller gave up, drop the waiter.
            continue;
        }
        match entries.get(&waiter.key) {
            Some(value) => {
                let _ = waiter.sender.send(value.clone());
            }
            None => waiters.push(waiter),
        }
    }
}

/// Lookup key for attestation templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct AttestationKey {
    slot: Slot,
    committee_index: CommitteeIndex,
}

/// Lookup key for validator public keys by attester coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct PubkeyKey {
    slot: Slot,
    committee_index: CommitteeIndex,
    validator_index: u64,
}

/// Lookup key for aggregated attestations by template root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct AggregateKey {
    slot: Slot,
    root: Hash256,
}

/// Lookup key for sync-committee contributions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct ContributionKey {
    slot: Slot,
    subcommittee_index: u64,
    beacon_block_root: Hash256,
}
