//! End-to-end rendezvous tests driving the duty database through its public surface only.

use duty_db::{Error, ManualDeadliner, MemoryDutyDb};
use slog::{o, Logger};
use ssz_types::{BitList, BitVector};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use types::{
    Attestation, AttestationBase, AttestationData, AttestationTemplate, AttesterDuty,
    BeaconBlockHeader, Checkpoint, Duty, DutyType, ForkName, Hash256, MinimalEthSpec,
    PublicKeyBytes, SignatureBytes, Slot, SyncCommitteeContribution, UnsignedData,
    UnsignedDataSet, VersionedBlockProposal,
};

type E = MinimalEthSpec;
type TestDb = MemoryDutyDb<E, Arc<ManualDeadliner>>;

fn new_db() -> (Arc<TestDb>, Arc<ManualDeadliner>) {
    let deadliner = Arc::new(ManualDeadliner::new());
    let log = Logger::root(slog::Discard, o!());
    (Arc::new(MemoryDutyDb::new(deadliner.clone(), log)), deadliner)
}

fn pubkey(byte: u8) -> PublicKeyBytes {
    let mut bytes = [0_u8; types::BLS_PUBLIC_KEY_BYTES_LEN];
    bytes[0] = byte;
    PublicKeyBytes::deserialize(&bytes).unwrap()
}

fn proposal(slot: u64, body: u64) -> VersionedBlockProposal {
    VersionedBlockProposal {
        version: ForkName::Electra,
        message: BeaconBlockHeader {
            slot: Slot::new(slot),
            proposer_index: 1,
            parent_root: Hash256::from_low_u64_be(1),
            state_root: Hash256::from_low_u64_be(2),
            body_root: Hash256::from_low_u64_be(body),
        },
    }
}

fn attestation_data(slot: u64, committee_index: u64, block_root: u64) -> AttestationData {
    AttestationData {
        slot: Slot::new(slot),
        index: committee_index,
        beacon_block_root: Hash256::from_low_u64_be(block_root),
        source: Checkpoint::default(),
        target: Checkpoint::default(),
    }
}

fn template(
    slot: u64,
    committee_index: u64,
    validator_index: u64,
    block_root: u64,
) -> AttestationTemplate {
    AttestationTemplate {
        data: attestation_data(slot, committee_index, block_root),
        duty: AttesterDuty {
            slot: Slot::new(slot),
            committee_index,
            committee_length: 128,
            committees_at_slot: 4,
            validator_committee_index: 0,
            validator_index,
        },
    }
}

fn aggregate(slot: u64, block_root: u64, bits: &[usize]) -> Attestation<E> {
    let mut aggregation_bits = BitList::with_capacity(8).unwrap();
    for bit in bits {
        aggregation_bits.set(*bit, true).unwrap();
    }
    Attestation::Base(AttestationBase {
        aggregation_bits,
        data: attestation_data(slot, 0, block_root),
        signature: SignatureBytes::empty(),
    })
}

fn contribution(slot: u64, subcommittee_index: u64, block_root: u64) -> SyncCommitteeContribution<E> {
    let mut aggregation_bits = BitVector::new();
    aggregation_bits.set(0, true).unwrap();
    SyncCommitteeContribution {
        slot: Slot::new(slot),
        beacon_block_root: Hash256::from_low_u64_be(block_root),
        subcommittee_index,
        aggregation_bits,
        signature: SignatureBytes::empty(),
    }
}

fn single_set(pubkey_byte: u8, unsigned: UnsignedData<E>) -> UnsignedDataSet<E> {
    let mut set = HashMap::new();
    set.insert(pubkey(pubkey_byte), unsigned);
    set
}

#[tokio::test]
async fn store_then_await_proposal() {
    let (db, _) = new_db();
    let stored = proposal(100, 0xAA);

    db.store(
        Duty::new(DutyType::Proposer, Slot::new(100)),
        single_set(1, UnsignedData::Proposal(stored.clone())),
    )
    .unwrap();

    // An already-present payload is returned without blocking, and lookups do not consume it.
    let first = db.await_proposal(Slot::new(100)).await.unwrap();
    assert_eq!(*first, stored);
    let second = db.await_proposal(Slot::new(100)).await.unwrap();
    assert_eq!(*second, stored);
}

#[tokio::test(flavor = "multi_thread")]
async fn await_then_store_attestation() {
    let (db, _) = new_db();

    let waiter = tokio::spawn({
        let db = db.clone();
        async move { db.await_attestation(Slot::new(42), 3).await }
    });

    // Let the waiter register before the payload arrives.
    tokio::time::sleep(Duration::from_millis(20)).await;

    db.store(
        Duty::new(DutyType::Attester, Slot::new(42)),
        single_set(7, UnsignedData::Attestation(template(42, 3, 7, 0xBB))),
    )
    .unwrap();

    let delivered = waiter.await.unwrap().unwrap();
    assert_eq!(delivered.beacon_block_root, Hash256::from_low_u64_be(0xBB));

    assert_eq!(db.pubkey_by_attestation(Slot::new(42), 3, 7), Ok(pubkey(7)));
    // The committee-index-0 duplicate serves post-fork validator clients.
    assert_eq!(db.pubkey_by_attestation(Slot::new(42), 0, 7), Ok(pubkey(7)));
}

#[tokio::test]
async fn attestation_served_under_both_committee_indices() {
    let (db, _) = new_db();

    db.store(
        Duty::new(DutyType::Attester, Slot::new(42)),
        single_set(7, UnsignedData::Attestation(template(42, 3, 7, 0xBB))),
    )
    .unwrap();

    let scheduled = db.await_attestation(Slot::new(42), 3).await.unwrap();
    let zeroed = db.await_attestation(Slot::new(42), 0).await.unwrap();
    assert_eq!(scheduled, zeroed);
}

#[tokio::test]
async fn clashing_store_preserves_first_payload() {
    let (db, _) = new_db();
    let duty = Duty::new(DutyType::Proposer, Slot::new(5));
    let original = proposal(5, 0xCC);

    db.store(duty, single_set(1, UnsignedData::Proposal(original.clone())))
        .unwrap();

    assert_eq!(
        db.store(duty, single_set(1, UnsignedData::Proposal(proposal(5, 0xDD)))),
        Err(Error::ClashingData {
            duty_type: DutyType::Proposer,
            slot: Slot::new(5),
        })
    );

    assert_eq!(*db.await_proposal(Slot::new(5)).await.unwrap(), original);
}

#[tokio::test]
async fn aggregate_refinement_serves_latest_copy() {
    let (db, _) = new_db();
    let duty = Duty::new(DutyType::Aggregator, Slot::new(9));
    let refined = aggregate(9, 0xEE, &[1, 2, 3]);
    let root = refined.data_root();

    db.store(
        duty,
        single_set(1, UnsignedData::AggregatedAttestation(aggregate(9, 0xEE, &[1]))),
    )
    .unwrap();
    db.store(
        duty,
        single_set(1, UnsignedData::AggregatedAttestation(refined.clone())),
    )
    .unwrap();

    // The caller receives a copy of the latest aggregate; mutating it must not affect what the
    // next caller sees.
    let mut delivered = db.await_aggregated_attestation(Slot::new(9), root).await.unwrap();
    assert_eq!(delivered, refined);

    if let Attestation::Base(ref mut base) = delivered {
        base.aggregation_bits.set(5, true).unwrap();
    }

    let fresh = db.await_aggregated_attestation(Slot::new(9), root).await.unwrap();
    assert_eq!(fresh, refined);
}

#[tokio::test]
async fn cancelled_waiter_receives_nothing() {
    let (db, _) = new_db();
    let root = Hash256::from_low_u64_be(0xFF);

    // The caller gives up before any payload exists.
    let abandoned = tokio::time::timeout(
        Duration::from_millis(20),
        db.await_sync_contribution(Slot::new(11), 0, root),
    )
    .await;
    assert!(abandoned.is_err());

    // A later store succeeds and a fresh lookup is served.
    db.store(
        Duty::new(DutyType::SyncContribution, Slot::new(11)),
        single_set(1, UnsignedData::SyncContribution(contribution(11, 0, 0xFF))),
    )
    .unwrap();

    let delivered = db.await_sync_contribution(Slot::new(11), 0, root).await.unwrap();
    assert_eq!(delivered.beacon_block_root, root);
}

#[tokio::test(flavor = "multi_thread")]
async fn shutdown_fails_pending_and_subsequent_lookups() {
    let (db, _) = new_db();

    let pending_proposal = tokio::spawn({
        let db = db.clone();
        async move { db.await_proposal(Slot::new(1)).await }
    });
    let pending_attestation = tokio::spawn({
        let db = db.clone();
        async move { db.await_attestation(Slot::new(1), 0).await }
    });

    tokio::time::sleep(Duration::from_millis(20)).await;
    db.shutdown();

    assert_eq!(pending_proposal.await.unwrap(), Err(Error::Shutdown));
    assert_eq!(pending_attestation.await.unwrap(), Err(Error::Shutdown));

    assert_eq!(db.await_proposal(Slot::new(2)).await, Err(Error::Shutdown));
}

#[tokio::test]
async fn eviction_removes_all_entries_for_the_duty() {
    let (db, deadliner) = new_db();
    let duty = Duty::new(DutyType::Attester, Slot::new(20));

    db.store(duty, single_set(7, UnsignedData::Attestation(template(20, 3, 7, 0xBB))))
        .unwrap();

    deadliner.expire(duty);

    // Expirations are absorbed by the next store.
    db.store(
        Duty::new(DutyType::Proposer, Slot::new(21)),
        single_set(1, UnsignedData::Proposal(proposal(21, 1))),
    )
    .unwrap();

    // No stale payload is served for the evicted duty.
    let stale = tokio::time::timeout(
        Duration::from_millis(50),
        db.await_attestation(Slot::new(20), 3),
    )
    .await;
    assert!(stale.is_err());

    assert_eq!(
        db.pubkey_by_attestation(Slot::new(20), 3, 7),
        Err(Error::PubKeyNotFound {
            slot: Slot::new(20),
            committee_index: 3,
            validator_index: 7,
        })
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn every_queued_waiter_is_served() {
    let (db, _) = new_db();
    let stored = proposal(30, 0x42);

    let waiters = (0..4)
        .map(|_| {
            tokio::spawn({
                let db = db.clone();
                async move { db.await_proposal(Slot::new(30)).await }
            })
        })
        .collect::<Vec<_>>();

    tokio::time::sleep(Duration::from_millis(20)).await;

    db.store(
        Duty::new(DutyType::Proposer, Slot::new(30)),
        single_set(1, UnsignedData::Proposal(stored.clone())),
    )
    .unwrap();

    for waiter in waiters {
        assert_eq!(*waiter.await.unwrap().unwrap(), stored);
    }
}
