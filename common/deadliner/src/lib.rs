//! Duty deadline tracking.
//!
//! A [`Deadliner`] accepts duties and emits each one exactly once after its wall-clock deadline
//! has passed. The duty database offers every stored duty to a deadliner and later drains the
//! expiration stream to evict stale entries.
//!
//! Two implementations are provided: [`SlotDeadliner`] derives deadlines from the chain's
//! genesis time and slot duration, and [`ManualDeadliner`] lets tests expire duties on demand.

use futures::prelude::*;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet, VecDeque};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio_util::time::delay_queue::{self, DelayQueue};
use types::{Duty, Slot};

/// Tracks duty deadlines and surfaces duties whose deadline has passed.
///
/// Implementations must be safe to use from any thread.
pub trait Deadliner: Send + Sync {
    /// Starts tracking the duty's deadline.
    ///
    /// Returns `false` if the deadline has already passed; in that case nothing is scheduled and
    /// the duty will never appear on the expiration stream.
    fn add(&self, duty: Duty) -> bool;

    /// Drains one already-expired duty, if any, without blocking.
    fn try_recv_expired(&self) -> Option<Duty>;
}

impl<D: Deadliner + ?Sized> Deadliner for Arc<D> {
    fn add(&self, duty: Duty) -> bool {
        (**self).add(duty)
    }

    fn try_recv_expired(&self) -> Option<Duty> {
        (**self).try_recv_expired()
    }
}

/// A deadliner that expires each duty at the end of its slot.
///
/// A background task owns the expiration wheel, so `SlotDeadliner::spawn` must be called from
/// within a tokio runtime.
pub struct SlotDeadliner {
    genesis: Instant,
    slot_duration: Duration,
    add_tx: mpsc::UnboundedSender<(Duty, Instant)>,
    expired_rx: Mutex<mpsc::UnboundedReceiver<Duty>>,
}

impl SlotDeadliner {
    pub fn spawn(genesis: Instant, slot_duration: Duration) -> Self {
        let (add_tx, add_rx) = mpsc::unbounded_channel();
        let (expired_tx, expired_rx) = mpsc::unbounded_channel();

        tokio::spawn(expiry_pump(add_rx, expired_tx));

        Self {
            genesis,
            slot_duration,
            add_tx,
            expired_rx: Mutex::new(expired_rx),
        }
    }

    /// The instant at which duties of the given slot expire: the end of the slot.
    ///
    /// Returns `None` when the deadline is not representable; such duties never expire.
    fn duty_deadline(&self, slot: Slot) -> Option<Instant> {
        let nanos = self
            .slot_duration
            .as_nanos()
            .checked_mul(u128::from(slot.as_u64()).checked_add(1)?)?;
        let offset = Duration::from_nanos(u64::try_from(nanos).ok()?);
        self.genesis.checked_add(offset)
    }
}

impl Deadliner for SlotDeadliner {
    fn add(&self, duty: Duty) -> bool {
        let deadline = match self.duty_deadline(duty.slot) {
            Some(deadline) => deadline,
            None => return true,
        };

        if deadline <= Instant::now() {
            return false;
        }

        self.add_tx.send((duty, deadline)).is_ok()
    }

    fn try_recv_expired(&self) -> Option<Duty> {
        self.expired_rx.lock().try_recv().ok()
    }
}

/// Owns the expiration wheel and forwards each duty once its deadline fires.
async fn expiry_pump(
    mut add_rx: mpsc::UnboundedReceiver<(Duty, Instant)>,
    expired_tx: mpsc::UnboundedSender<Duty>,
) {
    let mut delayed = DelayedDuties {
        duties: HashMap::new(),
        expirations: DelayQueue::new(),
    };

    loop {
        tokio::select! {
            added = add_rx.recv() => match added {
                Some((duty, deadline)) => delayed.insert_at(duty, deadline),
                // All deadliner handles are gone.
                None => break,
            },
            Some(duty) = delayed.next() => {
                if expired_tx.send(duty).is_err() {
                    break;
                }
            }
        }
    }
}

/// A set of duties each linked to its expiration via a `delay_queue` key.
struct DelayedDuties {
    duties: HashMap<Duty, delay_queue::Key>,
    expirations: DelayQueue<Duty>,
}

impl DelayedDuties {
    /// Schedules the duty unless it is already pending. Re-adding a duty never moves its
    /// deadline.
    fn insert_at(&mut self, duty: Duty, deadline: Instant) {
        if !self.duties.contains_key(&duty) {
            let key = self
                .expirations
                .insert_at(duty, tokio::time::Instant::from_std(deadline));
            self.duties.insert(duty, key);
        }
    }
}

impl Stream for DelayedDuties {
    type Item = Duty;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Duty>> {
        let this = self.get_mut();
        match this.expirations.poll_expired(cx) {
            Poll::Ready(Some(expired)) => {
                let duty = expired.into_inner();
                this.duties.remove(&duty);
                Poll::Ready(Some(duty))
            }
            // An empty queue is not the end of the stream: the pump is polled again after the
            // next insert.
            Poll::Ready(None) => Poll::Pending,
            Poll::Pending => Poll::Pending,
        }
    }
}

/// A deadliner driven explicitly by the caller, for deterministic tests.
#[derive(Default)]
pub struct ManualDeadliner {
    added: Mutex<HashSet<Duty>>,
    expired: Mutex<HashSet<Duty>>,
    queue: Mutex<VecDeque<Duty>>,
}

impl ManualDeadliner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Expires the duty immediately: it is pushed onto the expiration stream and any later
    /// `add` of it is refused.
    pub fn expire(&self, duty: Duty) {
        self.added.lock().remove(&duty);
        self.expired.lock().insert(duty);
        self.queue.lock().push_back(duty);
    }

    /// Duties accepted so far and not yet expired.
    pub fn pending(&self) -> Vec<Duty> {
        self.added.lock().iter().copied().collect()
    }
}

impl Deadliner for ManualDeadliner {
    fn add(&self, duty: Duty) -> bool {
        if self.expired.lock().contains(&duty) {
            return false;
        }
        self.added.lock().insert(duty);
        true
    }

    fn try_recv_expired(&self) -> Option<Duty> {
        self.queue.lock().pop_front()
    }
}
