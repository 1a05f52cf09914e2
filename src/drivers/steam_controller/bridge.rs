//! Hand-off of decoded input between the I/O thread and the consumer.
//!
//! All state shared between the two threads lives behind one mutex in
//! [Bridge]. The I/O thread only takes the lock to publish a decoded report or
//! read rumble requests, never across a transfer.
use std::{
    collections::VecDeque,
    sync::{Mutex, MutexGuard, PoisonError},
    time::Instant,
};

use thiserror::Error;

use super::{codec::ContextBuffers, haptics::RumbleRequest, hid_report::Motor};

/// Bounded queue of button transitions, identified by component index. When
/// full, pushing a new transition discards the oldest unread one.
#[derive(Debug, Clone, Default)]
pub struct TransitionQueue {
    items: VecDeque<usize>,
    capacity: usize,
}

impl TransitionQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, component: usize) {
        if self.capacity == 0 {
            return;
        }
        if self.items.len() == self.capacity {
            self.items.pop_front();
        }
        self.items.push_back(component);
    }

    /// Move every queued transition, oldest first, to the end of `dst`
    pub fn drain_into(&mut self, dst: &mut VecDeque<usize>) {
        dst.extend(self.items.drain(..));
    }

    /// Reallocate the queue, discarding any undelivered transitions
    pub fn resize(&mut self, capacity: usize) {
        *self = Self::new(capacity);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Copy of the most recently published input state
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub buffers: ContextBuffers,
    /// When the buffers were last updated, if ever
    pub updated_at: Option<Instant>,
}

/// An unrecoverable transport failure. It is reported by every poll after it
/// occurred.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct Fault {
    pub message: String,
    pub at: Instant,
}

impl Fault {
    pub fn new<S: Into<String>>(message: S) -> Self {
        Self {
            message: message.into(),
            at: Instant::now(),
        }
    }
}

#[derive(Debug, Default)]
struct Shared {
    snapshot: Snapshot,
    transitions: TransitionQueue,
    rumble: [RumbleRequest; 2],
    fault: Option<Fault>,
}

/// State shared between one I/O loop and one consumer
#[derive(Debug, Default)]
pub struct Bridge {
    shared: Mutex<Shared>,
}

impl Bridge {
    pub fn new(queue_size: usize) -> Self {
        Self {
            shared: Mutex::new(Shared {
                transitions: TransitionQueue::new(queue_size),
                ..Default::default()
            }),
        }
    }

    /// A panic on the other thread never leaves the state half written, so a
    /// poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Publish freshly decoded buffers along with the button transitions they
    /// caused.
    pub fn publish(&self, buffers: &ContextBuffers, transitions: &[usize], at: Instant) {
        let mut shared = self.lock();
        shared.snapshot.buffers.clone_from(buffers);
        shared.snapshot.updated_at = Some(at);
        for component in transitions {
            shared.transitions.push(*component);
        }
    }

    /// Deposit a manual rumble request for the given motor
    pub fn rumble(&self, motor: Motor, intensity: f32, at: Instant) {
        let mut shared = self.lock();
        shared.rumble[motor.index()] = RumbleRequest::new(intensity, at);
    }

    pub fn rumble_requests(&self) -> [RumbleRequest; 2] {
        self.lock().rumble
    }

    /// Record a fault. Only the first fault of a session is kept.
    pub fn record_fault(&self, fault: Fault) {
        let mut shared = self.lock();
        if shared.fault.is_none() {
            shared.fault = Some(fault);
        }
    }

    pub fn fault(&self) -> Option<Fault> {
        self.lock().fault.clone()
    }

    /// Drain all pending transitions into `pending` and copy the published
    /// state into `snapshot`. Returns the recorded fault, if any.
    pub fn poll(&self, pending: &mut VecDeque<usize>, snapshot: &mut Snapshot) -> Result<(), Fault> {
        let mut shared = self.lock();
        shared.transitions.drain_into(pending);
        snapshot.clone_from(&shared.snapshot);
        match shared.fault.as_ref() {
            Some(fault) => Err(fault.clone()),
            None => Ok(()),
        }
    }

    /// Resize the transition queue, discarding undelivered transitions
    pub fn resize_queue(&self, size: usize) {
        self.lock().transitions.resize(size);
    }
}
