use std::{
    collections::HashSet,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use log::*;
use thiserror::Error;
use tokio::sync::mpsc::{self, error::TrySendError};

use crate::db_types::Order;

/// The unit of work handed to the pipeline workers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueEntry {
    pub order_id: i64,
    pub number: String,
    pub user_id: i64,
}

impl From<&Order> for QueueEntry {
    fn from(order: &Order) -> Self {
        Self { order_id: order.id, number: order.number.clone(), user_id: order.user_id }
    }
}

/// What [`OrderQueue::enqueue`] does when the queue is full.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Backpressure {
    /// Wait for a free slot.
    #[default]
    Block,
    /// Return [`EnqueueError::Full`] immediately.
    FailFast,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnqueueResult {
    Enqueued,
    /// The order is already queued or being worked on. Nothing was added.
    AlreadyInFlight,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnqueueError {
    #[error("The processing queue is full")]
    Full,
    #[error("The processing queue has been closed")]
    Closed,
}

/// Ids of orders that are queued or being processed.
#[derive(Debug, Clone, Default)]
pub(crate) struct InFlight(Arc<Mutex<HashSet<i64>>>);

impl InFlight {
    fn set(&self) -> MutexGuard<'_, HashSet<i64>> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns `false` if the id was already present.
    pub(crate) fn insert(&self, id: i64) -> bool {
        self.set().insert(id)
    }

    pub(crate) fn contains(&self, id: i64) -> bool {
        self.set().contains(&id)
    }

    pub(crate) fn remove(&self, id: i64) {
        self.set().remove(&id);
    }

    pub(crate) fn len(&self) -> usize {
        self.set().len()
    }
}

/// The producer side of the processing queue. Cheap to clone.
#[derive(Debug, Clone)]
pub struct OrderQueue {
    sender: mpsc::Sender<QueueEntry>,
    in_flight: InFlight,
    backpressure: Backpressure,
}

impl OrderQueue {
    /// Creates a queue of the given capacity and returns it with the consumer side.
    pub(crate) fn bounded(capacity: usize, backpressure: Backpressure) -> (Self, mpsc::Receiver<QueueEntry>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender, in_flight: InFlight::default(), backpressure }, receiver)
    }

    pub(crate) fn in_flight_set(&self) -> InFlight {
        self.in_flight.clone()
    }

    pub fn backpressure(&self) -> Backpressure {
        self.backpressure
    }

    /// Adds the order to the queue, honouring the configured [`Backpressure`] mode when the queue is full.
    pub async fn enqueue(&self, entry: QueueEntry) -> Result<EnqueueResult, EnqueueError> {
        match self.backpressure {
            Backpressure::FailFast => self.try_enqueue(entry),
            Backpressure::Block => {
                if self.in_flight.contains(entry.order_id) {
                    trace!("📥️ Order #{} is already in flight", entry.number);
                    return Ok(EnqueueResult::AlreadyInFlight);
                }
                // The id is only marked once a slot is held, so a caller that gives up while waiting leaves no trace
                let permit = self.sender.reserve().await.map_err(|_| EnqueueError::Closed)?;
                if !self.in_flight.insert(entry.order_id) {
                    trace!("📥️ Order #{} was queued while we waited for a slot", entry.number);
                    return Ok(EnqueueResult::AlreadyInFlight);
                }
                permit.send(entry);
                Ok(EnqueueResult::Enqueued)
            },
        }
    }

    /// Adds the order to the queue without waiting, whatever the configured backpressure mode.
    pub fn try_enqueue(&self, entry: QueueEntry) -> Result<EnqueueResult, EnqueueError> {
        let id = entry.order_id;
        if !self.in_flight.insert(id) {
            trace!("📥️ Order #{} is already in flight", entry.number);
            return Ok(EnqueueResult::AlreadyInFlight);
        }
        match self.sender.try_send(entry) {
            Ok(()) => Ok(EnqueueResult::Enqueued),
            Err(e) => {
                self.in_flight.remove(id);
                match e {
                    TrySendError::Full(_) => Err(EnqueueError::Full),
                    TrySendError::Closed(_) => Err(EnqueueError::Closed),
                }
            },
        }
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// The number of orders currently queued or being processed.
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }
}
