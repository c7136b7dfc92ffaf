use std::{fmt::Debug, time::Duration};

use chrono::{DateTime, Utc};
use log::*;

use crate::{
    db_types::NewOrder,
    helpers::{is_valid_order_number, normalize_order_number},
    lpe_api::{
        errors::OrderFlowError,
        order_objects::{RedriveResult, SubmitOrderResult},
    },
    pipeline::{EnqueueError, EnqueueResult, OrderQueue, QueueEntry},
    traits::{OrderManagement, StoreError},
};

/// `OrderFlowApi` is the intake point for orders. It validates and stores submitted orders, and feeds them to the
/// accrual pipeline.
#[derive(Clone)]
pub struct OrderFlowApi<B> {
    db: B,
    queue: OrderQueue,
}

impl<B> Debug for OrderFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi ({:?})", self.queue.backpressure())
    }
}

impl<B> OrderFlowApi<B> {
    pub fn new(db: B, queue: OrderQueue) -> Self {
        Self { db, queue }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> OrderFlowApi<B>
where B: OrderManagement
{
    /// Submit an order number on behalf of a user.
    ///
    /// Whitespace is stripped from the number before it is validated. The first user to submit a number owns it:
    /// * A brand-new number is stored as `NEW` and then handed to the pipeline. [`SubmitOrderResult::Accepted`].
    /// * A number this user already submitted returns the existing order.
    ///   [`SubmitOrderResult::AlreadySubmittedBySameUser`].
    /// * A number that another user submitted is rejected with [`OrderFlowError::AlreadySubmittedByOtherUser`].
    ///
    /// If the pipeline cannot take the order ([`OrderFlowError::PipelineBusy`] or [`OrderFlowError::PipelineClosed`]),
    /// the order has still been stored and will be picked up by re-drive.
    pub async fn submit_order(&self, number: &str, user_id: i64) -> Result<SubmitOrderResult, OrderFlowError> {
        let number = normalize_order_number(number);
        if !is_valid_order_number(&number) {
            debug!("📦️ User #{user_id} submitted an invalid order number '{number}'");
            return Err(OrderFlowError::InvalidFormat(number));
        }
        let order = match self.db.insert_order(NewOrder::new(number.as_str(), user_id)).await {
            Ok(order) => order,
            Err(StoreError::OrderAlreadyExists(_)) => {
                let existing = self
                    .db
                    .fetch_order_by_number(&number)
                    .await?
                    // Only if the order was deleted between the insert and this fetch
                    .ok_or_else(|| StoreError::OrderNotFound(number.clone()))?;
                return if existing.user_id == user_id {
                    trace!("📦️ User #{user_id} re-submitted order {number}");
                    Ok(SubmitOrderResult::AlreadySubmittedBySameUser(existing))
                } else {
                    info!("📦️ User #{user_id} submitted order {number}, which belongs to user #{}", existing.user_id);
                    Err(OrderFlowError::AlreadySubmittedByOtherUser(number))
                };
            },
            Err(e) => return Err(e.into()),
        };
        info!("📦️ Order {} accepted for user #{user_id}", order.number);
        match self.queue.enqueue(QueueEntry::from(&order)).await {
            Ok(_) => Ok(SubmitOrderResult::Accepted(order)),
            Err(e) => {
                warn!("📦️ Order {} is stored but could not be queued. It will be re-driven later. {e}", order.number);
                Err(e.into())
            },
        }
    }

    /// Puts unresolved (`NEW` or `PROCESSING`) orders back into the pipeline. If `stale_after` is given, only orders
    /// that have not been touched for at least that long are considered.
    ///
    /// This never waits for queue capacity. When the queue fills up, the remaining orders are left for the next call.
    pub async fn redrive_unresolved(&self, stale_after: Option<Duration>) -> Result<RedriveResult, OrderFlowError> {
        let cutoff = match stale_after {
            Some(age) => {
                let Some(cutoff) = stale_cutoff(age) else {
                    return Ok(RedriveResult::default());
                };
                Some(cutoff)
            },
            None => None,
        };
        let orders = self.db.fetch_unresolved_orders(cutoff).await?;
        let mut result = RedriveResult { candidates: orders.len(), ..Default::default() };
        for (i, order) in orders.iter().enumerate() {
            match self.queue.try_enqueue(QueueEntry::from(order)) {
                Ok(EnqueueResult::Enqueued) => result.enqueued += 1,
                Ok(EnqueueResult::AlreadyInFlight) => result.in_flight += 1,
                Err(EnqueueError::Full) => {
                    result.deferred = orders.len() - i;
                    debug!("📦️ Processing queue is full. {} orders deferred to the next re-drive", result.deferred);
                    break;
                },
                Err(EnqueueError::Closed) => return Err(OrderFlowError::PipelineClosed),
            }
        }
        Ok(result)
    }
}

/// `None` if the age reaches back further than chrono can represent, in which case nothing can be that stale.
fn stale_cutoff(age: Duration) -> Option<DateTime<Utc>> {
    chrono::Duration::from_std(age).ok().and_then(|age| Utc::now().checked_sub_signed(age))
}
