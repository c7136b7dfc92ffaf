use log::*;
use thiserror::Error;

use crate::{
    accrual::{AccrualClient, AccrualError, AccrualTransport, PollOutcome},
    pipeline::QueueEntry,
    traits::{LoyaltyDatabase, SettlementResult, StoreError},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// The accrual system gave a final verdict and it was applied.
    Settled(SettlementResult),
    /// The accrual system had no final verdict within the attempt budget. The order stays `PROCESSING`.
    Unresolved { attempts: u32 },
    /// The order no longer needs processing (it is terminal, or it has disappeared).
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProcessError {
    #[error("{0}")]
    Store(#[from] StoreError),
    #[error("{0}")]
    Accrual(#[from] AccrualError),
}

/// Drives a single order through polling and settlement.
pub struct OrderProcessor<B, T> {
    db: B,
    client: AccrualClient<T>,
}

impl<B, T> OrderProcessor<B, T>
where
    B: LoyaltyDatabase,
    T: AccrualTransport,
{
    pub fn new(db: B, client: AccrualClient<T>) -> Self {
        Self { db, client }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    /// The entry is only a pointer. The order and its owner are reloaded from the database, so a stale entry (e.g. a
    /// re-driven order that has since been settled) is harmless.
    pub async fn process(&self, entry: &QueueEntry) -> Result<ProcessOutcome, ProcessError> {
        let Some(order) = self.db.fetch_order_by_id(entry.order_id).await? else {
            warn!("⚙️ Order #{} (id {}) is queued but does not exist", entry.number, entry.order_id);
            return Ok(ProcessOutcome::Skipped);
        };
        if order.is_terminal() {
            debug!("⚙️ Order #{} is already {}. Skipping.", order.number, order.status);
            return Ok(ProcessOutcome::Skipped);
        }
        if self.db.fetch_user(order.user_id).await?.is_none() {
            return Err(StoreError::UserNotFound(order.user_id).into());
        }
        let order = self.db.mark_order_processing(order.id).await?;
        if order.is_terminal() {
            debug!("⚙️ Order #{} was settled elsewhere. Skipping.", order.number);
            return Ok(ProcessOutcome::Skipped);
        }
        trace!("⚙️ Polling accrual system for order #{}", order.number);
        match self.client.poll(&order.number).await? {
            PollOutcome::Terminal(terminal) => {
                let result = self.db.settle_order(order.id, terminal).await?;
                match &result {
                    SettlementResult::Settled { account: Some(account), .. } => info!(
                        "⚙️ Order #{} is {terminal}. User #{} balance is now {}",
                        order.number, account.id, account.current_balance
                    ),
                    SettlementResult::Settled { account: None, .. } => info!("⚙️ Order #{} is {terminal}", order.number),
                    SettlementResult::AlreadySettled(o) => {
                        debug!("⚙️ Order #{} had already been settled as {}", o.number, o.status)
                    },
                }
                Ok(ProcessOutcome::Settled(result))
            },
            PollOutcome::Exhausted { attempts } => Ok(ProcessOutcome::Unresolved { attempts }),
        }
    }
}
