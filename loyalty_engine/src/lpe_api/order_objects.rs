use lp_common::Points;
use serde::{Deserialize, Serialize};

use crate::db_types::{Order, UserAccount};

/// The non-error outcomes of submitting an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOrderResult {
    /// The order is new. It has been stored with status `NEW` and handed to the pipeline.
    Accepted(Order),
    /// The same user has submitted this order before. Nothing was changed.
    AlreadySubmittedBySameUser(Order),
}

impl SubmitOrderResult {
    pub fn order(&self) -> &Order {
        match self {
            Self::Accepted(o) | Self::AlreadySubmittedBySameUser(o) => o,
        }
    }

    pub fn is_new(&self) -> bool {
        matches!(self, Self::Accepted(_))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    pub current: Points,
    pub withdrawn: Points,
}

impl From<&UserAccount> for Balance {
    fn from(account: &UserAccount) -> Self {
        Self { current: account.current_balance, withdrawn: account.withdrawn }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RedriveResult {
    /// Unresolved orders found in the database
    pub candidates: usize,
    pub enqueued: usize,
    /// Orders that were already queued or being processed
    pub in_flight: usize,
    /// Orders left for the next round because the queue was full
    pub deferred: usize,
}
