use lp_common::Points;
use thiserror::Error;

use crate::{pipeline::EnqueueError, traits::StoreError};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderFlowError {
    #[error("'{0}' is not a valid order number")]
    InvalidFormat(String),
    #[error("Order {0} has already been submitted by another user")]
    AlreadySubmittedByOtherUser(String),
    #[error("The order store is unavailable. {0}")]
    StoreUnavailable(String),
    #[error("User #{0} does not exist")]
    UserNotFound(i64),
    #[error("The processing queue is full. Try again later.")]
    PipelineBusy,
    #[error("The processing pipeline is not accepting orders")]
    PipelineClosed,
}

impl From<StoreError> for OrderFlowError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::UserNotFound(id) => OrderFlowError::UserNotFound(id),
            e => OrderFlowError::StoreUnavailable(e.to_string()),
        }
    }
}

impl From<EnqueueError> for OrderFlowError {
    fn from(e: EnqueueError) -> Self {
        match e {
            EnqueueError::Full => OrderFlowError::PipelineBusy,
            EnqueueError::Closed => OrderFlowError::PipelineClosed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccountApiError {
    #[error("'{0}' is not a valid order number")]
    InvalidFormat(String),
    #[error("{0} is not a valid withdrawal amount")]
    InvalidAmount(Points),
    #[error("Insufficient funds. Requested {requested}, but only {available} is available")]
    InsufficientFunds { requested: Points, available: Points },
    #[error("Points have already been withdrawn against order {0}")]
    WithdrawalAlreadyExists(String),
    #[error("User #{0} does not exist")]
    UserNotFound(i64),
    #[error("The ledger is unavailable. {0}")]
    StoreUnavailable(String),
}

impl From<StoreError> for AccountApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::UserNotFound(id) => AccountApiError::UserNotFound(id),
            StoreError::InsufficientFunds { requested, available, .. } => {
                AccountApiError::InsufficientFunds { requested, available }
            },
            StoreError::WithdrawalAlreadyExists(number) => AccountApiError::WithdrawalAlreadyExists(number),
            StoreError::InvalidAmount(amount) => AccountApiError::InvalidAmount(amount),
            e => AccountApiError::StoreUnavailable(e.to_string()),
        }
    }
}
