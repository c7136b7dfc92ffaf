use thiserror::Error;

/// Fatal outcomes of polling the accrual system. None of these are retried; the order is left as it is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccrualError {
    #[error("The accrual system does not know order {0}")]
    UnknownOrder(String),
    #[error("The accrual system reported an internal error for order {0}")]
    UpstreamError(String),
    #[error("The accrual system responded with unexpected status code {0}")]
    UnexpectedStatus(u16),
    #[error("Could not reach the accrual system. {0}")]
    Transport(String),
    #[error("The accrual system sent a response we could not understand. {0}")]
    InvalidPayload(String),
}

impl From<reqwest::Error> for AccrualError {
    fn from(e: reqwest::Error) -> Self {
        AccrualError::Transport(e.to_string())
    }
}
