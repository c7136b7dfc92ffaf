use loyalty_engine::{accrual::AccrualError, StoreError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("A database error occurred. {0}")]
    DatabaseError(#[from] StoreError),
    #[error("Could not set up the accrual system client. {0}")]
    AccrualClientError(#[from] AccrualError),
    #[error("An I/O error happened in the worker. {0}")]
    IOError(#[from] std::io::Error),
}
