//! # Order accrual processing pipeline
//!
//! Accepted orders are pushed onto a bounded queue ([`OrderQueue`]) and picked up by a fixed pool of worker tasks
//! ([`AccrualPipeline`]). Each worker owns an order from start to finish: it reloads the order, marks it
//! `PROCESSING`, polls the accrual system and settles the result ([`OrderProcessor`]).
//!
//! The queue is the only backpressure point. Its capacity bounds the memory used by a burst of submissions, and the
//! pool size bounds the number of concurrent requests to the accrual system.
//!
//! Nothing in the pipeline is a source of truth. An order that falls out of it (a failed poll, an exhausted attempt
//! budget, or a shutdown) keeps its `NEW` or `PROCESSING` status in the database and is picked up again by re-drive.
mod processor;
mod queue;
mod worker_pool;

pub use processor::{OrderProcessor, ProcessError, ProcessOutcome};
pub use queue::{Backpressure, EnqueueError, EnqueueResult, OrderQueue, QueueEntry};
pub use worker_pool::{AccrualPipeline, PipelineConfig, ShutdownOutcome};
