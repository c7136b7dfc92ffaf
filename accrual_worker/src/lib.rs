//! # Accrual worker
//! This crate hosts the process that drives the loyalty engine's accrual pipeline. It is responsible for:
//! * Starting a fixed pool of workers that poll the accrual system and settle orders.
//! * Periodically re-driving orders that are stored as `NEW` or `PROCESSING` but are not in the pipeline.
//! * Draining the pipeline on Ctrl-C.
//!
//! ## Configuration
//! The worker is configured via environment variables. See [config](config/index.html) for more information.
pub mod cli;
pub mod config;
pub mod errors;
pub mod redrive_worker;
pub mod worker;
