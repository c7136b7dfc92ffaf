//! # Accrual system client
//!
//! The accrual system is an external, rate-limited service that decides how many points an order earns. It is polled
//! with `GET {base}/api/orders/{number}` until it returns a final verdict for the order.
//!
//! * [`AccrualTransport`] performs one request and hands back the raw status, `Retry-After` header and body.
//!   [`HttpAccrualTransport`] is the `reqwest` implementation.
//! * [`AccrualClient`] interprets the responses, and owns the retry and back-off policy. It never writes anything.
mod client;
mod errors;
mod objects;
mod transport;

pub use client::AccrualClient;
pub use errors::AccrualError;
pub use objects::{AccrualClientConfig, AccrualDetails, AccrualResponse, AccrualStatus, PollOutcome};
pub use transport::{AccrualTransport, HttpAccrualTransport};
