use std::time::Duration;

use log::*;

use crate::accrual::{AccrualClientConfig, AccrualDetails, AccrualError, AccrualResponse, AccrualTransport, PollOutcome};
use crate::db_types::TerminalStatus;

/// What to do after a single response.
#[derive(Debug, Clone, PartialEq, Eq)]
enum PollStep {
    Done(TerminalStatus),
    Retry { reason: String, delay: Duration },
}

/// Polls the accrual system for one order at a time, retrying while the answer is pending or rate-limited.
pub struct AccrualClient<T> {
    transport: T,
    max_attempts: u32,
    retry_interval: Duration,
    max_retry_delay: Duration,
}

impl<T: AccrualTransport> AccrualClient<T> {
    pub fn new(transport: T, config: &AccrualClientConfig) -> Self {
        Self {
            transport,
            max_attempts: config.max_attempts.max(1),
            retry_interval: config.retry_interval,
            max_retry_delay: config.max_retry_delay,
        }
    }

    /// Polls until the accrual system returns a final verdict for the order, a fatal condition arises, or the attempt
    /// budget runs out. Nothing is persisted here.
    pub async fn poll(&self, number: &str) -> Result<PollOutcome, AccrualError> {
        let mut attempts = 0;
        loop {
            attempts += 1;
            let response = self.transport.get_order_status(number).await?;
            match self.classify(number, response)? {
                PollStep::Done(terminal) => {
                    debug!("🌐️ Order {number} is {terminal} after {attempts} attempt(s)");
                    return Ok(PollOutcome::Terminal(terminal));
                },
                PollStep::Retry { reason, .. } if attempts >= self.max_attempts => {
                    info!("🌐️ Giving up on order {number} for now after {attempts} attempts. Last response: {reason}");
                    return Ok(PollOutcome::Exhausted { attempts });
                },
                PollStep::Retry { reason, delay } => {
                    debug!("🌐️ Order {number}: {reason}. Retrying in {}ms", delay.as_millis());
                    tokio::time::sleep(delay).await;
                },
            }
        }
    }

    fn classify(&self, number: &str, response: AccrualResponse) -> Result<PollStep, AccrualError> {
        match response.status {
            200 => {
                let details = serde_json::from_slice::<AccrualDetails>(&response.body)
                    .map_err(|e| AccrualError::InvalidPayload(e.to_string()))?;
                if details.order != number {
                    warn!("🌐️ Asked for order {number}, but the accrual system answered for {}", details.order);
                }
                match details.terminal_status() {
                    Some(terminal) => Ok(PollStep::Done(terminal)),
                    None => Ok(PollStep::Retry {
                        reason: format!("status is {}", details.status),
                        delay: self.retry_interval,
                    }),
                }
            },
            204 => Err(AccrualError::UnknownOrder(number.to_string())),
            429 => {
                let delay = response.retry_after.map(|d| d.min(self.max_retry_delay)).unwrap_or(self.retry_interval);
                Ok(PollStep::Retry { reason: "rate limited".into(), delay })
            },
            500 => Err(AccrualError::UpstreamError(number.to_string())),
            code => Err(AccrualError::UnexpectedStatus(code)),
        }
    }
}
