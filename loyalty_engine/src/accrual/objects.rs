use std::{fmt::Display, time::Duration};

use lp_common::Points;
use serde::{Deserialize, Serialize};

use crate::db_types::TerminalStatus;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(1);
pub const DEFAULT_MAX_RETRY_DELAY: Duration = Duration::from_secs(60);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

//--------------------------------------  AccrualClientConfig  ---------------------------------------------------------
#[derive(Debug, Clone)]
pub struct AccrualClientConfig {
    /// The accrual system address, e.g. `http://localhost:8081`. A trailing slash is ignored.
    pub base_url: String,
    /// The total number of requests made for one order before giving up with [`PollOutcome::Exhausted`].
    pub max_attempts: u32,
    /// How long to wait between requests while the order is still pending.
    pub retry_interval: Duration,
    /// Upper bound on the wait requested by the accrual system through `Retry-After`.
    pub max_retry_delay: Duration,
    pub request_timeout: Duration,
}

impl AccrualClientConfig {
    pub fn new<S: Into<String>>(base_url: S) -> Self {
        Self {
            base_url: base_url.into(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_interval: DEFAULT_RETRY_INTERVAL,
            max_retry_delay: DEFAULT_MAX_RETRY_DELAY,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_retry_interval(mut self, retry_interval: Duration) -> Self {
        self.retry_interval = retry_interval;
        self
    }

    pub fn with_max_retry_delay(mut self, max_retry_delay: Duration) -> Self {
        self.max_retry_delay = max_retry_delay;
        self
    }

    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    pub fn order_url(&self, number: &str) -> String {
        format!("{}/api/orders/{number}", self.base_url.trim_end_matches('/'))
    }
}

//--------------------------------------     AccrualStatus     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AccrualStatus {
    /// The order is known to the accrual system but has not been looked at yet.
    Registered,
    Processing,
    /// The order does not qualify for points.
    Invalid,
    /// The accrual has been calculated.
    Processed,
}

impl Display for AccrualStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Registered => write!(f, "REGISTERED"),
            Self::Processing => write!(f, "PROCESSING"),
            Self::Invalid => write!(f, "INVALID"),
            Self::Processed => write!(f, "PROCESSED"),
        }
    }
}

//--------------------------------------     AccrualDetails    ---------------------------------------------------------
/// The JSON body of a `200 OK` response from the accrual system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccrualDetails {
    pub order: String,
    pub status: AccrualStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accrual: Option<Points>,
}

impl AccrualDetails {
    /// Maps the accrual system's vocabulary onto ours. Pending answers map to `None`.
    pub fn terminal_status(&self) -> Option<TerminalStatus> {
        match self.status {
            AccrualStatus::Registered | AccrualStatus::Processing => None,
            AccrualStatus::Invalid => Some(TerminalStatus::Invalid),
            AccrualStatus::Processed => Some(TerminalStatus::Processed(self.accrual.unwrap_or_default())),
        }
    }
}

//--------------------------------------    AccrualResponse    ---------------------------------------------------------
/// A raw response from the accrual system, as seen by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccrualResponse {
    pub status: u16,
    /// The `Retry-After` header, if it was present and held a number of seconds.
    pub retry_after: Option<Duration>,
    pub body: Vec<u8>,
}

impl AccrualResponse {
    pub fn new(status: u16) -> Self {
        Self { status, retry_after: None, body: Vec::new() }
    }

    pub fn with_retry_after(mut self, retry_after: Duration) -> Self {
        self.retry_after = Some(retry_after);
        self
    }

    pub fn with_body<B: Into<Vec<u8>>>(mut self, body: B) -> Self {
        self.body = body.into();
        self
    }
}

//--------------------------------------      PollOutcome      ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// The accrual system gave its final verdict.
    Terminal(TerminalStatus),
    /// The attempt budget ran out while the order was still pending or the accrual system was rate-limiting us.
    Exhausted { attempts: u32 },
}
