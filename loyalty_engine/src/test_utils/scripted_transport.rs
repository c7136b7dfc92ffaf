//! An in-memory stand-in for the accrual system. Each order number gets a script of replies which are handed out in
//! order. Once a script runs dry, the fallback reply (`204 No Content` unless set otherwise) is returned.
use std::{
    collections::{HashMap, VecDeque},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
        Mutex,
    },
    time::Duration,
};

use serde_json::json;

use crate::accrual::{AccrualError, AccrualResponse, AccrualTransport};

pub type Reply = Result<AccrualResponse, AccrualError>;

#[derive(Default)]
struct Scripts {
    replies: HashMap<String, VecDeque<Reply>>,
    calls: HashMap<String, usize>,
    fallback: Option<Reply>,
}

/// Requests currently being answered, and the highest that number has been.
#[derive(Default)]
struct Concurrency {
    active: AtomicUsize,
    peak: AtomicUsize,
}

#[derive(Clone, Default)]
pub struct ScriptedTransport {
    scripts: Arc<Mutex<Scripts>>,
    concurrency: Arc<Concurrency>,
    latency: Option<Duration>,
}

impl ScriptedTransport {
    /// Every request waits this long before replying, to simulate a slow accrual system.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn with_fallback(self, reply: Reply) -> Self {
        self.scripts.lock().expect("Scripted transport lock poisoned").fallback = Some(reply);
        self
    }

    /// Appends replies to the script for the given order number.
    pub fn script<I: IntoIterator<Item = Reply>>(&self, number: &str, replies: I) {
        let mut scripts = self.scripts.lock().expect("Scripted transport lock poisoned");
        scripts.replies.entry(number.to_string()).or_default().extend(replies);
    }

    /// The number of requests made so far for the given order number.
    pub fn calls(&self, number: &str) -> usize {
        self.scripts.lock().expect("Scripted transport lock poisoned").calls.get(number).copied().unwrap_or_default()
    }

    pub fn total_calls(&self) -> usize {
        self.scripts.lock().expect("Scripted transport lock poisoned").calls.values().sum()
    }

    /// The largest number of requests that were in progress at the same time.
    pub fn peak_concurrency(&self) -> usize {
        self.concurrency.peak.load(Ordering::SeqCst)
    }

    fn next_reply(&self, number: &str) -> Reply {
        let mut scripts = self.scripts.lock().expect("Scripted transport lock poisoned");
        *scripts.calls.entry(number.to_string()).or_default() += 1;
        let next = scripts.replies.get_mut(number).and_then(|q| q.pop_front());
        next.or_else(|| scripts.fallback.clone()).unwrap_or_else(no_content)
    }
}

impl AccrualTransport for ScriptedTransport {
    async fn get_order_status(&self, number: &str) -> Result<AccrualResponse, AccrualError> {
        let active = self.concurrency.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.concurrency.peak.fetch_max(active, Ordering::SeqCst);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        let reply = self.next_reply(number);
        self.concurrency.active.fetch_sub(1, Ordering::SeqCst);
        reply
    }
}

fn details(number: &str, status: &str, accrual: Option<f64>) -> Reply {
    let body = match accrual {
        Some(a) => json!({ "order": number, "status": status, "accrual": a }),
        None => json!({ "order": number, "status": status }),
    };
    Ok(AccrualResponse::new(200).with_body(body.to_string()))
}

pub fn registered(number: &str) -> Reply {
    details(number, "REGISTERED", None)
}

pub fn processing(number: &str) -> Reply {
    details(number, "PROCESSING", None)
}

pub fn invalid(number: &str) -> Reply {
    details(number, "INVALID", None)
}

pub fn processed(number: &str, accrual: f64) -> Reply {
    details(number, "PROCESSED", Some(accrual))
}

pub fn ok_body(body: &str) -> Reply {
    Ok(AccrualResponse::new(200).with_body(body))
}

pub fn no_content() -> Reply {
    Ok(AccrualResponse::new(204))
}

pub fn rate_limited(retry_after_secs: Option<u64>) -> Reply {
    let response = AccrualResponse::new(429);
    Ok(match retry_after_secs {
        Some(secs) => response.with_retry_after(Duration::from_secs(secs)),
        None => response,
    })
}

pub fn server_error() -> Reply {
    Ok(AccrualResponse::new(500))
}

pub fn status(code: u16) -> Reply {
    Ok(AccrualResponse::new(code))
}
