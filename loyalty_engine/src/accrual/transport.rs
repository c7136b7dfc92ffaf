use std::{future::Future, sync::Arc, time::Duration};

use log::*;
use reqwest::{header::RETRY_AFTER, Client};

use crate::accrual::{AccrualClientConfig, AccrualError, AccrualResponse};

/// Performs a single status request against the accrual system.
///
/// Implementations report what the accrual system said, and only fail when no response was received at all. Deciding
/// what a response means is up to [`crate::accrual::AccrualClient`].
pub trait AccrualTransport: Send + Sync + 'static {
    fn get_order_status(&self, number: &str) -> impl Future<Output = Result<AccrualResponse, AccrualError>> + Send;
}

#[derive(Clone)]
pub struct HttpAccrualTransport {
    config: AccrualClientConfig,
    client: Arc<Client>,
}

impl HttpAccrualTransport {
    pub fn new(config: AccrualClientConfig) -> Result<Self, AccrualError> {
        let client = Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self { config, client: Arc::new(client) })
    }
}

impl AccrualTransport for HttpAccrualTransport {
    async fn get_order_status(&self, number: &str) -> Result<AccrualResponse, AccrualError> {
        let url = self.config.order_url(number);
        trace!("🌐️ GET {url}");
        let response = self.client.get(url).send().await?;
        let status = response.status().as_u16();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_secs);
        let body = response.bytes().await?.to_vec();
        trace!("🌐️ Accrual system responded with {status} for order {number} ({} bytes)", body.len());
        Ok(AccrualResponse { status, retry_after, body })
    }
}
