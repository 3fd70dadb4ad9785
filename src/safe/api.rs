//! Read-only client for the multisig coordination service.

use anyhow::{Context, Result};
use std::time::Duration;
use tracing::debug;

use crate::config::consts::{QUEUE_FETCH_LIMIT, QUEUE_REQUEST_TIMEOUT_SECS};
use crate::retry::{retry, RetryConfig};
use crate::safe::types::{MultisigTransaction, TransactionPage};

pub struct SafeQueueClient {
    http: reqwest::Client,
    base_url: String,
    safe_address: String,
    retry_config: RetryConfig,
}

impl SafeQueueClient {
    pub fn new(base_url: String, safe_address: String) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(QUEUE_REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            safe_address,
            retry_config: RetryConfig::queue(),
        })
    }

    /// Override the retry profile. Used by tests to drop the delays.
    pub fn with_retry(mut self, retry_config: RetryConfig) -> Self {
        self.retry_config = retry_config;
        self
    }

    /// The most recent transactions for the configured Safe, newest first as
    /// served by the coordination service. Exhausted retries surface as an
    /// error the caller reports as "queue unavailable".
    pub async fn recent_transactions(&self) -> Result<Vec<MultisigTransaction>> {
        let url = format!(
            "{}/api/v1/safes/{}/multisig-transactions/",
            self.base_url, self.safe_address
        );
        let transactions = retry(self.retry_config.clone(), "fetch_transactions", || async {
            let page: TransactionPage = self
                .http
                .get(&url)
                .query(&[("limit", QUEUE_FETCH_LIMIT)])
                .send()
                .await
                .context("Request failed")?
                .error_for_status()
                .context("HTTP error status")?
                .json()
                .await
                .context("Body is not a transaction page")?;
            Ok::<_, anyhow::Error>(page.results)
        })
        .await?;

        debug!(count = transactions.len(), "Fetched coordination feed");
        Ok(transactions)
    }

    /// Fresh copy of one transaction, looked up by nonce in the recent feed.
    pub async fn transaction_by_nonce(&self, nonce: u64) -> Result<Option<MultisigTransaction>> {
        let transactions = self.recent_transactions().await?;
        Ok(transactions.into_iter().find(|tx| tx.nonce == nonce))
    }
}
