//! Client for the Etherscan-style block-indexing API.
//!
//! Every response is a JSON envelope with a `result` field; anything else —
//! transport errors, non-2xx statuses, non-JSON bodies, or a `result` of the
//! wrong shape (the API reports rate limits as a string result) — counts as
//! a failed attempt and is retried by the resilient executor.

use alloy::primitives::Address;
use anyhow::{anyhow, Context, Result};
use serde_json::Value;
use std::time::Duration;

use crate::config::consts::SCAN_REQUEST_TIMEOUT_SECS;
use crate::retry::{retry, RetryConfig};
use crate::scanner::types::RawLogEvent;

pub struct IndexerClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    contract: Address,
    event_topic: String,
    retry_config: RetryConfig,
}

impl IndexerClient {
    pub fn new(
        base_url: String,
        api_key: String,
        contract: Address,
        event_topic: String,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(SCAN_REQUEST_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(SCAN_REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            http,
            base_url,
            api_key,
            contract,
            event_topic,
            retry_config: RetryConfig::scanning(),
        })
    }

    /// Override the retry profile. Used by tests to drop the delays.
    pub fn with_retry(mut self, retry_config: RetryConfig) -> Self {
        self.retry_config = retry_config;
        self
    }

    /// Block number closest before the given Unix timestamp.
    pub async fn block_by_time(&self, timestamp: u64) -> Result<u64> {
        let params = [
            ("module", "block".to_string()),
            ("action", "getblocknobytime".to_string()),
            ("timestamp", timestamp.to_string()),
            ("closest", "before".to_string()),
        ];
        retry(self.retry_config.clone(), "block_by_time", || async {
            let result = self.fetch_result(&params).await?;
            parse_decimal_block(&result)
        })
        .await
    }

    /// Current chain head block number.
    pub async fn head_block(&self) -> Result<u64> {
        let params = [
            ("module", "proxy".to_string()),
            ("action", "eth_blockNumber".to_string()),
        ];
        retry(self.retry_config.clone(), "head_block", || async {
            let result = self.fetch_result(&params).await?;
            parse_hex_block(&result)
        })
        .await
    }

    /// Deposit event logs for the watched contract in `[from, to]`, inclusive.
    pub async fn logs(&self, from: u64, to: u64) -> Result<Vec<RawLogEvent>> {
        let params = [
            ("module", "logs".to_string()),
            ("action", "getLogs".to_string()),
            ("fromBlock", from.to_string()),
            ("toBlock", to.to_string()),
            ("address", self.contract.to_string()),
            ("topic0", self.event_topic.clone()),
        ];
        retry(self.retry_config.clone(), "get_logs", || async {
            let result = self.fetch_result(&params).await?;
            serde_json::from_value(result).context("Log list has unexpected shape")
        })
        .await
    }

    /// One request, one attempt: GET the envelope and extract `result`.
    async fn fetch_result(&self, params: &[(&str, String)]) -> Result<Value> {
        let response = self
            .http
            .get(&self.base_url)
            .query(params)
            .query(&[("apikey", self.api_key.as_str())])
            .send()
            .await
            .context("Request failed")?
            .error_for_status()
            .context("HTTP error status")?;

        let body: Value = response.json().await.context("Body is not JSON")?;
        body.get("result")
            .cloned()
            .ok_or_else(|| anyhow!("Response missing result field"))
    }
}

fn parse_decimal_block(value: &Value) -> Result<u64> {
    match value {
        Value::String(s) => s
            .trim()
            .parse()
            .with_context(|| format!("Block number is not decimal: {s}")),
        Value::Number(n) => n.as_u64().context("Block number out of range"),
        other => Err(anyhow!("Unexpected block number result: {other}")),
    }
}

fn parse_hex_block(value: &Value) -> Result<u64> {
    let s = value
        .as_str()
        .ok_or_else(|| anyhow!("Unexpected head block result: {value}"))?;
    let stripped = s.strip_prefix("0x").unwrap_or(s);
    u64::from_str_radix(stripped, 16).with_context(|| format!("Head block is not hex: {s}"))
}
