//! Aptos node REST client

use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use reqwest::StatusCode;
use serde_json::Value;

use super::types::{TransactionStatus, ViewRequest};

/// Read access to an Aptos fullnode.
///
/// Kept behind a trait so the fetcher and dispatcher can run against an
/// in-memory node in tests.
#[async_trait::async_trait]
pub trait NodeClient: Send + Sync + 'static {
    /// `data` of an account resource
    async fn account_resource(&self, address: &str, resource_type: &str) -> Result<Value>;

    /// Call a view function; returns the result tuple
    async fn view(&self, request: &ViewRequest) -> Result<Vec<Value>>;

    async fn transaction_by_hash(&self, hash: &str) -> Result<TransactionStatus>;

    /// Get endpoint display name
    fn endpoint_name(&self) -> String;
}

pub struct HttpNodeClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpNodeClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

#[async_trait::async_trait]
impl NodeClient for HttpNodeClient {
    async fn account_resource(&self, address: &str, resource_type: &str) -> Result<Value> {
        let url = self.url(&format!("accounts/{}/resource/{}", address, resource_type));
        tracing::debug!(%url, "fetching resource");
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Failed to reach node at {}", self.base_url))?;
        let mut body = read_json(response).await?;
        body.get_mut("data")
            .map(Value::take)
            .ok_or_else(|| anyhow!("resource {} has no data", resource_type))
    }

    async fn view(&self, request: &ViewRequest) -> Result<Vec<Value>> {
        tracing::debug!(function = %request.function, "view call");
        let response = self
            .http
            .post(self.url("view"))
            .json(request)
            .send()
            .await
            .with_context(|| format!("Failed to reach node at {}", self.base_url))?;
        let body = read_json(response)
            .await
            .with_context(|| format!("view {} failed", request.function))?;
        match body {
            Value::Array(values) => Ok(values),
            other => Err(anyhow!(
                "view {} returned {} instead of an array",
                request.function,
                other
            )),
        }
    }

    async fn transaction_by_hash(&self, hash: &str) -> Result<TransactionStatus> {
        let response = self
            .http
            .get(self.url(&format!("transactions/by_hash/{}", hash)))
            .send()
            .await
            .with_context(|| format!("Failed to reach node at {}", self.base_url))?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(TransactionStatus::Pending);
        }
        let body = read_json(response).await?;
        Ok(TransactionStatus::from_json(&body))
    }

    fn endpoint_name(&self) -> String {
        self.base_url.clone()
    }
}

/// Parse a JSON body, turning non-2xx responses into errors carrying the
/// node's `message`
async fn read_json(response: reqwest::Response) -> Result<Value> {
    let status = response.status();
    let text = response.text().await.context("Failed to read node response")?;
    if !status.is_success() {
        return Err(anyhow!("node returned {}: {}", status, error_message(&text)));
    }
    serde_json::from_str(&text).context("Failed to parse node response")
}

/// `message` (node) or `error` (wallet bridge) field of an error body, else the raw text
pub(crate) fn error_message(text: &str) -> String {
    serde_json::from_str::<Value>(text)
        .ok()
        .and_then(|body| {
            body.get("message")
                .or_else(|| body.get("error"))
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| text.trim().to_string())
}

/// Poll the node until the transaction is committed or failed.
///
/// Returns `Pending` if `timeout` elapses first. Poll errors are logged and
/// retried; the last one is returned if the deadline passes without a
/// successful poll.
pub async fn wait_for_transaction(
    node: &dyn NodeClient,
    hash: &str,
    timeout: Duration,
    poll_every: Duration,
) -> Result<TransactionStatus> {
    let deadline = Instant::now() + timeout;
    loop {
        let poll_error = match node.transaction_by_hash(hash).await {
            Ok(status) if status.is_final() => return Ok(status),
            Ok(_) => None,
            Err(err) => {
                tracing::warn!(%hash, "confirmation poll failed: {:#}", err);
                Some(err)
            }
        };
        if Instant::now() >= deadline {
            return match poll_error {
                Some(err) => Err(err),
                None => Ok(TransactionStatus::Pending),
            };
        }
        tokio::time::sleep(poll_every).await;
    }
}
