//! Wallet signer - external collaborator that signs and submits transactions
//!
//! The signer holds the keys; this crate only hands it an entry-function
//! payload and gets back a transaction hash.

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use crate::infrastructure::aptos::error_message;

/// Entry-function payload in the wallet adapter's JSON form
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryFunctionPayload {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub function: String,
    pub type_arguments: Vec<String>,
    pub arguments: Vec<String>,
}

impl EntryFunctionPayload {
    pub fn new(function: String, arguments: Vec<String>) -> Self {
        Self {
            kind: "entry_function_payload",
            function,
            type_arguments: Vec::new(),
            arguments,
        }
    }
}

#[async_trait::async_trait]
pub trait WalletSigner: Send + Sync + 'static {
    /// Ask the wallet to sign and submit; returns the transaction hash.
    /// A user rejection is an error carrying the wallet's message.
    async fn sign_and_submit(&self, payload: &EntryFunctionPayload) -> Result<String>;

    fn name(&self) -> String;
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    hash: String,
}

/// Signer reached through a local wallet bridge over HTTP
pub struct HttpWalletSigner {
    http: reqwest::Client,
    base_url: String,
}

impl HttpWalletSigner {
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
}

#[async_trait::async_trait]
impl WalletSigner for HttpWalletSigner {
    async fn sign_and_submit(&self, payload: &EntryFunctionPayload) -> Result<String> {
        tracing::info!(function = %payload.function, "requesting wallet signature");
        let response = self
            .http
            .post(format!("{}/sign_and_submit", self.base_url))
            .json(payload)
            .send()
            .await
            .with_context(|| format!("Failed to reach wallet at {}", self.base_url))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .context("Failed to read wallet response")?;
        if !status.is_success() {
            return Err(anyhow!("wallet rejected: {}", error_message(&text)));
        }
        let body: SubmitResponse =
            serde_json::from_str(&text).context("Failed to parse wallet response")?;
        Ok(body.hash)
    }

    fn name(&self) -> String {
        self.base_url.clone()
    }
}
