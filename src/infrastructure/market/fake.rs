//! In-memory node and signer for unit tests

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use serde_json::{json, Value};

use crate::config::{Config, MarketConfig};
use crate::infrastructure::aptos::{NodeClient, TransactionStatus, ViewRequest};
use crate::infrastructure::wallet::{EntryFunctionPayload, WalletSigner};

pub(crate) const MARKET: &str = "0xaa";
pub(crate) const OWNER: &str = "0xbb";

pub(crate) fn market_config() -> MarketConfig {
    Config {
        marketplace_address: Some(MARKET.into()),
        account: Some(OWNER.into()),
        confirm_timeout_secs: 1,
        confirm_poll_ms: 50,
        ..Default::default()
    }
    .resolve()
    .unwrap()
}

pub(crate) fn hex_text(text: &str) -> String {
    format!("0x{}", hex::encode(text))
}

pub(crate) fn resource_record(id: u64, name: &str, price: u64, for_sale: bool, rarity: u64) -> Value {
    json!({
        "id": id.to_string(),
        "owner": OWNER,
        "creator": OWNER,
        "name": hex_text(name),
        "description": hex_text("desc"),
        "uri": hex_text("https://img"),
        "price": price.to_string(),
        "for_sale": for_sale,
        "rarity": rarity,
        "likes": "0"
    })
}

pub(crate) fn detail_tuple(id: u64, name: &str, price: u64, rarity: u64) -> Vec<Value> {
    vec![
        json!(id.to_string()),
        json!(OWNER),
        json!(OWNER),
        json!(hex_text(name)),
        json!(hex_text("desc")),
        json!(hex_text("https://img")),
        json!(price.to_string()),
        json!(false),
        json!(rarity),
        json!("1"),
    ]
}

#[derive(Default)]
pub(crate) struct FakeNode {
    pub resource: Option<Value>,
    /// Returned by `get_all_nfts_for_owner`, already shaped
    pub owned: Vec<Value>,
    pub details: HashMap<u64, Vec<Value>>,
    pub offers: HashMap<u64, Vec<Value>>,
    pub status: Option<TransactionStatus>,
    pub views: AtomicUsize,
    pub requests: Mutex<Vec<ViewRequest>>,
}

impl FakeNode {
    pub fn view_count(&self) -> usize {
        self.views.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl NodeClient for FakeNode {
    async fn account_resource(&self, _address: &str, _resource_type: &str) -> Result<Value> {
        self.resource
            .clone()
            .ok_or_else(|| anyhow!("node returned 404 Not Found: Resource not found"))
    }

    async fn view(&self, request: &ViewRequest) -> Result<Vec<Value>> {
        self.views.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        let function = request.function.rsplit("::").next().unwrap_or_default();
        let id = || {
            request
                .arguments
                .get(1)
                .and_then(Value::as_str)
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(u64::MAX)
        };
        match function {
            "get_all_nfts_for_owner" => Ok(self.owned.clone()),
            "get_nft_details" => self
                .details
                .get(&id())
                .cloned()
                .ok_or_else(|| anyhow!("Move abort: E_NFT_NOT_FOUND")),
            "get_offers" => Ok(vec![Value::Array(
                self.offers.get(&id()).cloned().unwrap_or_default(),
            )]),
            other => Err(anyhow!("unknown view function {}", other)),
        }
    }

    async fn transaction_by_hash(&self, _hash: &str) -> Result<TransactionStatus> {
        Ok(self
            .status
            .clone()
            .unwrap_or(TransactionStatus::Committed { version: Some(1) }))
    }

    fn endpoint_name(&self) -> String {
        "fake".into()
    }
}

#[derive(Default)]
pub(crate) struct FakeSigner {
    pub reject_with: Option<String>,
    pub submitted: Mutex<Vec<EntryFunctionPayload>>,
}

impl FakeSigner {
    pub fn calls(&self) -> usize {
        self.submitted.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl WalletSigner for FakeSigner {
    async fn sign_and_submit(&self, payload: &EntryFunctionPayload) -> Result<String> {
        let mut submitted = self.submitted.lock().unwrap();
        submitted.push(payload.clone());
        match &self.reject_with {
            Some(message) => Err(anyhow!("wallet rejected: {}", message)),
            None => Ok(format!("0x{:064x}", submitted.len())),
        }
    }

    fn name(&self) -> String {
        "fake".into()
    }
}
