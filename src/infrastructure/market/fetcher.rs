//! Read side of the marketplace: listings, owned NFTs, offers

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use futures::future::join_all;
use serde_json::{json, Value};

use crate::config::MarketConfig;
use crate::domain::nft::move_u64;
use crate::domain::{normalize, normalize_offer, Nft, Offer, RawNft, RawOffer};
use crate::infrastructure::aptos::{NodeClient, ViewRequest};

/// Decoded records plus what was dropped on the way
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchReport {
    pub nfts: Vec<Nft>,
    /// Records (or ids) the node returned
    pub requested: usize,
    /// Records that failed to fetch or decode
    pub skipped: usize,
}

pub struct MarketFetcher {
    node: Arc<dyn NodeClient>,
    config: MarketConfig,
}

impl MarketFetcher {
    pub fn new(node: Arc<dyn NodeClient>, config: MarketConfig) -> Self {
        Self { node, config }
    }

    pub fn config(&self) -> &MarketConfig {
        &self.config
    }

    pub fn endpoint_name(&self) -> String {
        self.node.endpoint_name()
    }

    /// Every NFT in the marketplace resource that is listed for sale
    pub async fn fetch_listings(&self) -> Result<FetchReport> {
        let data = self
            .node
            .account_resource(&self.config.marketplace, &self.config.resource_type())
            .await
            .context("Failed to fetch marketplace")?;
        let records = data
            .get("nfts")
            .and_then(Value::as_array)
            .ok_or_else(|| anyhow!("marketplace resource has no `nfts` list"))?;

        let mut report = FetchReport {
            requested: records.len(),
            ..Default::default()
        };
        for (index, record) in records.iter().enumerate() {
            match decode_record(record) {
                Ok(nft) if nft.for_sale => report.nfts.push(nft),
                Ok(_) => {}
                Err(err) => {
                    report.skipped += 1;
                    tracing::warn!(index, "skipping marketplace record: {:#}", err);
                }
            }
        }
        tracing::info!(
            listed = report.nfts.len(),
            total = report.requested,
            skipped = report.skipped,
            "fetched marketplace"
        );
        Ok(report)
    }

    /// NFTs owned by `owner`: one id query, then a concurrent detail fetch per id.
    /// A failing id is logged and left out.
    pub async fn fetch_owned(&self, owner: &str) -> Result<FetchReport> {
        let request = ViewRequest::new(
            self.config.function("get_all_nfts_for_owner"),
            vec![
                json!(self.config.marketplace),
                json!(owner),
                json!(self.config.owned_fetch_limit.to_string()),
                json!("0"),
            ],
        );
        let values = self
            .node
            .view(&request)
            .await
            .context("Failed to fetch owned NFT ids")?;
        let ids = parse_id_list(&values)?;

        let results = join_all(ids.iter().map(|&id| self.fetch_detail(id))).await;

        let mut report = FetchReport {
            requested: ids.len(),
            ..Default::default()
        };
        for (id, result) in ids.iter().zip(results) {
            match result {
                Ok(nft) => report.nfts.push(nft),
                Err(err) => {
                    report.skipped += 1;
                    tracing::warn!(nft_id = id, "skipping owned nft: {:#}", err);
                }
            }
        }
        tracing::info!(
            owner,
            shown = report.nfts.len(),
            owned = report.requested,
            "fetched collection"
        );
        Ok(report)
    }

    async fn fetch_detail(&self, id: u64) -> Result<Nft> {
        let request = ViewRequest::new(
            self.config.function("get_nft_details"),
            vec![json!(self.config.marketplace), json!(id.to_string())],
        );
        let values = self.node.view(&request).await?;
        let raw = RawNft::from_detail_tuple(id, &values)?;
        Ok(normalize(raw)?)
    }

    /// Outstanding offers on one NFT
    pub async fn fetch_offers(&self, nft_id: u64) -> Result<Vec<Offer>> {
        let request = ViewRequest::new(
            self.config.function("get_offers"),
            vec![json!(self.config.marketplace), json!(nft_id.to_string())],
        );
        let values = self
            .node
            .view(&request)
            .await
            .with_context(|| format!("Failed to fetch offers for nft {}", nft_id))?;

        let records = match values.first() {
            Some(Value::Array(inner)) => inner.as_slice(),
            _ => values.as_slice(),
        };
        let offers = records
            .iter()
            .filter_map(|record| match serde_json::from_value::<RawOffer>(record.clone()) {
                Ok(raw) => Some(normalize_offer(nft_id, raw)),
                Err(err) => {
                    tracing::warn!(nft_id, "skipping malformed offer: {}", err);
                    None
                }
            })
            .collect();
        Ok(offers)
    }
}

fn decode_record(record: &Value) -> Result<Nft> {
    let raw: RawNft =
        serde_json::from_value(record.clone()).context("malformed marketplace record")?;
    Ok(normalize(raw)?)
}

/// `[[ids]]` as returned by the view function; a flat list is accepted too
fn parse_id_list(values: &[Value]) -> Result<Vec<u64>> {
    let list = match values.first() {
        Some(Value::Array(inner)) => inner.as_slice(),
        _ => values,
    };
    list.iter()
        .map(|value| move_u64(value).ok_or_else(|| anyhow!("owned id {} is not a u64", value)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Rarity;
    use crate::infrastructure::market::fake::{
        detail_tuple, market_config, resource_record, FakeNode, OWNER,
    };

    fn fetcher(node: FakeNode) -> (Arc<FakeNode>, MarketFetcher) {
        let node = Arc::new(node);
        let fetcher = MarketFetcher::new(node.clone(), market_config());
        (node, fetcher)
    }

    #[tokio::test]
    async fn test_listings_keep_for_sale_and_skip_bad_records() {
        let mut broken = resource_record(3, "Broken", 1, true, 1);
        broken["name"] = json!("0x4");
        let (_, fetcher) = fetcher(FakeNode {
            resource: Some(json!({
                "nfts": [
                    resource_record(1, "Listed", 200_000_000, true, 2),
                    resource_record(2, "Kept", 100_000_000, false, 1),
                    broken,
                ]
            })),
            ..Default::default()
        });

        let report = fetcher.fetch_listings().await.unwrap();
        assert_eq!(report.requested, 3);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.nfts.len(), 1);
        assert_eq!(report.nfts[0].name, "Listed");
        assert_eq!(report.nfts[0].price, 2.0);
        assert_eq!(report.nfts[0].rarity, Rarity::Uncommon);
    }

    #[tokio::test]
    async fn test_listings_read_failure_is_an_error() {
        let (_, fetcher) = fetcher(FakeNode::default());
        let err = fetcher.fetch_listings().await.unwrap_err();
        assert!(format!("{:#}", err).contains("Resource not found"));
    }

    #[tokio::test]
    async fn test_owned_isolates_failing_detail() {
        let mut details = std::collections::HashMap::new();
        for id in [1u64, 2, 4, 5] {
            details.insert(id, detail_tuple(id, &format!("nft {}", id), 1_000, 1));
        }
        let (node, fetcher) = fetcher(FakeNode {
            owned: vec![json!(["1", "2", "3", "4", "5"])],
            details,
            ..Default::default()
        });

        let report = fetcher.fetch_owned(OWNER).await.unwrap();
        assert_eq!(report.requested, 5);
        assert_eq!(report.skipped, 1);
        let mut ids: Vec<u64> = report.nfts.iter().map(|n| n.id).collect();
        ids.sort();
        assert_eq!(ids, vec![1, 2, 4, 5]);
        assert_eq!(node.view_count(), 6);

        let requests = node.requests.lock().unwrap();
        assert_eq!(
            requests[0].arguments,
            vec![json!("0xaa"), json!(OWNER), json!("100"), json!("0")]
        );
    }

    #[tokio::test]
    async fn test_owned_accepts_flat_id_list() {
        let mut details = std::collections::HashMap::new();
        details.insert(9, detail_tuple(9, "solo", 5, 4));
        let (_, fetcher) = fetcher(FakeNode {
            owned: vec![json!("9")],
            details,
            ..Default::default()
        });
        let report = fetcher.fetch_owned(OWNER).await.unwrap();
        assert_eq!(report.nfts.len(), 1);
        assert_eq!(report.nfts[0].rarity, Rarity::SuperRare);
    }

    #[tokio::test]
    async fn test_owned_empty() {
        let (node, fetcher) = fetcher(FakeNode {
            owned: vec![json!([])],
            ..Default::default()
        });
        let report = fetcher.fetch_owned(OWNER).await.unwrap();
        assert!(report.nfts.is_empty());
        assert_eq!(report.requested, 0);
        assert_eq!(node.view_count(), 1);
    }

    #[tokio::test]
    async fn test_offers_decode() {
        let mut offers = std::collections::HashMap::new();
        offers.insert(
            7,
            vec![
                json!({"buyer": "0xC1", "offer_price": "50000000"}),
                json!({"buyer": "0xC2"}),
                json!({"buyer": "0xC3", "offer_price": "125000000"}),
            ],
        );
        let (_, fetcher) = fetcher(FakeNode {
            offers,
            ..Default::default()
        });
        let offers = fetcher.fetch_offers(7).await.unwrap();
        assert_eq!(offers.len(), 2);
        assert_eq!(offers[0].offerer, "0xC1");
        assert_eq!(offers[0].amount, 0.5);
        assert_eq!(offers[1].amount_octas, 125_000_000);
        assert!(offers.iter().all(|o| o.nft_id == 7));
    }
}
