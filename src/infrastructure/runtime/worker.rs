//! Async worker - runs in Tokio runtime and handles marketplace operations

use std::sync::mpsc::{Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use crate::infrastructure::market::{Dispatcher, MarketFetcher};
use crate::infrastructure::runtime::bridge::{FetchTarget, RuntimeCommand, RuntimeEvent};

/// What the worker needs to serve commands
pub struct MarketServices {
    pub fetcher: Arc<MarketFetcher>,
    pub dispatcher: Arc<Dispatcher>,
    /// Owner for the collection screen
    pub account: Option<String>,
}

/// Run the async worker loop. Every command gets its own task, so a slow
/// confirmation never holds up a fetch.
pub async fn run_async_worker(
    services: MarketServices,
    cmd_rx: Receiver<RuntimeCommand>,
    evt_tx: Sender<RuntimeEvent>,
) -> Result<()> {
    let node = services.fetcher.endpoint_name();
    let wallet = services.dispatcher.wallet_name();
    tracing::info!(%node, %wallet, "worker started");
    let _ = evt_tx.send(RuntimeEvent::Ready { node, wallet });

    loop {
        // Process commands (non-blocking)
        loop {
            match cmd_rx.try_recv() {
                Ok(RuntimeCommand::Shutdown) | Err(TryRecvError::Disconnected) => {
                    tracing::info!("worker shutting down");
                    return Ok(());
                }
                Ok(cmd) => handle_command(&services, cmd, &evt_tx),
                Err(TryRecvError::Empty) => break,
            }
        }

        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

fn handle_command(services: &MarketServices, cmd: RuntimeCommand, evt_tx: &Sender<RuntimeEvent>) {
    let evt_tx = evt_tx.clone();
    match cmd {
        RuntimeCommand::FetchMarket { seq } => {
            let fetcher = Arc::clone(&services.fetcher);
            tokio::spawn(async move {
                let event = match fetcher.fetch_listings().await {
                    Ok(report) => RuntimeEvent::market(seq, report),
                    Err(err) => fetch_failed(FetchTarget::Market, seq, err),
                };
                let _ = evt_tx.send(event);
            });
        }

        RuntimeCommand::FetchCollection { seq } => {
            let Some(owner) = services.account.clone() else {
                let _ = evt_tx.send(RuntimeEvent::FetchFailed {
                    target: FetchTarget::Collection,
                    seq,
                    message: "No account configured".into(),
                });
                return;
            };
            let fetcher = Arc::clone(&services.fetcher);
            tokio::spawn(async move {
                let event = match fetcher.fetch_owned(&owner).await {
                    Ok(report) => RuntimeEvent::collection(seq, report),
                    Err(err) => fetch_failed(FetchTarget::Collection, seq, err),
                };
                let _ = evt_tx.send(event);
            });
        }

        RuntimeCommand::FetchOffers { seq, nft_id } => {
            let fetcher = Arc::clone(&services.fetcher);
            tokio::spawn(async move {
                let event = match fetcher.fetch_offers(nft_id).await {
                    Ok(offers) => RuntimeEvent::OffersLoaded {
                        seq,
                        nft_id,
                        offers,
                    },
                    Err(err) => fetch_failed(FetchTarget::Offers { nft_id }, seq, err),
                };
                let _ = evt_tx.send(event);
            });
        }

        RuntimeCommand::Submit { op } => {
            let dispatcher = Arc::clone(&services.dispatcher);
            tokio::spawn(async move {
                let key = op.key();
                let submitted_tx = evt_tx.clone();
                let result = dispatcher
                    .dispatch(&op, move |hash| {
                        let _ = submitted_tx.send(RuntimeEvent::OperationSubmitted {
                            key,
                            hash: hash.to_string(),
                        });
                    })
                    .await;
                let event = match result {
                    Ok(hash) => RuntimeEvent::OperationConfirmed { key, hash },
                    Err(err) => {
                        tracing::warn!(op = %key, "operation failed: {}", err);
                        RuntimeEvent::OperationFailed {
                            key,
                            message: err.to_string(),
                        }
                    }
                };
                let _ = evt_tx.send(event);
            });
        }

        RuntimeCommand::Shutdown => {}
    }
}

fn fetch_failed(target: FetchTarget, seq: u64, err: anyhow::Error) -> RuntimeEvent {
    tracing::warn!(?target, seq, "fetch failed: {:#}", err);
    RuntimeEvent::FetchFailed {
        target,
        seq,
        message: format!("{:#}", err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::time::Instant;

    use serde_json::json;

    use crate::infrastructure::market::fake::{
        detail_tuple, market_config, resource_record, FakeNode, FakeSigner,
    };
    use crate::infrastructure::market::EntryOperation;
    use crate::infrastructure::runtime::RuntimeBridge;

    fn bridge(node: FakeNode, account: Option<String>) -> RuntimeBridge {
        let node = Arc::new(node);
        let config = market_config();
        RuntimeBridge::spawn(MarketServices {
            fetcher: Arc::new(MarketFetcher::new(node.clone(), config.clone())),
            dispatcher: Arc::new(Dispatcher::new(
                node,
                Arc::new(FakeSigner::default()),
                config,
            )),
            account,
        })
    }

    /// Collect events until `done` says so or 5s pass
    fn wait_for(bridge: &RuntimeBridge, done: impl Fn(&[RuntimeEvent]) -> bool) -> Vec<RuntimeEvent> {
        let deadline = Instant::now() + Duration::from_secs(5);
        let mut events = Vec::new();
        while Instant::now() < deadline {
            events.extend(
                bridge
                    .poll_events()
                    .into_iter()
                    .filter(|e| !matches!(e, RuntimeEvent::Ready { .. })),
            );
            if done(&events) {
                break;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        events
    }

    #[test]
    fn test_fetch_commands_echo_sequence() {
        let mut details = HashMap::new();
        details.insert(5, detail_tuple(5, "mine", 10, 2));
        let node = FakeNode {
            resource: Some(json!({"nfts": [resource_record(1, "a", 1, true, 1)]})),
            owned: vec![json!(["5"])],
            details,
            ..Default::default()
        };
        let bridge = bridge(node, Some("0xbb".into()));
        bridge.send(RuntimeCommand::FetchMarket { seq: 4 }).unwrap();
        bridge.send(RuntimeCommand::FetchCollection { seq: 9 }).unwrap();

        let events = wait_for(&bridge, |events| events.len() >= 2);
        assert!(events.iter().any(|e| matches!(
            e,
            RuntimeEvent::MarketLoaded { seq: 4, nfts, total: 1, skipped: 0 } if nfts.len() == 1
        )));
        assert!(events.iter().any(|e| matches!(
            e,
            RuntimeEvent::CollectionLoaded { seq: 9, total_ids: 1, .. }
        )));
    }

    #[test]
    fn test_worker_announces_endpoints_first() {
        let bridge = bridge(FakeNode::default(), None);
        let deadline = Instant::now() + Duration::from_secs(5);
        let mut events = Vec::new();
        while events.is_empty() && Instant::now() < deadline {
            events.extend(bridge.poll_events());
            std::thread::sleep(Duration::from_millis(10));
        }
        assert!(matches!(
            events.first(),
            Some(RuntimeEvent::Ready { node, wallet }) if node == "fake" && wallet == "fake"
        ));
    }

    #[test]
    fn test_collection_without_account_fails() {
        let bridge = bridge(FakeNode::default(), None);
        bridge.send(RuntimeCommand::FetchCollection { seq: 1 }).unwrap();
        let events = wait_for(&bridge, |events| !events.is_empty());
        assert!(matches!(
            events.first(),
            Some(RuntimeEvent::FetchFailed {
                target: FetchTarget::Collection,
                seq: 1,
                ..
            })
        ));
    }

    #[test]
    fn test_submit_reports_submitted_then_confirmed() {
        let bridge = bridge(FakeNode::default(), None);
        bridge
            .send(RuntimeCommand::Submit {
                op: EntryOperation::Like { nft_id: 8 },
            })
            .unwrap();
        let events = wait_for(&bridge, |events| {
            events
                .iter()
                .any(|e| matches!(e, RuntimeEvent::OperationConfirmed { .. }))
        });
        assert!(matches!(
            events.as_slice(),
            [
                RuntimeEvent::OperationSubmitted { .. },
                RuntimeEvent::OperationConfirmed { key, .. }
            ] if key.nft_id == 8
        ));
    }
}
