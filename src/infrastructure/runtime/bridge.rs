//! Runtime bridge - connects sync TUI thread with async Tokio runtime
//!
//! The TUI thread never blocks on the network: it sends `RuntimeCommand`s and
//! drains `RuntimeEvent`s each tick. Fetch commands carry the sequence number
//! issued by the app, echoed back so stale responses can be discarded.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;

use anyhow::Result;
use tokio::runtime::Runtime;

use crate::config::MarketConfig;
use crate::domain::{Nft, Offer};
use crate::infrastructure::aptos::HttpNodeClient;
use crate::infrastructure::market::{
    Dispatcher, EntryOperation, FetchReport, MarketFetcher, OperationKey,
};
use crate::infrastructure::runtime::worker::{run_async_worker, MarketServices};
use crate::infrastructure::wallet::HttpWalletSigner;

/// Commands sent from the TUI to the async worker
#[derive(Debug, Clone)]
pub enum RuntimeCommand {
    /// Fetch listings for the market screen
    FetchMarket { seq: u64 },
    /// Fetch NFTs owned by the configured account
    FetchCollection { seq: u64 },
    /// Fetch outstanding offers on one NFT
    FetchOffers { seq: u64, nft_id: u64 },
    /// Sign, submit and confirm an entry function
    Submit { op: EntryOperation },
    /// Shutdown the worker
    Shutdown,
}

/// Which read a fetch event answers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchTarget {
    Market,
    Collection,
    Offers { nft_id: u64 },
}

/// Events sent from the async worker to the TUI
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    /// Worker is up; names of the node and wallet it talks to
    Ready { node: String, wallet: String },
    MarketLoaded {
        seq: u64,
        nfts: Vec<Nft>,
        total: usize,
        skipped: usize,
    },
    CollectionLoaded {
        seq: u64,
        nfts: Vec<Nft>,
        /// Ids the node reported as owned
        total_ids: usize,
        skipped: usize,
    },
    OffersLoaded {
        seq: u64,
        nft_id: u64,
        offers: Vec<Offer>,
    },
    FetchFailed {
        target: FetchTarget,
        seq: u64,
        message: String,
    },
    /// Wallet accepted the transaction; waiting for the chain
    OperationSubmitted { key: OperationKey, hash: String },
    OperationConfirmed { key: OperationKey, hash: String },
    OperationFailed { key: OperationKey, message: String },
    /// Error occurred
    Error { message: String },
}

impl RuntimeEvent {
    pub(crate) fn market(seq: u64, report: FetchReport) -> Self {
        RuntimeEvent::MarketLoaded {
            seq,
            nfts: report.nfts,
            total: report.requested,
            skipped: report.skipped,
        }
    }

    pub(crate) fn collection(seq: u64, report: FetchReport) -> Self {
        RuntimeEvent::CollectionLoaded {
            seq,
            nfts: report.nfts,
            total_ids: report.requested,
            skipped: report.skipped,
        }
    }
}

/// Bridge between sync TUI thread and async Tokio runtime
pub struct RuntimeBridge {
    cmd_tx: Sender<RuntimeCommand>,
    evt_rx: Receiver<RuntimeEvent>,
}

impl RuntimeBridge {
    /// Create a bridge talking HTTP to the configured node and wallet
    pub fn new(config: MarketConfig) -> Result<Self> {
        let node = Arc::new(HttpNodeClient::new(&config.node_url, config.request_timeout)?);
        let signer = Arc::new(HttpWalletSigner::new(
            &config.wallet_url,
            config.confirm_timeout,
        )?);
        let services = MarketServices {
            fetcher: Arc::new(MarketFetcher::new(node.clone(), config.clone())),
            dispatcher: Arc::new(Dispatcher::new(node, signer, config.clone())),
            account: config.account.clone(),
        };
        Ok(Self::spawn(services))
    }

    /// Start the worker thread over already-built services
    pub fn spawn(services: MarketServices) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel::<RuntimeCommand>();
        let (evt_tx, evt_rx) = mpsc::channel::<RuntimeEvent>();

        // Spawn the worker thread with its own Tokio runtime
        thread::spawn(move || {
            let rt = match Runtime::new() {
                Ok(rt) => rt,
                Err(err) => {
                    let _ = evt_tx.send(RuntimeEvent::Error {
                        message: format!("Failed to create Tokio runtime: {}", err),
                    });
                    return;
                }
            };
            rt.block_on(async {
                if let Err(err) = run_async_worker(services, cmd_rx, evt_tx.clone()).await {
                    let _ = evt_tx.send(RuntimeEvent::Error {
                        message: format!("Worker exited: {:#}", err),
                    });
                }
            });
        });

        Self { cmd_tx, evt_rx }
    }

    /// Send a command to the async worker
    pub fn send(&self, cmd: RuntimeCommand) -> Result<()> {
        self.cmd_tx
            .send(cmd)
            .map_err(|_| anyhow::anyhow!("Worker channel closed"))
    }

    /// Poll for events (non-blocking)
    pub fn poll_events(&self) -> Vec<RuntimeEvent> {
        let mut events = Vec::new();
        while let Ok(evt) = self.evt_rx.try_recv() {
            events.push(evt);
        }
        events
    }
}

impl Drop for RuntimeBridge {
    fn drop(&mut self) {
        // Try to send shutdown command
        let _ = self.cmd_tx.send(RuntimeCommand::Shutdown);
    }
}
