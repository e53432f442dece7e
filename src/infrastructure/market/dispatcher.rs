//! Write side: validate, sign through the wallet, wait for the chain

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use thiserror::Error;

use crate::config::MarketConfig;
use crate::domain::AmountError;
use crate::infrastructure::aptos::{wait_for_transaction, NodeClient, TransactionStatus};
use crate::infrastructure::wallet::WalletSigner;

use super::operation::{EntryOperation, OperationKey};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("{0} is already in progress")]
    InFlight(OperationKey),
    #[error("invalid amount: {0}")]
    InvalidAmount(#[from] AmountError),
    #[error("invalid address `{0}`")]
    InvalidAddress(String),
    #[error("{0}")]
    Rejected(String),
    #[error("transaction {hash} failed: {vm_status}")]
    Failed { hash: String, vm_status: String },
    #[error("transaction {hash} not confirmed after {secs}s")]
    Timeout { hash: String, secs: u64 },
    #[error("could not confirm transaction {hash}: {message}")]
    Confirmation { hash: String, message: String },
}

type InFlightSet = Arc<Mutex<HashSet<OperationKey>>>;

fn lock(set: &InFlightSet) -> MutexGuard<'_, HashSet<OperationKey>> {
    match set.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Holds an operation key in the in-flight set until dropped
#[derive(Debug)]
pub struct InFlightGuard {
    key: OperationKey,
    set: InFlightSet,
}

impl InFlightGuard {
    pub fn key(&self) -> OperationKey {
        self.key
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        lock(&self.set).remove(&self.key);
    }
}

pub struct Dispatcher {
    node: Arc<dyn NodeClient>,
    signer: Arc<dyn WalletSigner>,
    config: MarketConfig,
    in_flight: InFlightSet,
}

impl Dispatcher {
    pub fn new(
        node: Arc<dyn NodeClient>,
        signer: Arc<dyn WalletSigner>,
        config: MarketConfig,
    ) -> Self {
        Self {
            node,
            signer,
            config,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Validate and claim the operation's key. Fails if the same kind of
    /// operation on the same NFT has not resolved yet.
    pub fn reserve(&self, op: &EntryOperation) -> Result<InFlightGuard, DispatchError> {
        op.validate(&self.config)?;
        let key = op.key();
        if !lock(&self.in_flight).insert(key) {
            return Err(DispatchError::InFlight(key));
        }
        Ok(InFlightGuard {
            key,
            set: Arc::clone(&self.in_flight),
        })
    }

    pub fn wallet_name(&self) -> String {
        self.signer.name()
    }

    /// Submit one operation: exactly one signer call, no retry.
    ///
    /// `on_submitted` runs with the hash once the wallet accepts. Returns the
    /// hash after the transaction commits successfully.
    pub async fn dispatch<F>(&self, op: &EntryOperation, on_submitted: F) -> Result<String, DispatchError>
    where
        F: FnOnce(&str) + Send,
    {
        let guard = self.reserve(op)?;
        let payload = op.payload(&self.config);
        tracing::info!(op = %guard.key(), function = %payload.function, "submitting");

        let hash = self
            .signer
            .sign_and_submit(&payload)
            .await
            .map_err(|err| DispatchError::Rejected(format!("{:#}", err)))?;
        on_submitted(&hash);

        let status = wait_for_transaction(
            self.node.as_ref(),
            &hash,
            self.config.confirm_timeout,
            self.config.confirm_poll,
        )
        .await
        .map_err(|err| DispatchError::Confirmation {
            hash: hash.clone(),
            message: format!("{:#}", err),
        })?;

        match status {
            TransactionStatus::Committed { version } => {
                tracing::info!(op = %guard.key(), %hash, ?version, "confirmed");
                Ok(hash)
            }
            TransactionStatus::Failed { vm_status } => Err(DispatchError::Failed { hash, vm_status }),
            TransactionStatus::Pending => Err(DispatchError::Timeout {
                hash,
                secs: self.config.confirm_timeout.as_secs(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::market::fake::{market_config, FakeNode, FakeSigner};
    use crate::infrastructure::market::operation::OperationKind;

    fn dispatcher(node: FakeNode, signer: FakeSigner) -> (Arc<FakeSigner>, Dispatcher) {
        let signer = Arc::new(signer);
        let dispatcher = Dispatcher::new(Arc::new(node), signer.clone(), market_config());
        (signer, dispatcher)
    }

    fn offer(octas: u64) -> EntryOperation {
        EntryOperation::MakeOffer { nft_id: 3, octas }
    }

    #[tokio::test]
    async fn test_dispatch_success_submits_once() {
        let (signer, dispatcher) = dispatcher(FakeNode::default(), FakeSigner::default());
        let mut seen = None;
        let hash = dispatcher
            .dispatch(&offer(250_000_000), |hash| seen = Some(hash.to_string()))
            .await
            .unwrap();
        assert_eq!(seen.as_deref(), Some(hash.as_str()));
        assert_eq!(signer.calls(), 1);
        let submitted = signer.submitted.lock().unwrap();
        assert_eq!(submitted[0].arguments, vec!["0xaa", "3", "250000000"]);
        drop(submitted);
        assert!(dispatcher.reserve(&offer(1)).is_ok());
    }

    #[tokio::test]
    async fn test_invalid_input_never_reaches_signer() {
        let (signer, dispatcher) = dispatcher(FakeNode::default(), FakeSigner::default());
        let err = dispatcher.dispatch(&offer(0), |_| {}).await.unwrap_err();
        assert_eq!(err, DispatchError::InvalidAmount(AmountError::NotPositive));
        let err = dispatcher
            .dispatch(
                &EntryOperation::Transfer {
                    nft_id: 1,
                    recipient: "not-an-address".into(),
                },
                |_| {},
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::InvalidAddress(_)));
        assert_eq!(signer.calls(), 0);
    }

    #[tokio::test]
    async fn test_duplicate_rejected_while_in_flight() {
        let (signer, dispatcher) = dispatcher(FakeNode::default(), FakeSigner::default());
        let guard = dispatcher.reserve(&offer(1)).unwrap();

        let err = dispatcher.dispatch(&offer(2), |_| {}).await.unwrap_err();
        assert_eq!(
            err,
            DispatchError::InFlight(OperationKey {
                kind: OperationKind::MakeOffer,
                nft_id: 3
            })
        );
        assert_eq!(signer.calls(), 0);

        // other kinds and other NFTs are independent
        assert!(dispatcher
            .reserve(&EntryOperation::Tip { nft_id: 3, octas: 1 })
            .is_ok());
        assert!(dispatcher
            .reserve(&EntryOperation::MakeOffer { nft_id: 4, octas: 1 })
            .is_ok());

        drop(guard);
        assert!(dispatcher.dispatch(&offer(2), |_| {}).await.is_ok());
        assert_eq!(signer.calls(), 1);
    }

    #[tokio::test]
    async fn test_signer_rejection_is_surfaced() {
        let (signer, dispatcher) = dispatcher(
            FakeNode::default(),
            FakeSigner {
                reject_with: Some("User rejected the request".into()),
                ..Default::default()
            },
        );
        let mut submitted = false;
        let err = dispatcher
            .dispatch(&EntryOperation::Like { nft_id: 1 }, |_| submitted = true)
            .await
            .unwrap_err();
        assert!(matches!(&err, DispatchError::Rejected(msg) if msg.contains("User rejected")));
        assert!(!submitted);
        assert_eq!(signer.calls(), 1);
        assert!(dispatcher.reserve(&EntryOperation::Like { nft_id: 1 }).is_ok());
    }

    #[tokio::test]
    async fn test_failed_transaction_carries_vm_status() {
        let (_, dispatcher) = dispatcher(
            FakeNode {
                status: Some(TransactionStatus::Failed {
                    vm_status: "Move abort in 0xaa::NFTMarketplace: 0x64".into(),
                }),
                ..Default::default()
            },
            FakeSigner::default(),
        );
        let err = dispatcher
            .dispatch(
                &EntryOperation::Purchase {
                    nft_id: 1,
                    octas: 100,
                },
                |_| {},
            )
            .await
            .unwrap_err();
        assert!(
            matches!(err, DispatchError::Failed { ref vm_status, .. } if vm_status.contains("0x64"))
        );
    }

    #[tokio::test]
    async fn test_unconfirmed_transaction_times_out() {
        let (_, dispatcher) = dispatcher(
            FakeNode {
                status: Some(TransactionStatus::Pending),
                ..Default::default()
            },
            FakeSigner::default(),
        );
        let err = dispatcher
            .dispatch(&EntryOperation::Like { nft_id: 2 }, |_| {})
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::Timeout { secs: 1, .. }));
    }
}
