//! Marketplace services built on the node client and wallet signer

mod dispatcher;
#[cfg(test)]
pub(crate) mod fake;
mod fetcher;
mod operation;

pub use dispatcher::{DispatchError, Dispatcher, InFlightGuard};
pub use fetcher::{FetchReport, MarketFetcher};
pub use operation::{EntryOperation, OperationKey, OperationKind};
