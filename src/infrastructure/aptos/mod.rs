//! Aptos infrastructure - node REST client

mod client;
mod types;

pub(crate) use client::error_message;
pub use client::{wait_for_transaction, HttpNodeClient, NodeClient};
pub use types::{TransactionStatus, ViewRequest};
