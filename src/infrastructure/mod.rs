//! Infrastructure layer - External service integrations
//!
//! This layer contains:
//! - Aptos node REST client
//! - Wallet signer bridge
//! - Marketplace fetcher and dispatcher
//! - Tokio runtime bridge for async operations

pub mod aptos;
pub mod market;
pub mod runtime;
pub mod wallet;
