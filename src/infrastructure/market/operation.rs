//! Marketplace entry functions and their payloads

use std::fmt;

use crate::config::MarketConfig;
use crate::domain::{is_valid_address, normalize_address, AmountError};
use crate::infrastructure::wallet::EntryFunctionPayload;

use super::dispatcher::DispatchError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OperationKind {
    Like,
    MakeOffer,
    AcceptOffer,
    DeclineOffer,
    Purchase,
    ListForSale,
    Transfer,
    Tip,
}

impl OperationKind {
    /// Entry function name in the marketplace module
    pub fn function_name(&self) -> &'static str {
        match self {
            OperationKind::Like => "like_nft",
            OperationKind::MakeOffer => "make_offer",
            OperationKind::AcceptOffer => "accept_offer",
            OperationKind::DeclineOffer => "decline_offer",
            OperationKind::Purchase => "purchase_nft",
            OperationKind::ListForSale => "list_for_sale",
            OperationKind::Transfer => "transfer_nft",
            OperationKind::Tip => "tip_or_donate",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            OperationKind::Like => "Like",
            OperationKind::MakeOffer => "Offer",
            OperationKind::AcceptOffer => "Accept offer",
            OperationKind::DeclineOffer => "Decline offer",
            OperationKind::Purchase => "Purchase",
            OperationKind::ListForSale => "List for sale",
            OperationKind::Transfer => "Transfer",
            OperationKind::Tip => "Tip",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// In-flight identity: at most one submission per kind per NFT
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OperationKey {
    pub kind: OperationKind,
    pub nft_id: u64,
}

impl fmt::Display for OperationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} #{}", self.kind, self.nft_id)
    }
}

/// A user-triggered state change on the marketplace contract.
/// Amounts are octas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryOperation {
    Like { nft_id: u64 },
    MakeOffer { nft_id: u64, octas: u64 },
    AcceptOffer { nft_id: u64, offerer: String },
    DeclineOffer { nft_id: u64, offerer: String },
    Purchase { nft_id: u64, octas: u64 },
    ListForSale { nft_id: u64, octas: u64 },
    Transfer { nft_id: u64, recipient: String },
    Tip { nft_id: u64, octas: u64 },
}

impl EntryOperation {
    pub fn kind(&self) -> OperationKind {
        match self {
            EntryOperation::Like { .. } => OperationKind::Like,
            EntryOperation::MakeOffer { .. } => OperationKind::MakeOffer,
            EntryOperation::AcceptOffer { .. } => OperationKind::AcceptOffer,
            EntryOperation::DeclineOffer { .. } => OperationKind::DeclineOffer,
            EntryOperation::Purchase { .. } => OperationKind::Purchase,
            EntryOperation::ListForSale { .. } => OperationKind::ListForSale,
            EntryOperation::Transfer { .. } => OperationKind::Transfer,
            EntryOperation::Tip { .. } => OperationKind::Tip,
        }
    }

    pub fn nft_id(&self) -> u64 {
        match self {
            EntryOperation::Like { nft_id }
            | EntryOperation::MakeOffer { nft_id, .. }
            | EntryOperation::AcceptOffer { nft_id, .. }
            | EntryOperation::DeclineOffer { nft_id, .. }
            | EntryOperation::Purchase { nft_id, .. }
            | EntryOperation::ListForSale { nft_id, .. }
            | EntryOperation::Transfer { nft_id, .. }
            | EntryOperation::Tip { nft_id, .. } => *nft_id,
        }
    }

    pub fn key(&self) -> OperationKey {
        OperationKey {
            kind: self.kind(),
            nft_id: self.nft_id(),
        }
    }

    /// Reject malformed input before anything reaches the signer.
    /// Every amount, including a purchase price, must be positive.
    pub fn validate(&self, config: &MarketConfig) -> Result<(), DispatchError> {
        match self {
            EntryOperation::Like { .. } => positive(config.like_fee_octas),
            EntryOperation::MakeOffer { octas, .. }
            | EntryOperation::ListForSale { octas, .. }
            | EntryOperation::Tip { octas, .. }
            | EntryOperation::Purchase { octas, .. } => positive(*octas),
            EntryOperation::AcceptOffer { offerer: address, .. }
            | EntryOperation::DeclineOffer { offerer: address, .. }
            | EntryOperation::Transfer {
                recipient: address, ..
            } => {
                if is_valid_address(address) {
                    Ok(())
                } else {
                    Err(DispatchError::InvalidAddress(address.clone()))
                }
            }
        }
    }

    /// `[marketplace, nft_id, trailing]` against `<marketplace>::<module>::<fn>`
    pub fn payload(&self, config: &MarketConfig) -> EntryFunctionPayload {
        let trailing = match self {
            EntryOperation::Like { .. } => config.like_fee_octas.to_string(),
            EntryOperation::MakeOffer { octas, .. }
            | EntryOperation::Purchase { octas, .. }
            | EntryOperation::ListForSale { octas, .. }
            | EntryOperation::Tip { octas, .. } => octas.to_string(),
            EntryOperation::AcceptOffer { offerer: address, .. }
            | EntryOperation::DeclineOffer { offerer: address, .. }
            | EntryOperation::Transfer {
                recipient: address, ..
            } => normalize_address(address).unwrap_or_else(|| address.trim().to_string()),
        };
        EntryFunctionPayload::new(
            config.function(self.kind().function_name()),
            vec![
                config.marketplace.clone(),
                self.nft_id().to_string(),
                trailing,
            ],
        )
    }
}

fn positive(octas: u64) -> Result<(), DispatchError> {
    if octas == 0 {
        return Err(DispatchError::InvalidAmount(AmountError::NotPositive));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn config() -> MarketConfig {
        Config {
            marketplace_address: Some("0xAA".into()),
            ..Default::default()
        }
        .resolve()
        .unwrap()
    }

    #[test]
    fn test_payload_function_and_argument_order() {
        let config = config();
        let cases = [
            (
                EntryOperation::Like { nft_id: 1 },
                "like_nft",
                "1000000",
            ),
            (
                EntryOperation::MakeOffer {
                    nft_id: 1,
                    octas: 250_000_000,
                },
                "make_offer",
                "250000000",
            ),
            (
                EntryOperation::AcceptOffer {
                    nft_id: 1,
                    offerer: "0xB0B".into(),
                },
                "accept_offer",
                "0xb0b",
            ),
            (
                EntryOperation::DeclineOffer {
                    nft_id: 1,
                    offerer: "0xb0b".into(),
                },
                "decline_offer",
                "0xb0b",
            ),
            (
                EntryOperation::Purchase {
                    nft_id: 1,
                    octas: 150_000_000,
                },
                "purchase_nft",
                "150000000",
            ),
            (
                EntryOperation::ListForSale {
                    nft_id: 1,
                    octas: 7,
                },
                "list_for_sale",
                "7",
            ),
            (
                EntryOperation::Transfer {
                    nft_id: 1,
                    recipient: " 0xC0FFEE ".into(),
                },
                "transfer_nft",
                "0xc0ffee",
            ),
            (
                EntryOperation::Tip {
                    nft_id: 1,
                    octas: 10_000_000,
                },
                "tip_or_donate",
                "10000000",
            ),
        ];
        for (op, function, trailing) in cases {
            let payload = op.payload(&config);
            assert_eq!(payload.function, format!("0xaa::NFTMarketplace::{}", function));
            assert!(payload.type_arguments.is_empty());
            assert_eq!(payload.arguments, vec!["0xaa", "1", trailing]);
        }
    }

    #[test]
    fn test_validate_rejects_zero_amounts_and_bad_addresses() {
        let config = config();
        assert!(EntryOperation::MakeOffer { nft_id: 1, octas: 0 }
            .validate(&config)
            .is_err());
        assert!(EntryOperation::ListForSale { nft_id: 1, octas: 0 }
            .validate(&config)
            .is_err());
        assert!(EntryOperation::Tip { nft_id: 1, octas: 0 }
            .validate(&config)
            .is_err());
        assert!(matches!(
            EntryOperation::Transfer {
                nft_id: 1,
                recipient: "bob".into()
            }
            .validate(&config),
            Err(DispatchError::InvalidAddress(_))
        ));
        assert!(matches!(
            EntryOperation::Purchase { nft_id: 1, octas: 0 }.validate(&config),
            Err(DispatchError::InvalidAmount(AmountError::NotPositive))
        ));
        assert!(EntryOperation::Purchase { nft_id: 1, octas: 1 }
            .validate(&config)
            .is_ok());
        assert!(EntryOperation::Like { nft_id: 1 }.validate(&config).is_ok());
    }

    #[test]
    fn test_key_identity() {
        let a = EntryOperation::MakeOffer {
            nft_id: 4,
            octas: 1,
        };
        let b = EntryOperation::MakeOffer {
            nft_id: 4,
            octas: 2,
        };
        assert_eq!(a.key(), b.key());
        assert_ne!(a.key(), EntryOperation::Tip { nft_id: 4, octas: 1 }.key());
        assert_eq!(a.key().to_string(), "Offer #4");
    }
}
