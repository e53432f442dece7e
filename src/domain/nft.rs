//! NFT and offer records
//!
//! `RawNft`/`RawOffer` mirror what the Move module hands back (hex-encoded
//! byte strings, octa amounts, u64s as JSON strings). `Nft`/`Offer` are the
//! decoded snapshots the screens work with; see `domain::decode`.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::decode::{to_minor, AmountError, DecodeError, DecodeFailure};

/// Rarity tier assigned by the contract at mint time
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    SuperRare,
}

impl Rarity {
    pub const ALL: [Rarity; 4] = [
        Rarity::Common,
        Rarity::Uncommon,
        Rarity::Rare,
        Rarity::SuperRare,
    ];

    pub fn from_u64(value: u64) -> Option<Self> {
        match value {
            1 => Some(Rarity::Common),
            2 => Some(Rarity::Uncommon),
            3 => Some(Rarity::Rare),
            4 => Some(Rarity::SuperRare),
            _ => None,
        }
    }

    pub fn value(&self) -> u8 {
        match self {
            Rarity::Common => 1,
            Rarity::Uncommon => 2,
            Rarity::Rare => 3,
            Rarity::SuperRare => 4,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Rarity::Common => "Common",
            Rarity::Uncommon => "Uncommon",
            Rarity::Rare => "Rare",
            Rarity::SuperRare => "Super Rare",
        }
    }

    /// Parse a user-facing rarity name or tier number
    pub fn parse(input: &str) -> Option<Self> {
        let normalized = input
            .trim()
            .to_lowercase()
            .replace(|c: char| matches!(c, '-' | '_' | ' '), "");
        match normalized.as_str() {
            "1" | "common" => Some(Rarity::Common),
            "2" | "uncommon" => Some(Rarity::Uncommon),
            "3" | "rare" => Some(Rarity::Rare),
            "4" | "superrare" | "super" => Some(Rarity::SuperRare),
            _ => None,
        }
    }
}

/// NFT record as stored on chain, before text and amount decoding
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawNft {
    #[serde(deserialize_with = "de_move_u64")]
    pub id: u64,
    pub owner: String,
    #[serde(default)]
    pub creator: String,
    pub name: String,
    pub description: String,
    pub uri: String,
    #[serde(deserialize_with = "de_move_u64")]
    pub price: u64,
    pub for_sale: bool,
    #[serde(deserialize_with = "de_move_u64")]
    pub rarity: u64,
    #[serde(deserialize_with = "de_move_u64")]
    pub likes: u64,
}

impl RawNft {
    /// Number of values returned by the `get_nft_details` view function
    pub const DETAIL_ARITY: usize = 10;

    /// Build from the `get_nft_details` tuple:
    /// `(id, owner, creator, name, description, uri, price, for_sale, rarity, likes)`.
    ///
    /// `requested_id` is only used to name the record in errors.
    pub fn from_detail_tuple(requested_id: u64, values: &[Value]) -> Result<Self, DecodeError> {
        let fail = |field: &'static str, failure: DecodeFailure| DecodeError {
            id: requested_id,
            field,
            failure,
        };

        if values.len() != Self::DETAIL_ARITY {
            return Err(fail(
                "details",
                DecodeFailure::Shape {
                    expected: "10-value tuple",
                    found: format!("{} values", values.len()),
                },
            ));
        }

        let u64_at = |idx: usize, field: &'static str| {
            move_u64(&values[idx]).ok_or_else(|| fail(field, shape("u64", &values[idx])))
        };
        let str_at = |idx: usize, field: &'static str| {
            values[idx]
                .as_str()
                .map(str::to_string)
                .ok_or_else(|| fail(field, shape("string", &values[idx])))
        };

        Ok(Self {
            id: u64_at(0, "id")?,
            owner: str_at(1, "owner")?,
            creator: str_at(2, "creator")?,
            name: str_at(3, "name")?,
            description: str_at(4, "description")?,
            uri: str_at(5, "uri")?,
            price: u64_at(6, "price")?,
            for_sale: values[7]
                .as_bool()
                .ok_or_else(|| fail("for_sale", shape("bool", &values[7])))?,
            rarity: u64_at(8, "rarity")?,
            likes: u64_at(9, "likes")?,
        })
    }
}

/// Outstanding offer as returned by `get_offers`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawOffer {
    pub buyer: String,
    #[serde(deserialize_with = "de_move_u64")]
    pub offer_price: u64,
}

/// Decoded NFT snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct Nft {
    pub id: u64,
    pub owner: String,
    pub creator: String,
    pub name: String,
    pub description: String,
    pub uri: String,
    /// Display-scale APT
    pub price: f64,
    pub for_sale: bool,
    pub rarity: Rarity,
    pub likes: u64,
}

impl Nft {
    /// Price re-scaled to octas for submission
    pub fn price_octas(&self) -> Result<u64, AmountError> {
        to_minor(self.price)
    }

    /// Case-insensitive substring match against name or description.
    /// `needle` must already be lowercase.
    pub fn matches_text(&self, needle: &str) -> bool {
        needle.is_empty()
            || self.name.to_lowercase().contains(needle)
            || self.description.to_lowercase().contains(needle)
    }
}

/// Natural identity of an offer: one outstanding offer per offerer per NFT
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OfferKey {
    pub nft_id: u64,
    pub offerer: String,
}

/// Decoded offer snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct Offer {
    pub nft_id: u64,
    pub offerer: String,
    /// Display-scale APT
    pub amount: f64,
    pub amount_octas: u64,
}

impl Offer {
    pub fn key(&self) -> OfferKey {
        OfferKey {
            nft_id: self.nft_id,
            offerer: self.offerer.to_lowercase(),
        }
    }
}

/// Move u64 values arrive as JSON strings; small integer types as numbers
pub(crate) fn move_u64(value: &Value) -> Option<u64> {
    match value {
        Value::String(s) => s.trim().parse().ok(),
        Value::Number(n) => n.as_u64(),
        _ => None,
    }
}

fn de_move_u64<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    move_u64(&value)
        .ok_or_else(|| serde::de::Error::custom(format!("expected u64, got {}", value)))
}

fn shape(expected: &'static str, found: &Value) -> DecodeFailure {
    DecodeFailure::Shape {
        expected,
        found: found.to_string(),
    }
}
