//! Decoding of on-chain values into display values
//!
//! Text fields are stored by the Move module as `vector<u8>` and come back
//! as `0x`-prefixed hex. Amounts are octas (1 APT = 10^8 octas).

use thiserror::Error;

use super::nft::{Nft, Offer, Rarity, RawNft, RawOffer};

/// Octas per display APT
pub const OCTAS_PER_APT: u64 = 100_000_000;

const DECIMALS: usize = 8;

/// Why a single field could not be decoded
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeFailure {
    #[error("missing 0x prefix")]
    MissingPrefix,
    #[error("invalid hex: {0}")]
    Hex(#[from] hex::FromHexError),
    #[error("invalid utf-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("rarity {0} outside 1..=4")]
    Rarity(u64),
    #[error("expected {expected}, got {found}")]
    Shape {
        expected: &'static str,
        found: String,
    },
}

/// A record that failed to decode; the record is skipped, the batch continues
#[derive(Debug, Clone, PartialEq, Error)]
#[error("nft {id}: field `{field}`: {failure}")]
pub struct DecodeError {
    pub id: u64,
    pub field: &'static str,
    #[source]
    pub failure: DecodeFailure,
}

/// Rejected monetary amount
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    #[error("amount is empty")]
    Empty,
    #[error("`{0}` is not a number")]
    NotANumber(String),
    #[error("amount is not finite")]
    NotFinite,
    #[error("amount must be greater than zero")]
    NotPositive,
    #[error("amount is too large")]
    TooLarge,
}

/// Decode a `0x`-prefixed hex byte string into UTF-8 text
pub fn decode_hex_text(value: &str) -> Result<String, DecodeFailure> {
    let payload = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .ok_or(DecodeFailure::MissingPrefix)?;
    let bytes = hex::decode(payload)?;
    Ok(String::from_utf8(bytes)?)
}

/// Octas to display APT
pub fn to_display(octas: u64) -> f64 {
    octas as f64 / OCTAS_PER_APT as f64
}

/// Display APT back to octas: `floor(amount * 10^8)`.
///
/// A product within a few ULPs of an integer is that integer, so
/// `to_minor(to_display(m)) == m` for every `m` below 2^51.
pub fn to_minor(amount: f64) -> Result<u64, AmountError> {
    if !amount.is_finite() {
        return Err(AmountError::NotFinite);
    }
    if amount < 0.0 {
        return Err(AmountError::NotPositive);
    }
    let scaled = amount * OCTAS_PER_APT as f64;
    let nearest = scaled.round();
    let tolerance = f64::EPSILON * nearest.abs().max(1.0) * 4.0;
    let octas = if (scaled - nearest).abs() <= tolerance {
        nearest
    } else {
        scaled.floor()
    };
    if octas >= u64::MAX as f64 {
        return Err(AmountError::TooLarge);
    }
    Ok(octas as u64)
}

/// Parse user input in APT into octas.
///
/// Decimal text is parsed exactly; digits past the eighth decimal place are
/// dropped (floor). Zero, negative and non-numeric input is rejected.
pub fn parse_amount(input: &str) -> Result<u64, AmountError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(AmountError::Empty);
    }
    if let Some(rest) = input.strip_prefix('-') {
        return match parse_unsigned_decimal(rest.trim()) {
            Some(_) => Err(AmountError::NotPositive),
            None => Err(AmountError::NotANumber(input.to_string())),
        };
    }
    let octas = parse_unsigned_decimal(input)
        .ok_or_else(|| AmountError::NotANumber(input.to_string()))??;
    if octas == 0 {
        return Err(AmountError::NotPositive);
    }
    Ok(octas)
}

/// `None` when the text is not a plain decimal; `Some(Err)` on overflow
fn parse_unsigned_decimal(value: &str) -> Option<Result<u64, AmountError>> {
    let (integer_part, fraction_part) = match value.split_once('.') {
        Some((integer, fraction)) => (integer, fraction),
        None => (value, ""),
    };
    if integer_part.is_empty() && fraction_part.is_empty() {
        return None;
    }
    let all_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    if !all_digits(integer_part) || !all_digits(fraction_part) {
        return None;
    }

    let integer: u64 = if integer_part.is_empty() {
        0
    } else {
        match integer_part.parse() {
            Ok(value) => value,
            Err(_) => return Some(Err(AmountError::TooLarge)),
        }
    };

    let mut fraction_digits: String = fraction_part.chars().take(DECIMALS).collect();
    while fraction_digits.len() < DECIMALS {
        fraction_digits.push('0');
    }
    let fraction: u64 = fraction_digits.parse().unwrap_or(0);

    Some(
        integer
            .checked_mul(OCTAS_PER_APT)
            .and_then(|whole| whole.checked_add(fraction))
            .ok_or(AmountError::TooLarge),
    )
}

/// Decode a raw record: hex text fields, octa price, rarity tier
pub fn normalize(raw: RawNft) -> Result<Nft, DecodeError> {
    let id = raw.id;
    let text = |field: &'static str, value: &str| {
        decode_hex_text(value).map_err(|failure| DecodeError { id, field, failure })
    };

    let name = text("name", &raw.name)?;
    let description = text("description", &raw.description)?;
    let uri = text("uri", &raw.uri)?;
    let rarity = Rarity::from_u64(raw.rarity).ok_or(DecodeError {
        id,
        field: "rarity",
        failure: DecodeFailure::Rarity(raw.rarity),
    })?;

    Ok(Nft {
        id,
        owner: raw.owner,
        creator: raw.creator,
        name,
        description,
        uri,
        price: to_display(raw.price),
        for_sale: raw.for_sale,
        rarity,
        likes: raw.likes,
    })
}

pub fn normalize_offer(nft_id: u64, raw: RawOffer) -> Offer {
    Offer {
        nft_id,
        offerer: raw.buyer,
        amount: to_display(raw.offer_price),
        amount_octas: raw.offer_price,
    }
}
