//! Domain layer - marketplace records and the listing pipeline
//!
//! Pure data and logic, no I/O.

pub mod address;
pub mod decode;
pub mod freshness;
pub mod listing;
pub mod nft;

pub use address::{is_valid_address, normalize_address, truncate_address};
pub use decode::{
    decode_hex_text, normalize, normalize_offer, parse_amount, to_display, to_minor, AmountError,
    DecodeError, DecodeFailure, OCTAS_PER_APT,
};
pub use freshness::FetchSequencer;
pub use listing::{paginate, page_count, CategoryFilter, ListingQuery, SortKey, PAGE_SIZE};
pub use nft::{Nft, Offer, OfferKey, Rarity, RawNft, RawOffer};
