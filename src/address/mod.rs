//! Address canonicalization
//!
//! A wallet address arrives either as the canonical raw form
//! (`"0:5324a7b9..."`) or as a friendly base64 string (`"UQATKnig..."`).
//! Everything past the request boundary works on [`RawAddress`] only.
//!
//! The friendly checksum is not enforced. A mismatch is logged at debug
//! level and decoding proceeds.

mod friendly;
mod raw;

pub use friendly::FriendlyAddress;
pub use raw::{AddressError, HASH_LEN, RawAddress};

use tracing::debug;

/// Canonicalize any accepted address representation.
///
/// Canonical input is re-rendered (lowercase hex, no leading zeros in the
/// workchain), so the result is stable: `normalize(normalize(x)) ==
/// normalize(x)`.
pub fn normalize(input: &str) -> Result<RawAddress, AddressError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(AddressError::Empty);
    }

    if RawAddress::looks_canonical(input) {
        return input.parse();
    }

    let friendly = FriendlyAddress::decode(input)?;
    if !friendly.checksum_matches() {
        debug!(address = %friendly.raw, "Friendly address checksum mismatch, accepting anyway");
    }
    Ok(friendly.raw)
}

/// [`normalize`] rendered back to the canonical string
pub fn normalize_str(input: &str) -> Result<String, AddressError> {
    normalize(input).map(|raw| raw.to_string())
}
