//! Canonical (raw) address form: `"{workchain}:{64 hex digits}"`

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Length of the account hash in bytes
pub const HASH_LEN: usize = 32;

/// Errors raised while turning user input into a [`RawAddress`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("address is empty")]
    Empty,

    #[error("address is not valid base64")]
    InvalidBase64,

    #[error("decoded address is too short: {len} bytes (need at least 34)")]
    TooShort { len: usize },

    #[error("workchain id does not fit a signed byte")]
    WorkchainOutOfRange,

    #[error("address hash must be 64 hex digits")]
    InvalidHash,
}

/// Workchain id plus 32-byte account hash.
///
/// This is the only form that is stored or compared. Two inputs that decode
/// to the same pair are the same account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RawAddress {
    pub workchain: i8,
    pub hash: [u8; HASH_LEN],
}

impl RawAddress {
    pub fn new(workchain: i8, hash: [u8; HASH_LEN]) -> Self {
        Self { workchain, hash }
    }

    /// Lowercase hex rendering of the hash part
    pub fn hash_hex(&self) -> String {
        hex::encode(self.hash)
    }

    /// Cheap shape check: optional `-`, digits, `:`, exactly 64 hex digits.
    /// Does not check that the workchain fits a signed byte.
    pub fn looks_canonical(input: &str) -> bool {
        let Some((workchain, hash)) = input.split_once(':') else {
            return false;
        };
        let digits = workchain.strip_prefix('-').unwrap_or(workchain);
        !digits.is_empty()
            && digits.bytes().all(|b| b.is_ascii_digit())
            && hash.len() == HASH_LEN * 2
            && hash.bytes().all(|b| b.is_ascii_hexdigit())
    }
}

impl fmt::Display for RawAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.workchain, self.hash_hex())
    }
}

impl FromStr for RawAddress {
    type Err = AddressError;

    /// Parses the canonical form only. Use [`super::normalize`] for input
    /// that may be friendly-encoded.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(AddressError::Empty);
        }
        if !Self::looks_canonical(s) {
            return Err(AddressError::InvalidHash);
        }

        let (workchain, hash_hex) = s.split_once(':').ok_or(AddressError::InvalidHash)?;
        let workchain: i8 = workchain
            .parse()
            .map_err(|_| AddressError::WorkchainOutOfRange)?;

        let mut hash = [0u8; HASH_LEN];
        hex::decode_to_slice(hash_hex, &mut hash).map_err(|_| AddressError::InvalidHash)?;

        Ok(Self { workchain, hash })
    }
}

impl Serialize for RawAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RawAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
