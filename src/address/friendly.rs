//! User-friendly address encoding
//!
//! Layout (36 bytes, URL-safe base64 on the wire):
//!
//! ```text
//! [0]      flag      0x11 bounceable / 0x51 non-bounceable, | 0x80 testnet
//! [1]      workchain signed byte
//! [2..34]  hash
//! [34..36] CRC16/XMODEM over [0..34], big-endian
//! ```

use base64::Engine as _;
use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, URL_SAFE};
use base64::engine::DecodePaddingMode;
use crc::{CRC_16_XMODEM, Crc};

use super::raw::{AddressError, HASH_LEN, RawAddress};

/// Bytes covered by the checksum
pub const BODY_LEN: usize = 2 + HASH_LEN;
/// Full decoded length including the checksum
pub const FRIENDLY_LEN: usize = BODY_LEN + 2;

const FLAG_BOUNCEABLE: u8 = 0x11;
const FLAG_NON_BOUNCEABLE: u8 = 0x51;
const FLAG_TESTNET: u8 = 0x80;

/// Poly 0x1021, init 0, no reflection
const CHECKSUM: Crc<u16> = Crc::<u16>::new(&CRC_16_XMODEM);

/// Standard alphabet, padding optional. Input is mapped from URL-safe first.
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// A decoded friendly address. Only the raw part is ever stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FriendlyAddress {
    pub flag: u8,
    pub raw: RawAddress,
    /// Checksum as carried by the input, when present
    pub checksum: Option<u16>,
}

impl FriendlyAddress {
    /// Decode a friendly string. Requires at least 34 bytes after base64.
    /// The checksum is read but not enforced.
    pub fn decode(input: &str) -> Result<Self, AddressError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(AddressError::Empty);
        }

        let standard: String = input
            .chars()
            .map(|c| match c {
                '-' => '+',
                '_' => '/',
                other => other,
            })
            .collect();

        let bytes = LENIENT
            .decode(standard.as_bytes())
            .map_err(|_| AddressError::InvalidBase64)?;

        if bytes.len() < BODY_LEN {
            return Err(AddressError::TooShort { len: bytes.len() });
        }

        let mut hash = [0u8; HASH_LEN];
        hash.copy_from_slice(&bytes[2..BODY_LEN]);

        let checksum = (bytes.len() >= FRIENDLY_LEN)
            .then(|| u16::from_be_bytes([bytes[BODY_LEN], bytes[BODY_LEN + 1]]));

        Ok(Self {
            flag: bytes[0],
            raw: RawAddress::new(bytes[1] as i8, hash),
            checksum,
        })
    }

    pub fn is_bounceable(&self) -> bool {
        self.flag & !FLAG_TESTNET == FLAG_BOUNCEABLE
    }

    pub fn is_testnet(&self) -> bool {
        self.flag & FLAG_TESTNET != 0
    }

    /// Whether the carried checksum matches the body. `false` when absent.
    pub fn checksum_matches(&self) -> bool {
        self.checksum == Some(crc16(&body_bytes(self.flag, &self.raw)))
    }
}

impl RawAddress {
    /// Render as a URL-safe friendly string with a correct checksum
    pub fn to_friendly(&self, bounceable: bool, testnet: bool) -> String {
        let mut flag = if bounceable {
            FLAG_BOUNCEABLE
        } else {
            FLAG_NON_BOUNCEABLE
        };
        if testnet {
            flag |= FLAG_TESTNET;
        }

        let body = body_bytes(flag, self);
        let mut bytes = Vec::with_capacity(FRIENDLY_LEN);
        bytes.extend_from_slice(&body);
        bytes.extend_from_slice(&crc16(&body).to_be_bytes());

        URL_SAFE.encode(bytes)
    }
}

fn body_bytes(flag: u8, raw: &RawAddress) -> [u8; BODY_LEN] {
    let mut body = [0u8; BODY_LEN];
    body[0] = flag;
    body[1] = raw.workchain as u8;
    body[2..].copy_from_slice(&raw.hash);
    body
}

fn crc16(data: &[u8]) -> u16 {
    CHECKSUM.checksum(data)
}
