//! Request parameters shared by every transport

use serde::Serialize;
use std::fmt;

/// Smallest page a caller can ask for
pub const MIN_LIMIT: usize = 1;
/// Largest page a caller can ask for
pub const MAX_LIMIT: usize = 50;
/// Page size when `limit` is absent
pub const DEFAULT_LIMIT: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Endpoint {
    Health,
    Reputation,
    Reviews,
    Top,
    Stats,
}

impl Endpoint {
    pub const ALL: [Endpoint; 5] = [
        Endpoint::Health,
        Endpoint::Reputation,
        Endpoint::Reviews,
        Endpoint::Top,
        Endpoint::Stats,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Endpoint::Health => "health",
            Endpoint::Reputation => "reputation",
            Endpoint::Reviews => "reviews",
            Endpoint::Top => "top",
            Endpoint::Stats => "stats",
        }
    }

    /// `None` / empty selects health. Unknown names return `Err` with the
    /// name that was asked for.
    pub fn select(name: Option<&str>) -> Result<Self, String> {
        let name = name.map(str::trim).unwrap_or_default();
        if name.is_empty() {
            return Ok(Endpoint::Health);
        }
        Self::ALL
            .into_iter()
            .find(|endpoint| endpoint.as_str() == name)
            .ok_or_else(|| name.to_string())
    }

    pub fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(Endpoint::as_str).collect()
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn clamp_limit(limit: i64) -> usize {
    limit.clamp(MIN_LIMIT as i64, MAX_LIMIT as i64) as usize
}

/// Lenient integer cast: optional sign then leading digits; anything else
/// counts as 0. Absent means [`DEFAULT_LIMIT`]. The result is clamped.
pub fn parse_limit(raw: Option<&str>) -> usize {
    let Some(raw) = raw else {
        return DEFAULT_LIMIT;
    };

    let raw = raw.trim();
    let (negative, digits) = match raw.as_bytes().first() {
        Some(b'-') => (true, &raw[1..]),
        Some(b'+') => (false, &raw[1..]),
        _ => (false, raw),
    };

    let leading: String = digits.chars().take_while(char::is_ascii_digit).collect();
    // Saturate on overflow, the clamp brings it back into range
    let value = leading.parse::<i64>().unwrap_or(if leading.is_empty() {
        0
    } else {
        i64::MAX
    });

    clamp_limit(if negative { -value } else { value })
}
