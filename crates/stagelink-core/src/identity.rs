//! Hardware identity parsing
//!
//! Boards identify themselves by MAC address. The canonical form is six
//! uppercase hex octets joined by colons:
//! ```text
//! A1:B2:C3:D4:E5:F6
//! ```
//! Hyphen separators and lowercase hex are accepted on input and normalized.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{Error, Result};

/// A parsed hardware address, the stable key for one board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MacAddr([u8; 6]);

impl MacAddr {
    /// Parse an address string
    pub fn parse(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Err(Error::InvalidIdentity("empty address".to_string()));
        }

        let sep = if s.contains(':') {
            ':'
        } else if s.contains('-') {
            '-'
        } else {
            return Err(Error::InvalidIdentity(format!(
                "missing ':' or '-' separators: {}",
                s
            )));
        };

        let mut octets = [0u8; 6];
        let mut count = 0;

        for part in s.split(sep) {
            if count == 6 {
                return Err(Error::InvalidIdentity(format!("too many octets: {}", s)));
            }
            if part.len() != 2 || !part.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(Error::InvalidIdentity(format!(
                    "bad octet '{}' in {}",
                    part, s
                )));
            }
            octets[count] = u8::from_str_radix(part, 16)
                .map_err(|_| Error::InvalidIdentity(format!("bad octet '{}' in {}", part, s)))?;
            count += 1;
        }

        if count != 6 {
            return Err(Error::InvalidIdentity(format!(
                "expected 6 octets, got {}: {}",
                count, s
            )));
        }

        Ok(Self(octets))
    }

    /// Get the raw octets
    pub fn octets(&self) -> [u8; 6] {
        self.0
    }
}

impl std::fmt::Display for MacAddr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let o = &self.0;
        write!(
            f,
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            o[0], o[1], o[2], o[3], o[4], o[5]
        )
    }
}

impl TryFrom<&str> for MacAddr {
    type Error = Error;

    fn try_from(s: &str) -> Result<Self> {
        MacAddr::parse(s)
    }
}

impl TryFrom<String> for MacAddr {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        MacAddr::parse(&s)
    }
}

impl std::str::FromStr for MacAddr {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        MacAddr::parse(s)
    }
}

impl Serialize for MacAddr {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MacAddr {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        MacAddr::parse(&s).map_err(serde::de::Error::custom)
    }
}
