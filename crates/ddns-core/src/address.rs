//! Address families and address parsing
//!
//! The updater keeps one record slot per [`Family`]. A fetched address is
//! always classified by its family before it reaches a slot, so an IPv6
//! literal can never land in the `A` slot and vice versa.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;

/// IP address family (v4 or v6)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Family {
    V4,
    V6,
}

impl Family {
    /// Both families, in the order the poll loop reports them
    pub const ALL: [Family; 2] = [Family::V4, Family::V6];

    /// Classify an address
    pub fn of(ip: &IpAddr) -> Self {
        match ip {
            IpAddr::V4(_) => Family::V4,
            IpAddr::V6(_) => Family::V6,
        }
    }

    /// Whether `ip` belongs to this family
    pub fn matches(self, ip: &IpAddr) -> bool {
        Self::of(ip) == self
    }

    /// The address record type holding addresses of this family
    pub fn record_type(self) -> RecordType {
        match self {
            Family::V4 => RecordType::A,
            Family::V6 => RecordType::Aaaa,
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Family::V4 => f.write_str("IPv4"),
            Family::V6 => f.write_str("IPv6"),
        }
    }
}

/// DNS address record type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordType {
    /// A record (IPv4)
    #[serde(rename = "A")]
    A,
    /// AAAA record (IPv6)
    #[serde(rename = "AAAA")]
    Aaaa,
}

impl RecordType {
    /// The DNS mnemonic, as used by provider APIs
    pub fn as_str(self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::Aaaa => "AAAA",
        }
    }

    /// The family of addresses this record type holds
    pub fn family(self) -> Family {
        match self {
            RecordType::A => Family::V4,
            RecordType::Aaaa => Family::V6,
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse a bare textual IP literal and check it belongs to `family`.
///
/// Surrounding whitespace is ignored. Anything else that is not a valid
/// literal, or a literal of the other family, is a [`Error::Parse`].
///
/// # Example
///
/// ```rust
/// use ddns_core::address::{parse_address, Family};
///
/// let ip = parse_address("203.0.113.5\n", Family::V4).unwrap();
/// assert_eq!(ip.to_string(), "203.0.113.5");
/// assert!(parse_address("2001:db8::1", Family::V4).is_err());
/// ```
pub fn parse_address(text: &str, family: Family) -> Result<IpAddr> {
    let text = text.trim();
    let ip: IpAddr = text
        .parse()
        .map_err(|_| Error::parse(format!("invalid IP address format: {:?}", text)))?;

    if !family.matches(&ip) {
        return Err(Error::parse(format!("expected {} address, got {}", family, ip)));
    }

    Ok(ip)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn family_classification() {
        assert_eq!(Family::of(&"203.0.113.5".parse().unwrap()), Family::V4);
        assert_eq!(Family::of(&"2001:db8::1".parse().unwrap()), Family::V6);
        // IPv4-mapped addresses are IPv6 literals and stay in the v6 slot
        assert_eq!(Family::of(&"::ffff:203.0.113.5".parse().unwrap()), Family::V6);
    }

    #[test]
    fn record_type_per_family() {
        assert_eq!(Family::V4.record_type(), RecordType::A);
        assert_eq!(Family::V6.record_type(), RecordType::Aaaa);
        assert_eq!(RecordType::Aaaa.to_string(), "AAAA");
        assert_eq!(RecordType::A.family(), Family::V4);
    }

    #[test]
    fn canonical_literals_round_trip() {
        let v4 = ["203.0.113.5", "0.0.0.0", "255.255.255.255", "10.0.0.1"];
        for literal in v4 {
            let ip = parse_address(literal, Family::V4).unwrap();
            assert_eq!(ip.to_string(), literal);
        }

        let v6 = ["2001:db8::1", "::1", "::", "fe80::1:2:3:4"];
        for literal in v6 {
            let ip = parse_address(literal, Family::V6).unwrap();
            assert_eq!(ip.to_string(), literal);
        }
    }

    #[test]
    fn non_canonical_v6_is_normalised() {
        let ip = parse_address("2001:0DB8:0000:0000:0000:0000:0000:0001", Family::V6).unwrap();
        assert_eq!(ip.to_string(), "2001:db8::1");
    }

    #[test]
    fn trailing_newline_is_accepted() {
        let ip = parse_address(" 198.51.100.7\r\n", Family::V4).unwrap();
        assert_eq!(ip.to_string(), "198.51.100.7");
    }

    #[test]
    fn invalid_literals_are_parse_errors() {
        let bad = [
            "",
            "not an ip",
            "256.1.1.1",
            "1.2.3",
            "1.2.3.4.5",
            "2001:db8:::1",
            "<html>203.0.113.5</html>",
            "203.0.113.5:80",
        ];
        for literal in bad {
            let err = parse_address(literal, Family::V4).unwrap_err();
            assert!(matches!(err, Error::Parse(_)), "{:?} gave {:?}", literal, err);
        }
    }

    #[test]
    fn wrong_family_is_parse_error() {
        let err = parse_address("203.0.113.5", Family::V6).unwrap_err();
        assert!(matches!(err, Error::Parse(_)));

        let err = parse_address("2001:db8::1", Family::V4).unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }
}
