//! Validator library.
//!
//! Each validator is a pure predicate deciding whether a candidate string
//! plausibly belongs to a type. Validators never reject a detection on their
//! own; the engine turns the verdict into a confidence score.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

const BASE58_ALPHABET: &str = "123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

/// Named validators available to detection types.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Validator {
    Email,
    Phone,
    Bitcoin,
    Ethereum,
    Litecoin,
    Dogecoin,
    Monero,
    Ipv4,
    Ipv6,
    Domain,
    Url,
    Imei,
    Luhn,
    MacAddress,
    CreditCard,
}

impl Validator {
    /// Run this validator against a candidate value.
    pub fn check(&self, value: &str) -> bool {
        match self {
            Validator::Email => is_email(value),
            Validator::Phone => is_phone(value),
            Validator::Bitcoin => is_bitcoin(value),
            Validator::Ethereum => is_ethereum(value),
            Validator::Litecoin => is_litecoin(value),
            Validator::Dogecoin => is_dogecoin(value),
            Validator::Monero => is_monero(value),
            Validator::Ipv4 => is_ipv4(value),
            Validator::Ipv6 => is_ipv6(value),
            Validator::Domain => is_domain(value),
            Validator::Url => is_url(value),
            Validator::Imei => is_imei(value),
            Validator::Luhn => luhn(value),
            Validator::MacAddress => is_mac_address(value),
            Validator::CreditCard => is_credit_card(value),
        }
    }

    /// All validator names.
    pub fn all_names() -> Vec<&'static str> {
        Self::iter().map(|v| v.into()).collect()
    }
}

/// Exactly one `@` with non-empty local and domain parts.
pub fn is_email(value: &str) -> bool {
    match value.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty() && !domain.contains('@'),
        None => false,
    }
}

/// Between 7 and 15 digits, ignoring formatting characters.
pub fn is_phone(value: &str) -> bool {
    let digits = value.chars().filter(char::is_ascii_digit).count();
    (7..=15).contains(&digits)
}

/// Bech32 (`bc1`, 42-62 chars) or legacy base58 (`1`/`3`, 26-34 chars).
pub fn is_bitcoin(value: &str) -> bool {
    if value.to_ascii_lowercase().starts_with("bc1") {
        return (42..=62).contains(&value.len());
    }
    (value.starts_with('1') || value.starts_with('3'))
        && (26..=34).contains(&value.len())
        && is_base58(value)
}

/// `0x` followed by 40 hex digits.
pub fn is_ethereum(value: &str) -> bool {
    value.len() == 42
        && (value.starts_with("0x") || value.starts_with("0X"))
        && value[2..].chars().all(|c| c.is_ascii_hexdigit())
}

/// Legacy (`L`/`M`/`3`, 26-34 chars) or bech32 (`ltc1`, 39-63 chars).
pub fn is_litecoin(value: &str) -> bool {
    if value.to_ascii_lowercase().starts_with("ltc1") {
        return (39..=63).contains(&value.len());
    }
    matches!(value.chars().next(), Some('L' | 'M' | '3'))
        && (26..=34).contains(&value.len())
        && is_base58(value)
}

/// `D` prefix, 34 base58 characters.
pub fn is_dogecoin(value: &str) -> bool {
    value.starts_with('D') && value.len() == 34 && is_base58(value)
}

/// `4` (standard) or `8` (subaddress) prefix, 95 or 106 (integrated) characters.
pub fn is_monero(value: &str) -> bool {
    (value.starts_with('4') || value.starts_with('8'))
        && (value.len() == 95 || value.len() == 106)
        && is_base58(value)
}

/// Four dot-separated integers, each 0-255.
pub fn is_ipv4(value: &str) -> bool {
    let parts: Vec<&str> = value.split('.').collect();
    parts.len() == 4
        && parts.iter().all(|p| {
            !p.is_empty() && p.len() <= 3 && p.chars().all(|c| c.is_ascii_digit()) && p.parse::<u16>().is_ok_and(|n| n <= 255)
        })
}

/// Lenient IPv6 check: 2-8 non-empty hex groups of at most four digits.
pub fn is_ipv6(value: &str) -> bool {
    if !value.contains(':') {
        return false;
    }
    let groups: Vec<&str> = value.split(':').filter(|g| !g.is_empty()).collect();
    (2..=8).contains(&groups.len())
        && groups
            .iter()
            .all(|g| g.len() <= 4 && g.chars().all(|c| c.is_ascii_hexdigit()))
}

/// At least two non-empty labels, alphabetic top-level label of two or more letters.
pub fn is_domain(value: &str) -> bool {
    let labels: Vec<&str> = value.split('.').collect();
    if labels.len() < 2 || labels.iter().any(|l| l.is_empty()) {
        return false;
    }
    labels
        .last()
        .is_some_and(|tld| tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic()))
}

/// Parses as an absolute URI.
pub fn is_url(value: &str) -> bool {
    url::Url::parse(value).is_ok()
}

/// Exactly 15 digits passing the Luhn checksum.
pub fn is_imei(value: &str) -> bool {
    value.len() == 15 && value.chars().all(|c| c.is_ascii_digit()) && luhn(value)
}

/// Luhn checksum over a digit string.
///
/// Digits are walked right to left and every second one (starting with the
/// second from the right) is doubled, subtracting 9 when the result exceeds 9.
/// Valid iff the sum is divisible by 10. Non-digit input is invalid.
pub fn luhn(value: &str) -> bool {
    if value.is_empty() || !value.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }
    let sum: u32 = value
        .bytes()
        .rev()
        .enumerate()
        .map(|(i, b)| {
            let digit = u32::from(b - b'0');
            if i % 2 == 1 {
                let doubled = digit * 2;
                if doubled > 9 {
                    doubled - 9
                } else {
                    doubled
                }
            } else {
                digit
            }
        })
        .sum();
    sum % 10 == 0
}

/// Six hex pairs joined by a single consistent `:` or `-` separator.
pub fn is_mac_address(value: &str) -> bool {
    let separator = if value.contains(':') { ':' } else { '-' };
    let parts: Vec<&str> = value.split(separator).collect();
    parts.len() == 6
        && parts
            .iter()
            .all(|p| p.len() == 2 && p.chars().all(|c| c.is_ascii_hexdigit()))
}

/// 13-19 digits after stripping spaces and dashes, passing Luhn.
pub fn is_credit_card(value: &str) -> bool {
    let digits: String = value.chars().filter(|c| *c != ' ' && *c != '-').collect();
    (13..=19).contains(&digits.len()) && luhn(&digits)
}

fn is_base58(value: &str) -> bool {
    value.chars().all(|c| BASE58_ALPHABET.contains(c))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_luhn_reference_values() {
        assert!(luhn("4111111111111111"));
        assert!(!luhn("4111111111111112"));
        assert!(luhn("378282246310005"));
        assert!(!luhn(""));
        assert!(!luhn("4111-1111"));
    }

    #[test]
    fn test_imei() {
        assert!(is_imei("490154203237518"));
        assert!(!is_imei("490154203237519"));
        assert!(!is_imei("4901542032375"));
    }

    #[test]
    fn test_email() {
        assert!(is_email("jane@example.com"));
        assert!(!is_email("jane.example.com"));
        assert!(!is_email("@example.com"));
        assert!(!is_email("jane@"));
        assert!(!is_email("a@b@c"));
    }

    #[test]
    fn test_phone_digit_bounds() {
        assert!(is_phone("(415) 555-2671"));
        assert!(is_phone("555-2671"));
        assert!(!is_phone("555-267"));
        assert!(!is_phone("+1234567890123456"));
    }

    #[test]
    fn test_bitcoin() {
        assert!(is_bitcoin("1BvBMSEYstWetqTFn5Au4m4GFg7xJaNVN2"));
        assert!(is_bitcoin("3J98t1WpEZ73CNmQviecrnyiWrnqRhWNLy"));
        assert!(is_bitcoin("bc1qar0srrr7xfkvy5l643lydnw9re59gtzzwf5mdq"));
        assert!(!is_bitcoin("2BvBMSEYstWetqTFn5Au4m4GFg7xJaNVN2"));
        assert!(!is_bitcoin("1short"));
        assert!(!is_bitcoin("1BvBMSEYstWetqTFn5Au4m4GFg7xJaNVN0"));
    }

    #[test]
    fn test_ethereum() {
        assert!(is_ethereum("0x742d35Cc6634C0532925a3b844Bc454e4438f44e"));
        assert!(!is_ethereum("0x742d35Cc6634C0532925a3b844Bc454e4438f44"));
        assert!(!is_ethereum("0x742d35Cc6634C0532925a3b844Bc454e4438f44g"));
    }

    #[test]
    fn test_ipv4() {
        assert!(is_ipv4("192.168.1.1"));
        assert!(is_ipv4("0.0.0.0"));
        assert!(!is_ipv4("256.1.1.1"));
        assert!(!is_ipv4("1.2.3"));
        assert!(!is_ipv4("1.2.3.4.5"));
        assert!(!is_ipv4("1..3.4"));
    }

    #[test]
    fn test_ipv6_is_lenient() {
        assert!(is_ipv6("2001:0db8:85a3:0000:0000:8a2e:0370:7334"));
        assert!(is_ipv6("2001:db8::1"));
        assert!(is_ipv6("fe80::1ff:fe23:4567:890a"));
        assert!(!is_ipv6("::1"));
        assert!(!is_ipv6("2001:db8::zzzz"));
        assert!(!is_ipv6("plain"));
    }

    #[test]
    fn test_domain() {
        assert!(is_domain("example.com"));
        assert!(is_domain("sub.example.co.uk"));
        assert!(!is_domain("localhost"));
        assert!(!is_domain("example.c0m"));
        assert!(!is_domain("example.c"));
        assert!(!is_domain("example..com"));
    }

    #[test]
    fn test_url() {
        assert!(is_url("https://example.com/path?q=1"));
        assert!(!is_url("example.com/path"));
    }

    #[test]
    fn test_mac_address() {
        assert!(is_mac_address("00:1A:2B:3C:4D:5E"));
        assert!(is_mac_address("00-1a-2b-3c-4d-5e"));
        assert!(!is_mac_address("00:1A-2B:3C:4D:5E"));
        assert!(!is_mac_address("00:1A:2B:3C:4D"));
    }

    #[test]
    fn test_credit_card_strips_separators() {
        assert!(is_credit_card("4111 1111 1111 1111"));
        assert!(is_credit_card("5500-0055-5555-5559"));
        assert!(!is_credit_card("4111 1111 1111 1112"));
    }

    #[test]
    fn test_validator_names_round_trip() {
        assert_eq!(Validator::from_str("mac_address").unwrap(), Validator::MacAddress);
        assert_eq!(Validator::CreditCard.to_string(), "credit_card");
        assert!(Validator::from_str("checksum").is_err());
        assert_eq!(Validator::all_names().len(), 15);
    }

    #[test]
    fn test_check_dispatches() {
        assert!(Validator::Luhn.check("4111111111111111"));
        assert!(!Validator::Imei.check("4111111111111111"));
    }
}
