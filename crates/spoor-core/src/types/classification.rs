//! Identifier categories understood by the downstream intelligence platform.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

/// Identifier category of an ingested record ("orphan type").
///
/// Every detection type maps onto exactly one of these. Custom patterns
/// default to [`IdentifierType::Other`].
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum IdentifierType {
    Email,
    Phone,
    CryptoAddress,
    IpAddress,
    Domain,
    Url,
    Username,
    SocialMedia,
    MacAddress,
    Imei,
    CreditCard,
    #[default]
    Other,
}

impl IdentifierType {
    /// All identifier type names.
    pub fn all_names() -> Vec<&'static str> {
        Self::iter().map(|t| t.into()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_snake_case_names() {
        assert_eq!(IdentifierType::CryptoAddress.to_string(), "crypto_address");
        assert_eq!(
            IdentifierType::from_str("social_media").unwrap(),
            IdentifierType::SocialMedia
        );
        assert!(IdentifierType::from_str("passport").is_err());
    }

    #[test]
    fn test_serde_matches_strum() {
        let json = serde_json::to_string(&IdentifierType::IpAddress).unwrap();
        assert_eq!(json, "\"ip_address\"");
        assert_eq!(IdentifierType::default(), IdentifierType::Other);
    }
}
