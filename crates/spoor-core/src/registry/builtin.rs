//! Built-in detection table.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::registry::hooks::{
    DigitsNormalizer, IntlPhoneNormalizer, LowercaseNormalizer, MacAddressNormalizer,
    PatternExclusion, PhoneNormalizer, ProfileHandleExtractor, TrailingPunctuationExtractor,
};
use crate::registry::spec::{DetectionTypeSpec, PatternMatcher};
use crate::types::IdentifierType;
use crate::validators::Validator;

static BUILTIN_TYPES: Lazy<Vec<DetectionTypeSpec>> = Lazy::new(build_table);

/// Fresh copies of every built-in detection type.
pub fn builtin_types() -> Vec<DetectionTypeSpec> {
    BUILTIN_TYPES.clone()
}

fn re(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap()
}

fn rule(pattern: &str) -> PatternMatcher {
    PatternMatcher::from_regex(re(pattern))
}

fn is_word(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

struct Platform {
    key: &'static str,
    name: &'static str,
    platform: &'static str,
    pattern: &'static str,
    prefix: &'static str,
    reserved: &'static str,
}

const SOCIAL_PLATFORMS: &[Platform] = &[
    Platform {
        key: "social_twitter",
        name: "Twitter/X Profile",
        platform: "twitter",
        pattern: r"(?i)\b(?:https?://)?(?:www\.|mobile\.)?(?:twitter|x)\.com/@?([a-z0-9_]{1,15})\b",
        prefix: "@",
        reserved: r"(?i)\.com/@?(?:home|intent|share|search|hashtag|i|login|signup|explore|settings|notifications|messages|tos|privacy)$",
    },
    Platform {
        key: "social_instagram",
        name: "Instagram Profile",
        platform: "instagram",
        pattern: r"(?i)\b(?:https?://)?(?:www\.)?instagram\.com/([a-z0-9_.]{1,30})",
        prefix: "@",
        reserved: r"(?i)\.com/(?:p|explore|accounts|reel|reels|stories|about|developer)\.?$",
    },
    Platform {
        key: "social_facebook",
        name: "Facebook Profile",
        platform: "facebook",
        pattern: r"(?i)\b(?:https?://)?(?:www\.|m\.)?(?:facebook|fb)\.com/([a-z0-9.]{5,50})",
        prefix: "",
        reserved: r"(?i)\.com/(?:sharer|share|login|pages|groups|events|watch|marketplace|help|policies|profile\.php)\b",
    },
    Platform {
        key: "social_linkedin",
        name: "LinkedIn Profile",
        platform: "linkedin",
        pattern: r"(?i)\b(?:https?://)?(?:[a-z]{2,3}\.)?linkedin\.com/(?:in|company)/([a-z0-9_-]{3,100})",
        prefix: "",
        reserved: r"(?i)/(?:in|company)/(?:login|signup)$",
    },
    Platform {
        key: "social_github",
        name: "GitHub Profile",
        platform: "github",
        pattern: r"(?i)\b(?:https?://)?(?:www\.)?github\.com/([a-z0-9][a-z0-9-]{0,38})\b",
        prefix: "@",
        reserved: r"(?i)\.com/(?:about|features|pricing|login|join|orgs|topics|marketplace|sponsors|settings|explore|notifications|enterprise|security)$",
    },
    Platform {
        key: "social_reddit",
        name: "Reddit Profile",
        platform: "reddit",
        pattern: r"(?i)\b(?:https?://)?(?:www\.|old\.)?reddit\.com/(?:u|user)/([a-z0-9_-]{3,20})",
        prefix: "u/",
        reserved: r"(?i)/(?:u|user)/(?:me|login)$",
    },
    Platform {
        key: "social_youtube",
        name: "YouTube Channel",
        platform: "youtube",
        pattern: r"(?i)\b(?:https?://)?(?:www\.)?youtube\.com/(?:@|c/|user/|channel/)([a-z0-9_.-]{3,100})",
        prefix: "@",
        reserved: r"(?i)/(?:@|c/|user/|channel/)(?:watch|results|feed)$",
    },
    Platform {
        key: "social_tiktok",
        name: "TikTok Profile",
        platform: "tiktok",
        pattern: r"(?i)\b(?:https?://)?(?:www\.)?tiktok\.com/@([a-z0-9_.]{2,24})",
        prefix: "@",
        reserved: r"(?i)/@(?:tiktok)$",
    },
    Platform {
        key: "social_telegram",
        name: "Telegram Profile",
        platform: "telegram",
        pattern: r"(?i)\b(?:https?://)?(?:t|telegram)\.me/([a-z0-9_]{5,32})\b",
        prefix: "@",
        reserved: r"(?i)\.me/(?:joinchat|addstickers|share|proxy|socks)$",
    },
];

struct Coin {
    key: &'static str,
    name: &'static str,
    currency: &'static str,
    network: &'static str,
    validator: Validator,
    pattern: &'static str,
}

const COINS: &[Coin] = &[
    Coin {
        key: "crypto_btc",
        name: "Bitcoin Address",
        currency: "BTC",
        network: "bitcoin",
        validator: Validator::Bitcoin,
        pattern: r"\b(?:bc1[a-z0-9]{39,59}|[13][a-km-zA-HJ-NP-Z1-9]{25,33})\b",
    },
    Coin {
        key: "crypto_eth",
        name: "Ethereum Address",
        currency: "ETH",
        network: "ethereum",
        validator: Validator::Ethereum,
        pattern: r"\b0x[a-fA-F0-9]{40}\b",
    },
    Coin {
        key: "crypto_ltc",
        name: "Litecoin Address",
        currency: "LTC",
        network: "litecoin",
        validator: Validator::Litecoin,
        pattern: r"\b(?:ltc1[a-z0-9]{35,59}|[LM][a-km-zA-HJ-NP-Z1-9]{25,33})\b",
    },
    Coin {
        key: "crypto_doge",
        name: "Dogecoin Address",
        currency: "DOGE",
        network: "dogecoin",
        validator: Validator::Dogecoin,
        pattern: r"\bD[5-9A-HJ-NP-U][1-9A-HJ-NP-Za-km-z]{32}\b",
    },
    Coin {
        key: "crypto_xmr",
        name: "Monero Address",
        currency: "XMR",
        network: "monero",
        validator: Validator::Monero,
        pattern: r"\b[48][1-9AB](?:[1-9A-HJ-NP-Za-km-z]{104}|[1-9A-HJ-NP-Za-km-z]{93})\b",
    },
];

fn build_table() -> Vec<DetectionTypeSpec> {
    let mut table = vec![
        DetectionTypeSpec::new("email", "Email Address", IdentifierType::Email)
            .with_matcher(rule(r"(?i)\b[a-z0-9._%+-]+@[a-z0-9.-]+\.[a-z]{2,}\b"))
            .with_validator(Validator::Email)
            .with_priority(1)
            .with_normalizer(LowercaseNormalizer),
        DetectionTypeSpec::new("phone_us", "US Phone Number", IdentifierType::Phone)
            .with_matcher(
                rule(r"(?:\+?1[\s.-]?)?\(?\b[2-9][0-9]{2}\)?[\s.-]?[0-9]{3}[\s.-]?[0-9]{4}\b")
                    .not_preceded_by(|c| is_word(c) || c == '+'),
            )
            .with_validator(Validator::Phone)
            .with_priority(2)
            .with_metadata("country", "US")
            .with_normalizer(PhoneNormalizer),
        DetectionTypeSpec::new("phone_intl", "International Phone Number", IdentifierType::Phone)
            .with_matcher(
                rule(r"\+[2-9][0-9]{0,2}[\s.-]?\(?[0-9]{1,4}\)?(?:[\s.-]?[0-9]{2,4}){2,4}\b")
                    .not_preceded_by(is_word),
            )
            .with_validator(Validator::Phone)
            .with_priority(2)
            .with_normalizer(IntlPhoneNormalizer),
    ];

    for coin in COINS {
        table.push(
            DetectionTypeSpec::new(coin.key, coin.name, IdentifierType::CryptoAddress)
                .with_matcher(rule(coin.pattern))
                .with_validator(coin.validator)
                .with_priority(3)
                .with_metadata("currency", coin.currency)
                .with_metadata("network", coin.network),
        );
    }

    for social in SOCIAL_PLATFORMS {
        table.push(
            DetectionTypeSpec::new(social.key, social.name, IdentifierType::SocialMedia)
                .with_matcher(rule(social.pattern))
                .with_priority(4)
                .with_metadata("platform", social.platform)
                .with_extractor(ProfileHandleExtractor::new(re(social.pattern), social.prefix))
                .with_exclusion(PatternExclusion::from_regexes(vec![re(social.reserved)])),
        );
    }

    table.extend([
        DetectionTypeSpec::new("social_handle", "Social Media Handle", IdentifierType::Username)
            .with_matcher(
                rule(r"@[A-Za-z0-9_]{2,30}\b")
                    .not_preceded_by(|c| is_word(c) || matches!(c, '@' | '/' | '.')),
            )
            .with_priority(5),
        DetectionTypeSpec::new("ip_v4", "IPv4 Address", IdentifierType::IpAddress)
            .with_matcher(rule(r"\b(?:[0-9]{1,3}\.){3}[0-9]{1,3}\b"))
            .with_validator(Validator::Ipv4)
            .with_priority(5)
            .with_metadata("semantic_type", "network"),
        DetectionTypeSpec::new("ip_v6", "IPv6 Address", IdentifierType::IpAddress)
            .with_matcher(rule(r"(?i)\b(?:[0-9a-f]{1,4}:){7}[0-9a-f]{1,4}\b"))
            .with_matcher(rule(r"(?i)\b(?:[0-9a-f]{1,4}:){1,6}(?::[0-9a-f]{1,4}){1,6}\b"))
            .with_validator(Validator::Ipv6)
            .with_priority(5)
            .with_metadata("semantic_type", "network"),
        DetectionTypeSpec::new("mac_address", "MAC Address", IdentifierType::MacAddress)
            .with_matcher(rule(r"(?i)\b[0-9a-f]{2}(?::[0-9a-f]{2}){5}\b"))
            .with_matcher(rule(r"(?i)\b[0-9a-f]{2}(?:-[0-9a-f]{2}){5}\b"))
            .with_validator(Validator::MacAddress)
            .with_priority(6)
            .with_metadata("semantic_type", "hardware")
            .with_normalizer(MacAddressNormalizer),
        DetectionTypeSpec::new("imei", "IMEI Number", IdentifierType::Imei)
            .with_matcher(rule(r"\b[0-9]{15}\b"))
            .with_validator(Validator::Imei)
            .with_priority(7)
            .with_metadata("semantic_type", "device"),
        DetectionTypeSpec::new("credit_card", "Credit Card Number", IdentifierType::CreditCard)
            .with_matcher(rule(r"\b(?:[0-9][ -]?){12,18}[0-9]\b"))
            .with_validator(Validator::CreditCard)
            .with_priority(7)
            .with_sensitive(true)
            .with_metadata("semantic_type", "financial")
            .with_normalizer(DigitsNormalizer),
        DetectionTypeSpec::new("domain", "Domain Name", IdentifierType::Domain)
            .with_matcher(
                rule(r"(?i)\b(?:[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?\.)+[a-z]{2,24}\b")
                    .not_preceded_by(|c| c == '@')
                    .not_followed_by(|c| c == '@'),
            )
            .with_validator(Validator::Domain)
            .with_priority(8)
            .with_normalizer(LowercaseNormalizer)
            .with_exclusion(PatternExclusion::from_regexes(vec![re(
                r"(?i)\.(?:png|jpe?g|gif|svg|webp|ico|bmp|css|js|mjs|json|xml|pdf|zip|gz|tar|txt|csv|html?|php|aspx?|jsp|mp[34]|wav|woff2?|ttf|exe|dmg)$",
            )])),
        DetectionTypeSpec::new("url", "URL", IdentifierType::Url)
            .with_matcher(rule(r#"(?i)\bhttps?://[^\s<>"'(){}\[\]]+"#))
            .with_validator(Validator::Url)
            .with_priority(9)
            .with_extractor(TrailingPunctuationExtractor),
    ]);

    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn spec(key: &str) -> DetectionTypeSpec {
        builtin_types()
            .into_iter()
            .find(|s| s.key == key)
            .unwrap()
    }

    fn matches(key: &str, text: &str) -> Vec<String> {
        let spec = spec(key);
        spec.matchers
            .iter()
            .flat_map(|m| m.find_all(text).unwrap())
            .map(|m| m.text.to_string())
            .collect()
    }

    #[test]
    fn test_table_is_well_formed() {
        let table = builtin_types();
        let keys: HashSet<_> = table.iter().map(|s| s.key.clone()).collect();
        assert_eq!(keys.len(), table.len());
        assert_eq!(table.len(), 25);
        for spec in &table {
            spec.validate().unwrap();
            assert_eq!(spec.context_width, 50);
        }
    }

    #[test]
    fn test_email_and_phone_patterns() {
        let text = "Contact me at jane@example.com or call (415) 555-2671";
        assert_eq!(matches("email", text), vec!["jane@example.com"]);
        assert_eq!(matches("phone_us", text), vec!["(415) 555-2671"]);
        assert!(matches("phone_intl", text).is_empty());
        assert!(matches("social_handle", text).is_empty());
        assert!(matches("domain", text).is_empty());
    }

    #[test]
    fn test_phone_intl() {
        assert_eq!(matches("phone_intl", "London: +44 20 7946 0958"), vec!["+44 20 7946 0958"]);
    }

    #[test]
    fn test_social_handle_skips_emails_and_paths() {
        assert_eq!(matches("social_handle", "ping @osint_fan today"), vec!["@osint_fan"]);
        assert!(matches("social_handle", "jane@example.com").is_empty());
        assert!(matches("social_handle", "x.com/@someone").is_empty());
    }

    #[test]
    fn test_domain_guards() {
        assert_eq!(matches("domain", "visit Example.org today"), vec!["Example.org"]);
        assert!(matches("domain", "jane.doe@example.com").is_empty());
    }

    #[test]
    fn test_social_reserved_paths_excluded() {
        let twitter = spec("social_twitter");
        let exclusion = twitter.exclusion.as_ref().unwrap();
        assert!(exclusion.is_excluded("twitter.com/intent"));
        assert!(!exclusion.is_excluded("twitter.com/osint_fan"));
    }

    #[test]
    fn test_ipv6_forms() {
        assert_eq!(matches("ip_v6", "addr 2001:db8::1 here"), vec!["2001:db8::1"]);
        assert_eq!(
            matches("ip_v6", "2001:0db8:85a3:0000:0000:8a2e:0370:7334"),
            vec!["2001:0db8:85a3:0000:0000:8a2e:0370:7334"]
        );
        assert!(matches("ip_v6", "at 10:30:45").is_empty());
    }

    #[test]
    fn test_credit_card_is_sensitive() {
        let card = spec("credit_card");
        assert!(card.sensitive);
        assert_eq!(matches("credit_card", "card 4111 1111 1111 1111 ok"), vec!["4111 1111 1111 1111"]);
    }
}
