//! Resource locators attached to jobs
//!
//! Job specifications and completion deliverables are referenced by locator.
//! Front-ends render these as links, so a locator is only ever stored after
//! its scheme has been checked against the allowed set. Script-capable and
//! local schemes (`javascript`, `data`, `blob`, `file`) are refused outright,
//! as is anything unrecognised.

use crate::MAX_URI_LEN;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Schemes a stored locator may use.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UriScheme {
    Https,
    Http,
    Ipfs,
    Ens,
}

impl UriScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            UriScheme::Https => "https",
            UriScheme::Http => "http",
            UriScheme::Ipfs => "ipfs",
            UriScheme::Ens => "ens",
        }
    }

    fn from_lowercase(scheme: &str) -> Option<Self> {
        match scheme {
            "https" => Some(UriScheme::Https),
            "http" => Some(UriScheme::Http),
            "ipfs" => Some(UriScheme::Ipfs),
            "ens" => Some(UriScheme::Ens),
            _ => None,
        }
    }
}

const UNSAFE_SCHEMES: [&str; 5] = ["javascript", "vbscript", "data", "blob", "file"];

/// A locator that passed the scheme check.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SafeUri {
    raw: String,
    scheme: UriScheme,
}

impl SafeUri {
    /// Check `raw` and keep it byte for byte. Surrounding whitespace is
    /// refused, not trimmed.
    pub fn parse(raw: &str) -> Result<Self, UriError> {
        if raw.is_empty() {
            return Err(UriError::Empty);
        }
        if raw.len() > MAX_URI_LEN {
            return Err(UriError::TooLong {
                len: raw.len(),
                max: MAX_URI_LEN,
            });
        }
        // Browsers drop embedded tabs and newlines, which turns "java\tscript:" into a script link.
        if raw.chars().any(|c| c.is_control() || c.is_whitespace()) {
            return Err(UriError::IllegalCharacter);
        }

        let (scheme_text, rest) = raw.split_once(':').ok_or(UriError::MissingScheme)?;
        if scheme_text.is_empty() || !is_scheme_syntax(scheme_text) {
            return Err(UriError::MissingScheme);
        }

        let scheme_lower = scheme_text.to_ascii_lowercase();
        if UNSAFE_SCHEMES.contains(&scheme_lower.as_str()) {
            return Err(UriError::UnsafeScheme(scheme_lower));
        }
        let scheme = UriScheme::from_lowercase(&scheme_lower)
            .ok_or_else(|| UriError::UnsupportedScheme(scheme_lower.clone()))?;

        let locator = match scheme {
            UriScheme::Http | UriScheme::Https => rest
                .strip_prefix("//")
                .ok_or(UriError::EmptyLocator)?,
            UriScheme::Ipfs | UriScheme::Ens => rest.strip_prefix("//").unwrap_or(rest),
        };
        if locator.is_empty() || locator.starts_with('/') {
            return Err(UriError::EmptyLocator);
        }

        Ok(Self {
            raw: raw.to_string(),
            scheme,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn scheme(&self) -> UriScheme {
        self.scheme
    }
}

fn is_scheme_syntax(scheme: &str) -> bool {
    let mut chars = scheme.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

impl TryFrom<String> for SafeUri {
    type Error = UriError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<SafeUri> for String {
    fn from(value: SafeUri) -> Self {
        value.raw
    }
}

impl std::fmt::Display for SafeUri {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Why a locator was refused.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UriError {
    #[error("locator is empty")]
    Empty,

    #[error("locator is {len} bytes, limit is {max}")]
    TooLong { len: usize, max: usize },

    #[error("locator contains whitespace or control characters")]
    IllegalCharacter,

    #[error("locator has no scheme")]
    MissingScheme,

    #[error("unsafe scheme: {0}")]
    UnsafeScheme(String),

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("locator has no target after the scheme")]
    EmptyLocator,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_allowed_schemes() {
        let cases = [
            ("https://example.com/spec.json", UriScheme::Https),
            ("http://example.com", UriScheme::Http),
            ("ipfs://bafybeigdyrzt5sfp7udm7hu76uh7y26nf3efuylqabf3oclgtqy55fbzdi", UriScheme::Ipfs),
            ("ipfs:QmYwAPJzv5CZsnA625s3Xf2nemtYgPpHdWEz79ojWnPbdG", UriScheme::Ipfs),
            ("ens://job-42.alpha.agi.eth", UriScheme::Ens),
            ("HTTPS://Example.com", UriScheme::Https),
        ];
        for (raw, scheme) in cases {
            let uri = SafeUri::parse(raw).unwrap_or_else(|e| panic!("{raw}: {e}"));
            assert_eq!(uri.scheme(), scheme);
            assert_eq!(uri.as_str(), raw);
        }
    }

    #[test]
    fn rejects_unsafe_schemes() {
        for raw in [
            "javascript:alert(1)",
            "JavaScript:alert(1)",
            "data:text/html;base64,PHNjcmlwdD4=",
            "blob:https://example.com/uuid",
            "file:///etc/passwd",
        ] {
            assert!(
                matches!(SafeUri::parse(raw), Err(UriError::UnsafeScheme(_))),
                "{raw} should be unsafe"
            );
        }
    }

    #[test]
    fn rejects_obfuscated_scripts() {
        assert_eq!(
            SafeUri::parse("java\tscript:alert(1)"),
            Err(UriError::IllegalCharacter)
        );
        assert_eq!(
            SafeUri::parse("java\nscript:alert(1)"),
            Err(UriError::IllegalCharacter)
        );
    }

    #[test]
    fn rejects_malformed() {
        assert_eq!(SafeUri::parse(""), Err(UriError::Empty));
        assert_eq!(SafeUri::parse("   "), Err(UriError::IllegalCharacter));
        assert_eq!(SafeUri::parse("example.com/x"), Err(UriError::MissingScheme));
        assert_eq!(SafeUri::parse(":foo"), Err(UriError::MissingScheme));
        assert_eq!(SafeUri::parse("https:"), Err(UriError::EmptyLocator));
        assert_eq!(SafeUri::parse("https:///path"), Err(UriError::EmptyLocator));
        assert!(matches!(
            SafeUri::parse("ftp://example.com"),
            Err(UriError::UnsupportedScheme(_))
        ));
        let long = format!("https://{}", "a".repeat(MAX_URI_LEN));
        assert!(matches!(SafeUri::parse(&long), Err(UriError::TooLong { .. })));
    }

    #[test]
    fn surrounding_whitespace_is_refused_not_trimmed() {
        for raw in [" ipfs://QmSpec", "ipfs://QmSpec ", "ipfs://QmSpec\n"] {
            assert_eq!(SafeUri::parse(raw), Err(UriError::IllegalCharacter), "{raw:?}");
        }
        let kept = SafeUri::parse("ipfs://QmSpec").unwrap();
        assert_eq!(kept.as_str(), "ipfs://QmSpec");
    }

    #[test]
    fn deserialization_runs_the_check() {
        let ok: SafeUri = serde_json::from_str("\"ipfs://Qm123\"").unwrap();
        assert_eq!(ok.scheme(), UriScheme::Ipfs);
        let bad: Result<SafeUri, _> = serde_json::from_str("\"javascript:alert(1)\"");
        assert!(bad.is_err());
    }
}
