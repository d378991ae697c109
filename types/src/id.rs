//! User and venue identifiers.
//!
//! Both are opaque strings issued by external systems (the auth service and the
//! venue onboarding flow). They are validated once at the boundary so the rest
//! of the engine never has to second-guess them. Control characters are refused
//! because the storage layer uses `0x00` as a key separator.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::TypesError;

/// Longest identifier accepted from either issuer.
pub const MAX_ID_LEN: usize = 128;

fn validate(kind: &'static str, raw: &str) -> Result<(), TypesError> {
    if raw.is_empty() {
        return Err(TypesError::InvalidId {
            kind,
            reason: "empty".into(),
        });
    }
    if raw.len() > MAX_ID_LEN {
        return Err(TypesError::InvalidId {
            kind,
            reason: format!("longer than {MAX_ID_LEN} bytes"),
        });
    }
    if raw.chars().any(char::is_control) {
        return Err(TypesError::InvalidId {
            kind,
            reason: "contains control characters".into(),
        });
    }
    Ok(())
}

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Parse and validate a raw identifier.
            pub fn parse(raw: impl Into<String>) -> Result<Self, TypesError> {
                let s = raw.into();
                validate($kind, &s)?;
                Ok(Self(s))
            }

            /// Create an identifier from a string known to be valid.
            ///
            /// # Panics
            /// Panics if the string is empty, too long, or contains control characters.
            pub fn new(raw: impl Into<String>) -> Self {
                match Self::parse(raw) {
                    Ok(id) => id,
                    Err(e) => panic!("{e}"),
                }
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn as_bytes(&self) -> &[u8] {
                self.0.as_bytes()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl TryFrom<String> for $name {
            type Error = TypesError;

            fn try_from(s: String) -> Result<Self, Self::Error> {
                Self::parse(s)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

string_id!(
    /// An authenticated user, as issued by the external session service.
    UserId,
    "user"
);

string_id!(
    /// A venue (popup store), as issued by the onboarding flow.
    VenueId,
    "venue"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_plain_ids() {
        let id = UserId::parse("user-42").unwrap();
        assert_eq!(id.as_str(), "user-42");
        assert_eq!(id.to_string(), "user-42");
    }

    #[test]
    fn parse_rejects_empty() {
        assert!(matches!(
            VenueId::parse(""),
            Err(TypesError::InvalidId { kind: "venue", .. })
        ));
    }

    #[test]
    fn parse_rejects_separator_byte() {
        assert!(UserId::parse("a\0b").is_err());
    }

    #[test]
    fn parse_rejects_overlong() {
        assert!(UserId::parse("x".repeat(MAX_ID_LEN + 1)).is_err());
        assert!(UserId::parse("x".repeat(MAX_ID_LEN)).is_ok());
    }

    #[test]
    fn deserialize_validates() {
        let ok: Result<VenueId, _> = serde_json::from_str("\"V1\"");
        assert_eq!(ok.unwrap(), VenueId::new("V1"));
        let bad: Result<VenueId, _> = serde_json::from_str("\"\"");
        assert!(bad.is_err());
    }

    #[test]
    #[should_panic]
    fn new_panics_on_invalid() {
        let _ = UserId::new("");
    }
}
