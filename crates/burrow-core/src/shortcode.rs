use crate::error::CoreError;
use crate::id::LinkId;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

const ALPHABET_LEN: u64 = 26;

/// Longest code a `u64` id can produce (`26^14 > u64::MAX`).
pub const MAX_LENGTH: usize = 14;

/// A short code identifying a stored link.
///
/// Codes are the bijective base-26 rendering of a [`LinkId`], the same scheme
/// spreadsheets use for column names: `1 -> "A"`, `26 -> "Z"`, `27 -> "AA"`.
/// There is no zero digit, so every non-empty string over `A-Z` is the code
/// of exactly one id.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ShortCode(String);

impl ShortCode {
    /// Encodes an id into its short code.
    ///
    /// # Examples
    ///
    /// ```
    /// use burrow_core::{LinkId, ShortCode};
    ///
    /// let code = ShortCode::encode(LinkId::new(28).unwrap());
    /// assert_eq!(code.as_str(), "AB");
    /// ```
    pub fn encode(id: LinkId) -> Self {
        let mut n = id.get();
        let mut letters = Vec::with_capacity(MAX_LENGTH);

        while n > 0 {
            n -= 1;
            letters.push(b'A' + (n % ALPHABET_LEN) as u8);
            n /= ALPHABET_LEN;
        }
        letters.reverse();

        // only ASCII uppercase letters were pushed
        Self(letters.into_iter().map(char::from).collect())
    }

    /// Recovers the id this code was encoded from.
    ///
    /// Returns `None` only when the code is too long to fit in a `u64`.
    pub fn decode(&self) -> Option<LinkId> {
        let mut n: u64 = 0;
        for byte in self.0.bytes() {
            let digit = u64::from(byte - b'A') + 1;
            n = n.checked_mul(ALPHABET_LEN)?.checked_add(digit)?;
        }
        LinkId::new(n)
    }

    /// Creates a `ShortCode` from external input after validating it.
    ///
    /// Valid codes are non-empty, at most [`MAX_LENGTH`] characters and
    /// contain only `A-Z`.
    pub fn new(code: impl Into<String>) -> Result<Self, CoreError> {
        let code = code.into();
        Self::validate(&code)?;
        Ok(Self(code))
    }

    /// Generates the full shortened URL based on the provided base URL.
    pub fn to_url(&self, base_url: &str) -> String {
        format!("{}/{}", base_url.trim_end_matches('/'), self.0)
    }

    /// Returns the short code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(code: &str) -> Result<(), CoreError> {
        if code.is_empty() || code.len() > MAX_LENGTH {
            return Err(CoreError::InvalidShortCode(format!(
                "length must be between 1 and {}, got {}",
                MAX_LENGTH,
                code.len()
            )));
        }

        if !code.bytes().all(|b| b.is_ascii_uppercase()) {
            return Err(CoreError::InvalidShortCode(format!(
                "must contain only letters A-Z: '{}'",
                code
            )));
        }

        Ok(())
    }
}

impl TryFrom<String> for ShortCode {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ShortCode> for String {
    fn from(value: ShortCode) -> Self {
        value.0
    }
}

impl Display for ShortCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn encode(n: u64) -> String {
        ShortCode::encode(LinkId::new(n).unwrap()).as_str().to_owned()
    }

    #[test]
    fn known_values() {
        assert_eq!(encode(1), "A");
        assert_eq!(encode(2), "B");
        assert_eq!(encode(26), "Z");
        assert_eq!(encode(27), "AA");
        assert_eq!(encode(28), "AB");
        assert_eq!(encode(52), "AZ");
        assert_eq!(encode(53), "BA");
        assert_eq!(encode(702), "ZZ");
        assert_eq!(encode(703), "AAA");
    }

    #[test]
    fn injective_and_alphabetic_over_range() {
        let mut seen = HashSet::new();
        for n in 1..=20_000u64 {
            let code = encode(n);
            assert!(code.bytes().all(|b| b.is_ascii_uppercase()), "{code}");
            assert!(seen.insert(code), "collision at {n}");
        }
    }

    #[test]
    fn decode_inverts_encode() {
        for n in (1..=5_000u64).chain([u64::MAX - 1, u64::MAX]) {
            let id = LinkId::new(n).unwrap();
            assert_eq!(ShortCode::encode(id).decode(), Some(id));
        }
    }

    #[test]
    fn largest_id_fits_max_length() {
        let code = ShortCode::encode(LinkId::new(u64::MAX).unwrap());
        assert_eq!(code.as_str().len(), MAX_LENGTH);
        assert!(ShortCode::new(code.as_str()).is_ok());
    }

    #[test]
    fn decode_overflow_is_none() {
        let code = ShortCode::new("Z".repeat(MAX_LENGTH)).unwrap();
        assert!(code.decode().is_none());
    }

    #[test]
    fn valid_codes() {
        assert!(ShortCode::new("A").is_ok());
        assert!(ShortCode::new("HELLO").is_ok());
    }

    #[test]
    fn invalid_codes() {
        assert!(ShortCode::new("").is_err());
        assert!(ShortCode::new("abc").is_err());
        assert!(ShortCode::new("AB1").is_err());
        assert!(ShortCode::new("A-B").is_err());
        assert!(ShortCode::new("A".repeat(MAX_LENGTH + 1)).is_err());
    }

    #[test]
    fn deserialize_validates() {
        let code: ShortCode = serde_json::from_str("\"AB\"").unwrap();
        assert_eq!(code.as_str(), "AB");
        assert!(serde_json::from_str::<ShortCode>("\"ab\"").is_err());
    }

    #[test]
    fn to_url() {
        let code = ShortCode::new("ABC").unwrap();
        assert_eq!(code.to_url("http://localhost:3000"), "http://localhost:3000/ABC");
        assert_eq!(code.to_url("http://localhost:3000/"), "http://localhost:3000/ABC");
    }
}
