//! Census geoid parsing.
//!
//! A geoid looks like `14000US26163511400`: a three-digit summary level
//! stem, an optional component code, the literal `US` separator, and a
//! variable-length local identifier. The stem before `US` decides which
//! summary level the geography belongs to.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Separator between the summary level stem and the local identifier.
pub const GEOID_SEPARATOR: &str = "US";

/// Error returned when a string is not a well-formed geoid.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid geoid '{geoid}': {reason}")]
pub struct GeoidFormatError {
    /// The offending input, as supplied.
    pub geoid: String,
    /// What was wrong with it.
    pub reason: &'static str,
}

/// A validated, upper-cased census geoid.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Geoid(String);

impl Geoid {
    /// Parses and normalizes a geoid.
    ///
    /// Input is upper-cased before validation, so `14000us26163511400`
    /// and `14000US26163511400` are the same geoid.
    ///
    /// # Errors
    ///
    /// Returns [`GeoidFormatError`] if the input does not split into
    /// exactly two parts on `"US"`, if the stem does not start with a
    /// three-digit summary level, or if any other character is not an
    /// ASCII letter or digit.
    pub fn parse(input: &str) -> Result<Self, GeoidFormatError> {
        let normalized = input.trim().to_uppercase();

        let mut parts = normalized.split(GEOID_SEPARATOR);
        let (Some(stem), Some(short_id), None) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(GeoidFormatError {
                geoid: input.to_string(),
                reason: "expected exactly one 'US' separator",
            });
        };

        if stem.len() < 3 || !stem.bytes().take(3).all(|b| b.is_ascii_digit()) {
            return Err(GeoidFormatError {
                geoid: input.to_string(),
                reason: "must start with a three-digit summary level",
            });
        }

        if !stem.bytes().chain(short_id.bytes()).all(is_geoid_byte) {
            return Err(GeoidFormatError {
                geoid: input.to_string(),
                reason: "only ASCII letters and digits are allowed",
            });
        }

        Ok(Self(normalized))
    }

    /// Returns the geoid as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the three-character summary level (e.g. `"140"`).
    #[must_use]
    pub fn summary_level(&self) -> &str {
        &self.0[..3]
    }

    /// Returns the part before `US`, including any component code
    /// (e.g. `"14000"`).
    #[must_use]
    pub fn stem(&self) -> &str {
        self.split().0
    }

    /// Returns the local identifier after `US` (e.g. `"26163511400"`).
    ///
    /// Empty for the nation (`01000US`).
    #[must_use]
    pub fn short_id(&self) -> &str {
        self.split().1
    }

    /// Builds the geoid of a whole-area geography at `summary_level` whose
    /// local identifier is `short_id`, e.g. `("050", "26163")` →
    /// `05000US26163`.
    #[must_use]
    pub fn primary(summary_level: &str, short_id: &str) -> Self {
        Self(format!("{summary_level}00{GEOID_SEPARATOR}{short_id}").to_uppercase())
    }

    fn split(&self) -> (&str, &str) {
        self.0
            .split_once(GEOID_SEPARATOR)
            .unwrap_or((self.0.as_str(), ""))
    }
}

/// Upper-case ASCII letters and digits. Keeps SQL `LIKE` wildcards out of
/// prefixes built from a geoid.
const fn is_geoid_byte(b: u8) -> bool {
    b.is_ascii_digit() || b.is_ascii_uppercase()
}

impl fmt::Display for Geoid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Geoid {
    type Err = GeoidFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Geoid {
    type Error = GeoidFormatError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Geoid> for String {
    fn from(value: Geoid) -> Self {
        value.0
    }
}

impl AsRef<str> for Geoid {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for Geoid {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Geoid {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}
