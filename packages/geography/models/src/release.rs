//! Compile-time registry of data releases.
//!
//! Each release has its own database schema holding a `geoheader` table.
//! Containment edges and display names live in a shared TIGER schema.

use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use crate::RegistryError;

const RELEASES_TOML: &str = include_str!("../registry/releases.toml");

/// Number of registered releases. Enforced by a test.
#[cfg(test)]
const EXPECTED_RELEASE_COUNT: usize = 12;

/// Alias accepted by [`ReleaseRegistry::resolve`] for the expansion
/// release.
pub const LATEST_RELEASE_ALIAS: &str = "latest";

static REGISTRY: LazyLock<ReleaseRegistry> = LazyLock::new(|| {
    ReleaseRegistry::from_toml(RELEASES_TOML)
        .unwrap_or_else(|e| panic!("Failed to load release registry: {e}"))
});

/// Returns the process-wide release registry.
///
/// # Panics
///
/// Panics on first use if the embedded `releases.toml` is malformed.
#[must_use]
pub fn releases() -> &'static ReleaseRegistry {
    &REGISTRY
}

/// A data release (e.g. the 2021 ACS 5-year estimates).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    /// Schema name (e.g. `"acs2021_5yr"`).
    pub slug: String,
    /// Human-readable name (e.g. "ACS 2021 5-year").
    pub name: String,
    /// Survey years covered (e.g. "2017-2021").
    pub years: String,
}

/// Known releases plus the shared TIGER schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseRegistry {
    tiger_schema: String,
    expand_latest_with: String,
    #[serde(rename = "release")]
    releases: Vec<Release>,
}

impl ReleaseRegistry {
    /// Parses and validates a release registry.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] if the document fails to parse, a schema
    /// name is not a plain lowercase identifier, a slug is duplicated, or
    /// `expand_latest_with` names an unknown release.
    pub fn from_toml(toml_str: &str) -> Result<Self, RegistryError> {
        let registry: Self = toml::de::from_str(toml_str).map_err(|source| RegistryError::Parse {
            file: "releases.toml",
            source,
        })?;

        let invalid = |message: String| RegistryError::Invalid {
            file: "releases.toml",
            message,
        };

        let names = std::iter::once(registry.tiger_schema.as_str())
            .chain(registry.releases.iter().map(|r| r.slug.as_str()));
        for name in names {
            if !is_schema_identifier(name) {
                return Err(invalid(format!("'{name}' is not a valid schema name")));
            }
        }

        for (i, release) in registry.releases.iter().enumerate() {
            if registry.releases[..i].iter().any(|r| r.slug == release.slug) {
                return Err(invalid(format!("duplicate release '{}'", release.slug)));
            }
        }

        if registry.get(&registry.expand_latest_with).is_none() {
            return Err(invalid(format!(
                "expand_latest_with names unknown release '{}'",
                registry.expand_latest_with
            )));
        }

        Ok(registry)
    }

    /// Looks up a release by slug.
    #[must_use]
    pub fn get(&self, slug: &str) -> Option<&Release> {
        self.releases.iter().find(|r| r.slug == slug)
    }

    /// Looks up a release by slug, mapping [`LATEST_RELEASE_ALIAS`] to the
    /// release used for shorthand expansion.
    #[must_use]
    pub fn resolve(&self, slug: &str) -> Option<&Release> {
        if slug == LATEST_RELEASE_ALIAS {
            return Some(self.latest_expansion());
        }
        self.get(slug)
    }

    /// Display name for a slug, falling back to the slug itself.
    #[must_use]
    pub fn display_name<'a>(&'a self, slug: &'a str) -> &'a str {
        self.get(slug).map_or(slug, |r| r.name.as_str())
    }

    /// The release used to expand shorthand for "latest" requests.
    ///
    /// # Panics
    ///
    /// Never in practice: construction guarantees the release exists.
    #[must_use]
    pub fn latest_expansion(&self) -> &Release {
        self.get(&self.expand_latest_with)
            .expect("expand_latest_with validated at load")
    }

    /// Schema holding the containment-edge and name-lookup tables.
    #[must_use]
    pub fn tiger_schema(&self) -> &str {
        &self.tiger_schema
    }

    /// All releases, newest first.
    #[must_use]
    pub fn releases(&self) -> &[Release] {
        &self.releases
    }
}

fn is_schema_identifier(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with(|c: char| c.is_ascii_digit())
        && name
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_')
}
