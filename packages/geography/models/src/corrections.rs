//! Special-case fixes for computed parent chains.
//!
//! Embedded from `registry/parent_corrections.toml`. Known quirks of the
//! backing geography data are listed here rather than branched on in
//! code.

use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use crate::RegistryError;
use crate::geoid::Geoid;

const PARENT_CORRECTIONS_TOML: &str = include_str!("../registry/parent_corrections.toml");

static CORRECTIONS: LazyLock<ParentCorrections> = LazyLock::new(|| {
    ParentCorrections::from_toml(PARENT_CORRECTIONS_TOML)
        .unwrap_or_else(|e| panic!("Failed to load parent corrections: {e}"))
});

/// Returns the process-wide parent correction table.
///
/// # Panics
///
/// Panics on first use if the embedded TOML is malformed.
#[must_use]
pub fn parent_corrections() -> &'static ParentCorrections {
    &CORRECTIONS
}

/// A geoid removed from every parent chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropCorrection {
    /// Geoid to remove.
    pub geoid: Geoid,
}

/// Replaces one parent of a specific geography with another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Substitution {
    /// Geography whose chain is corrected.
    pub subject: Geoid,
    /// Parent entry to replace.
    pub parent: Geoid,
    /// Geoid written in its place.
    pub replacement: Geoid,
    /// Coverage written in its place.
    pub coverage: f64,
    /// Display name written in its place.
    #[serde(default)]
    pub display_name: Option<String>,
}

/// The correction table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParentCorrections {
    /// Geoids dropped from all chains.
    #[serde(default)]
    pub drop: Vec<DropCorrection>,
    /// Per-geography parent substitutions.
    #[serde(default)]
    pub substitute: Vec<Substitution>,
}

impl ParentCorrections {
    /// Parses a correction table.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] if the document fails to parse.
    pub fn from_toml(toml_str: &str) -> Result<Self, RegistryError> {
        toml::de::from_str(toml_str).map_err(|source| RegistryError::Parse {
            file: "parent_corrections.toml",
            source,
        })
    }

    /// Whether `geoid` is dropped from all chains.
    #[must_use]
    pub fn is_dropped(&self, geoid: &Geoid) -> bool {
        self.drop.iter().any(|d| &d.geoid == geoid)
    }

    /// Substitutions that apply to `subject`'s chain.
    pub fn substitutions_for<'a>(
        &'a self,
        subject: &'a Geoid,
    ) -> impl Iterator<Item = &'a Substitution> + 'a {
        self.substitute.iter().filter(move |s| &s.subject == subject)
    }
}
