#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Census geography identifiers, summary levels, and containment tables.
//!
//! These types describe the census geography hierarchy (states, counties,
//! tracts, places, districts, ...) independently of how it is stored. The
//! static registries are embedded TOML parsed once per process.

pub mod containment;
pub mod corrections;
pub mod geoid;
pub mod release;
pub mod summary_level;

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use containment::{ContainmentRelation, ContainmentStrategy, ContainmentTables};
pub use corrections::{ParentCorrections, parent_corrections};
pub use geoid::{Geoid, GeoidFormatError};
pub use release::{Release, ReleaseRegistry, releases};
pub use summary_level::{SummaryLevel, SummaryLevelRegistry, summary_levels};

/// Relation label of the first entry of every parent chain.
pub const THIS_RELATION: &str = "this";

/// A geography found inside a parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildGeography {
    /// Child geoid.
    pub geoid: Geoid,
    /// Display name from the release's geography table.
    pub name: String,
}

/// A spatial overlap record between two geographies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainmentEdge {
    /// Parent geoid, as stored. May not parse or may carry an unknown
    /// summary level.
    pub parent_geoid: String,
    /// Child geoid.
    pub child_geoid: Geoid,
    /// Share of the child's area inside the parent (0-100).
    pub percent_covered: f64,
}

/// Display metadata for a geography from the TIGER name lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeographyName {
    /// Geoid.
    pub geoid: Geoid,
    /// Display name (e.g. "Wayne County, MI").
    pub display_name: String,
    /// Three-digit summary level.
    pub summary_level: String,
}

/// One step of a geography's ancestor chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParentChainEntry {
    /// Human relation label (`"this"`, `"county"`, `"state"`, ...).
    pub relation: String,
    /// Ancestor geoid.
    pub geoid: Geoid,
    /// Share of the child covered by this ancestor (0-100).
    pub coverage: f64,
    /// Display name, once annotated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Summary level, once annotated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary_level: Option<String>,
}

impl ParentChainEntry {
    /// Builds an unannotated entry.
    #[must_use]
    pub fn new(relation: impl Into<String>, geoid: Geoid, coverage: f64) -> Self {
        Self {
            relation: relation.into(),
            geoid,
            coverage,
            display_name: None,
            summary_level: None,
        }
    }

    /// The head entry for `geoid` itself.
    #[must_use]
    pub fn this(geoid: Geoid) -> Self {
        Self::new(THIS_RELATION, geoid, 100.0)
    }
}

/// Output of geoid expansion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpansionResult {
    /// Every geoid confirmed to exist in the release.
    pub valid_geoids: BTreeSet<Geoid>,
    /// Child → the shorthand parent it was expanded from.
    pub child_parent_map: BTreeMap<Geoid, Geoid>,
}

/// Error returned when requested geoids are missing from a release.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("The {release_name} release doesn't include GeoID(s) {}.", .geoids.join(","))]
pub struct GeoidExpansionError {
    /// Release slug.
    pub release: String,
    /// Release display name.
    pub release_name: String,
    /// Offending geoids, sorted.
    pub geoids: Vec<String>,
}

/// Errors loading an embedded registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The TOML document did not parse.
    #[error("Failed to parse {file}: {source}")]
    Parse {
        /// Registry file name.
        file: &'static str,
        /// Underlying parser error.
        source: toml::de::Error,
    },

    /// The document parsed but is inconsistent.
    #[error("Invalid {file}: {message}")]
    Invalid {
        /// Registry file name.
        file: &'static str,
        /// Description of what went wrong.
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expansion_error_message() {
        let err = GeoidExpansionError {
            release: "acs2021_5yr".to_string(),
            release_name: "ACS 2021 5-year".to_string(),
            geoids: vec!["04000US99".to_string(), "99999US00000".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "The ACS 2021 5-year release doesn't include GeoID(s) 04000US99,99999US00000."
        );
    }

    #[test]
    fn chain_entry_serialization_skips_missing_annotations() {
        let entry = ParentChainEntry::this(Geoid::parse("04000US26").unwrap());
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"relation": "this", "geoid": "04000US26", "coverage": 100.0})
        );
    }
}
