//! Compile-time registry of census summary levels.
//!
//! Levels and the containment tables are embedded from `registry/` via
//! `include_str!` and parsed once into [`summary_levels`]. The registry is
//! never mutated after load.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use crate::RegistryError;
use crate::containment::{ContainmentRelation, ContainmentTables};

const SUMMARY_LEVELS_TOML: &str = include_str!("../registry/summary_levels.toml");
const CONTAINMENT_TOML: &str = include_str!("../registry/containment.toml");

/// Number of registered summary levels. Enforced by a test.
#[cfg(test)]
const EXPECTED_LEVEL_COUNT: usize = 34;

static EMPTY_LEVELS: BTreeSet<String> = BTreeSet::new();

static REGISTRY: LazyLock<SummaryLevelRegistry> = LazyLock::new(|| {
    SummaryLevelRegistry::from_toml(SUMMARY_LEVELS_TOML, CONTAINMENT_TOML)
        .unwrap_or_else(|e| panic!("Failed to load summary level registry: {e}"))
});

/// Returns the process-wide summary level registry.
///
/// # Panics
///
/// Panics on first use if the embedded TOML files are malformed. Since
/// they are compile-time constants this indicates a development error and
/// is caught by the registry tests.
#[must_use]
pub fn summary_levels() -> &'static SummaryLevelRegistry {
    &REGISTRY
}

/// A census summary level (e.g. `140` = census tract).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryLevel {
    /// Three-digit code.
    pub code: String,
    /// Singular display name (e.g. "census tract").
    pub name: String,
    /// Plural display name (e.g. "census tracts"). Empty for the nation.
    pub plural: String,
    /// TIGER/Line layer holding this level's boundaries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tiger_table: Option<String>,
}

#[derive(Deserialize)]
struct SummaryLevelFile {
    level: Vec<SummaryLevel>,
}

/// Summary levels plus the containment tables that route between them.
#[derive(Debug, Clone)]
pub struct SummaryLevelRegistry {
    levels: BTreeMap<String, SummaryLevel>,
    containment: ContainmentTables,
}

impl SummaryLevelRegistry {
    /// Builds a registry from TOML sources.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] if either document fails to parse, a
    /// level code is not three ASCII digits or is duplicated, or the
    /// containment tables reference an unknown level.
    pub fn from_toml(levels_toml: &str, containment_toml: &str) -> Result<Self, RegistryError> {
        let file: SummaryLevelFile =
            toml::de::from_str(levels_toml).map_err(|source| RegistryError::Parse {
                file: "summary_levels.toml",
                source,
            })?;
        let containment: ContainmentTables =
            toml::de::from_str(containment_toml).map_err(|source| RegistryError::Parse {
                file: "containment.toml",
                source,
            })?;

        let mut levels = BTreeMap::new();
        for level in file.level {
            if level.code.len() != 3 || !level.code.bytes().all(|b| b.is_ascii_digit()) {
                return Err(RegistryError::Invalid {
                    file: "summary_levels.toml",
                    message: format!("'{}' is not a three-digit summary level", level.code),
                });
            }
            if let Some(previous) = levels.insert(level.code.clone(), level) {
                return Err(RegistryError::Invalid {
                    file: "summary_levels.toml",
                    message: format!("duplicate summary level '{}'", previous.code),
                });
            }
        }

        if let Some(unknown) = containment
            .referenced_levels()
            .into_iter()
            .find(|code| !levels.contains_key(*code))
        {
            return Err(RegistryError::Invalid {
                file: "containment.toml",
                message: format!("unknown summary level '{unknown}'"),
            });
        }

        Ok(Self {
            levels,
            containment,
        })
    }

    /// Looks up a level by its three-digit code.
    #[must_use]
    pub fn get(&self, code: &str) -> Option<&SummaryLevel> {
        self.levels.get(code)
    }

    /// Whether `code` is a registered summary level.
    #[must_use]
    pub fn is_known(&self, code: &str) -> bool {
        self.levels.contains_key(code)
    }

    /// Singular display name of a level.
    #[must_use]
    pub fn name_of(&self, code: &str) -> Option<&str> {
        self.get(code).map(|l| l.name.as_str())
    }

    /// Plural display name of a level.
    #[must_use]
    pub fn plural_of(&self, code: &str) -> Option<&str> {
        self.get(code).map(|l| l.plural.as_str())
    }

    /// Resolves a code, singular name, or plural name (case-insensitive)
    /// to a level.
    #[must_use]
    pub fn resolve(&self, code_or_name: &str) -> Option<&SummaryLevel> {
        let needle = code_or_name.trim();
        self.get(needle).or_else(|| {
            self.levels.values().find(|l| {
                l.name.eq_ignore_ascii_case(needle)
                    || (!l.plural.is_empty() && l.plural.eq_ignore_ascii_case(needle))
            })
        })
    }

    /// All levels in code order.
    pub fn levels(&self) -> impl Iterator<Item = &SummaryLevel> {
        self.levels.values()
    }

    /// Child levels nested in `parent`'s numbering scheme.
    #[must_use]
    pub fn official_children(&self, parent: &str) -> &BTreeSet<String> {
        self.containment.official.get(parent).unwrap_or(&EMPTY_LEVELS)
    }

    /// Child levels of `parent` only discoverable through spatial overlap.
    #[must_use]
    pub fn approximate_children(&self, parent: &str) -> &BTreeSet<String> {
        self.containment
            .approximate
            .get(parent)
            .unwrap_or(&EMPTY_LEVELS)
    }

    /// The containment tables.
    #[must_use]
    pub const fn containment(&self) -> &ContainmentTables {
        &self.containment
    }

    /// The curated containment relations.
    #[must_use]
    pub fn relations(&self) -> Vec<ContainmentRelation> {
        self.containment.relations()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::containment::ContainmentStrategy;

    #[test]
    fn loads_all_levels() {
        let count = summary_levels().levels().count();
        assert_eq!(
            count, EXPECTED_LEVEL_COUNT,
            "Expected {EXPECTED_LEVEL_COUNT} summary levels, found {count}. \
             Update EXPECTED_LEVEL_COUNT after adding/removing levels."
        );
    }

    #[test]
    fn looks_up_names() {
        let registry = summary_levels();
        assert_eq!(registry.name_of("140"), Some("census tract"));
        assert_eq!(registry.plural_of("050"), Some("counties"));
        assert_eq!(registry.name_of("999"), None);
        assert!(!registry.is_known("999"));
    }

    #[test]
    fn resolves_aliases() {
        let registry = summary_levels();
        assert_eq!(registry.resolve("140").unwrap().code, "140");
        assert_eq!(registry.resolve("Census Tract").unwrap().code, "140");
        assert_eq!(registry.resolve("counties").unwrap().code, "050");
        assert_eq!(registry.resolve("ZCTA5").unwrap().code, "860");
        assert!(registry.resolve("neighborhood").is_none());
        assert!(registry.resolve("").is_none());
    }

    #[test]
    fn exposes_containment_maps() {
        let registry = summary_levels();
        assert!(registry.official_children("040").contains("050"));
        assert!(registry.approximate_children("310").contains("160"));
        assert!(registry.official_children("860").is_empty());
        assert!(registry.approximate_children("140").is_empty());
    }

    #[test]
    fn tract_parents_are_inferred_state_first() {
        let tract = crate::Geoid::parse("14000US26163511400").unwrap();
        let inferred: Vec<(String, String)> = summary_levels()
            .containment()
            .parents
            .inferred
            .iter()
            .filter_map(|rule| rule.infer(&tract).map(|g| (rule.level.clone(), g.to_string())))
            .collect();

        assert_eq!(
            inferred,
            vec![
                ("040".to_string(), "04000US26".to_string()),
                ("050".to_string(), "05000US26163".to_string()),
            ]
        );
    }

    #[test]
    fn shipped_tables_do_not_overlap() {
        let registry = summary_levels();
        for relation in registry.relations() {
            if relation.mechanism == ContainmentStrategy::CoverageFiltered {
                assert!(
                    !registry
                        .official_children(&relation.parent_level)
                        .contains(&relation.child_level),
                    "{} -> {} is both official and approximate",
                    relation.parent_level,
                    relation.child_level
                );
            }
        }
    }

    #[test]
    fn rejects_unknown_containment_level() {
        let levels = "[[level]]\ncode = \"040\"\nname = \"state\"\nplural = \"states\"\n";
        let containment = r#"
            national_level = "040"
            [official]
            "040" = ["050"]
            [children]
            min_coverage = 10.0
            primary_component = "00"
            undefined_name_pattern = "not defined"
            [parents]
            min_coverage = 5.0
        "#;
        let err = SummaryLevelRegistry::from_toml(levels, containment).unwrap_err();
        assert!(err.to_string().contains("'050'"), "{err}");
    }

    #[test]
    fn rejects_malformed_codes() {
        let levels = "[[level]]\ncode = \"40\"\nname = \"state\"\nplural = \"states\"\n";
        assert!(SummaryLevelRegistry::from_toml(levels, CONTAINMENT_TOML).is_err());
    }
}
