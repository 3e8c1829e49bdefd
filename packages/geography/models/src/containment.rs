//! Hand-curated containment routing tables.
//!
//! Deserialized from `registry/containment.toml`. These tables decide,
//! per (parent level, child level) pair, whether containment can be read
//! off the geoid numbering scheme or has to come from spatial overlap.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

use crate::geoid::Geoid;

/// How children of a parent geography are discovered.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
pub enum ContainmentStrategy {
    /// Parent is the nation: list every whole-area geography at the child
    /// level.
    #[serde(rename = "national")]
    #[strum(serialize = "national")]
    NationalEnumeration,
    /// Child geoids start with the parent's local id.
    #[serde(rename = "official_prefix")]
    #[strum(serialize = "official_prefix")]
    PrefixConstruction,
    /// Curated non-nesting pair resolved through containment edges.
    #[serde(rename = "approximate_coverage")]
    #[strum(serialize = "approximate_coverage")]
    CoverageFiltered,
    /// No curated entry; resolved through a live spatial containment
    /// lookup.
    #[serde(rename = "spatial_gis")]
    #[strum(serialize = "spatial_gis")]
    SpatialGis,
}

/// A directed, curated containment edge between two summary levels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainmentRelation {
    /// Parent summary level code.
    pub parent_level: String,
    /// Child summary level code.
    pub child_level: String,
    /// How the child is found inside the parent.
    pub mechanism: ContainmentStrategy,
}

/// Child-listing policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildPolicy {
    /// Children must overlap their parent by strictly more than this
    /// percentage.
    pub min_coverage: f64,
    /// Component code of a geography's whole-area record.
    pub primary_component: String,
    /// Geoids never returned by national enumeration.
    #[serde(default)]
    pub national_denylist: Vec<Geoid>,
    /// Substring marking placeholder rows excluded from prefix matches.
    pub undefined_name_pattern: String,
}

/// A parent derivable from a child's geoid without a database lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InferenceRule {
    /// Summary level of the inferred parent.
    pub level: String,
    /// Number of leading local-id characters shared with the parent.
    pub prefix_len: usize,
    /// Child summary levels this rule applies to.
    pub children: BTreeSet<String>,
}

impl InferenceRule {
    /// Builds the parent geoid for `child`, or `None` if the rule does not
    /// apply to the child's level or its local id is too short.
    #[must_use]
    pub fn infer(&self, child: &Geoid) -> Option<Geoid> {
        if !self.children.contains(child.summary_level()) {
            return None;
        }
        let short_id = child.short_id().get(..self.prefix_len)?;
        Some(Geoid::primary(&self.level, short_id))
    }
}

/// Parent-chain policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParentPolicy {
    /// Parents must cover strictly more than this percentage of the child.
    pub min_coverage: f64,
    /// Child levels whose parents are read from containment edges.
    #[serde(default)]
    pub coverage_levels: BTreeSet<String>,
    /// Deterministic parent rules, applied in order.
    #[serde(default)]
    pub inferred: Vec<InferenceRule>,
}

/// The full containment configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainmentTables {
    /// Summary level of the nation.
    pub national_level: String,
    /// Parent level → child levels nested in the numbering scheme.
    #[serde(default)]
    pub official: BTreeMap<String, BTreeSet<String>>,
    /// Parent level → child levels only found through spatial overlap.
    #[serde(default)]
    pub approximate: BTreeMap<String, BTreeSet<String>>,
    /// Child-listing policy.
    pub children: ChildPolicy,
    /// Parent-chain policy.
    pub parents: ParentPolicy,
}

impl ContainmentTables {
    /// Every summary level code mentioned anywhere in the tables.
    pub(crate) fn referenced_levels(&self) -> BTreeSet<&str> {
        let mut levels = BTreeSet::new();
        levels.insert(self.national_level.as_str());
        for map in [&self.official, &self.approximate] {
            for (parent, children) in map {
                levels.insert(parent.as_str());
                levels.extend(children.iter().map(String::as_str));
            }
        }
        levels.extend(self.parents.coverage_levels.iter().map(String::as_str));
        for rule in &self.parents.inferred {
            levels.insert(rule.level.as_str());
            levels.extend(rule.children.iter().map(String::as_str));
        }
        levels
    }

    /// Flattens the curated maps into relation records, official pairs
    /// first.
    #[must_use]
    pub fn relations(&self) -> Vec<ContainmentRelation> {
        let official = self.official.iter().map(|m| (m, ContainmentStrategy::PrefixConstruction));
        let approximate = self
            .approximate
            .iter()
            .map(|m| (m, ContainmentStrategy::CoverageFiltered));

        official
            .chain(approximate)
            .flat_map(|((parent, children), mechanism)| {
                children.iter().map(move |child| ContainmentRelation {
                    parent_level: parent.clone(),
                    child_level: child.clone(),
                    mechanism,
                })
            })
            .collect()
    }
}
