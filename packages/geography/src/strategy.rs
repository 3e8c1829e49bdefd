//! Containment strategy selection.
//!
//! First match wins:
//!
//! 1. parent is the nation → [`ContainmentStrategy::NationalEnumeration`]
//! 2. pair is official → [`ContainmentStrategy::PrefixConstruction`]
//! 3. pair is approximate → [`ContainmentStrategy::CoverageFiltered`]
//! 4. anything else → [`ContainmentStrategy::SpatialGis`]
//!
//! Official wins over approximate if a pair is listed in both.

use census_geo_geography_models::{ContainmentStrategy, SummaryLevelRegistry};

/// Picks how children at `child_level` are found inside a parent at
/// `parent_level`.
#[must_use]
pub fn select_strategy(
    registry: &SummaryLevelRegistry,
    parent_level: &str,
    child_level: &str,
) -> ContainmentStrategy {
    if parent_level == registry.containment().national_level {
        ContainmentStrategy::NationalEnumeration
    } else if registry.official_children(parent_level).contains(child_level) {
        ContainmentStrategy::PrefixConstruction
    } else if registry.approximate_children(parent_level).contains(child_level) {
        ContainmentStrategy::CoverageFiltered
    } else {
        ContainmentStrategy::SpatialGis
    }
}
