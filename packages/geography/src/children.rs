//! Lists the geographies at one summary level inside a parent geography.

use std::collections::BTreeSet;

use census_geo_geography_models::{
    ChildGeography, ContainmentStrategy, Geoid, Release, summary_levels,
};

use crate::GeoError;
use crate::store::GeographyStore;
use crate::strategy::select_strategy;

/// Resolves the children of `parent` at `child_level` in `release`.
///
/// `child_level` must already be a registered summary level code; callers
/// validate it before getting here.
///
/// # Errors
///
/// Returns [`GeoError`] if a query fails.
pub async fn resolve_children(
    store: &dyn GeographyStore,
    release: &Release,
    parent: &Geoid,
    child_level: &str,
) -> Result<Vec<ChildGeography>, GeoError> {
    let registry = summary_levels();
    let policy = &registry.containment().children;
    let strategy = select_strategy(registry, parent.summary_level(), child_level);

    log::debug!(
        "resolve_children: release={} parent={parent} child_level={child_level} strategy={strategy}",
        release.slug
    );

    match strategy {
        ContainmentStrategy::NationalEnumeration => {
            store
                .primary_geographies(
                    release,
                    child_level,
                    &policy.primary_component,
                    &policy.national_denylist,
                )
                .await
        }
        ContainmentStrategy::PrefixConstruction => {
            let prefix = Geoid::primary(child_level, parent.short_id());
            store
                .geographies_with_prefix(release, prefix.as_str(), &policy.undefined_name_pattern)
                .await
        }
        ContainmentStrategy::CoverageFiltered => {
            let rows = store
                .covered_geographies(release, parent, child_level, policy.min_coverage)
                .await?;
            Ok(dedup_by_geoid(rows))
        }
        ContainmentStrategy::SpatialGis => {
            let candidates = store
                .covered_child_geoids(parent, child_level, policy.min_coverage)
                .await?;
            if candidates.is_empty() {
                return Ok(Vec::new());
            }

            let candidates: Vec<Geoid> = candidates
                .into_iter()
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect();
            store.geographies_by_geoid(release, &candidates).await
        }
    }
}

/// Keeps the first row for each geoid.
fn dedup_by_geoid(rows: Vec<ChildGeography>) -> Vec<ChildGeography> {
    let mut seen = BTreeSet::new();
    rows.into_iter()
        .filter(|row| seen.insert(row.geoid.clone()))
        .collect()
}
