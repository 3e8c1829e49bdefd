//! Parent chain resolution.
//!
//! A chain starts with the geography itself, followed by parents read off
//! the geoid numbering scheme, followed by parents found in the
//! containment-edge table. The correction table is applied last, over the
//! whole chain.

use std::collections::{BTreeMap, BTreeSet};

use census_geo_geography_models::{
    Geoid, ParentChainEntry, ParentCorrections, parent_corrections, summary_levels,
};

use crate::GeoError;
use crate::store::GeographyStore;

/// Builds the ordered parent chain of `geoid`.
///
/// Containment rows whose parent geoid is malformed or carries an unknown
/// summary level are logged and skipped.
///
/// # Errors
///
/// * [`GeoError::Format`] if `geoid` is malformed
/// * [`GeoError::Database`] if the containment lookup fails
pub async fn resolve_parents(
    store: &dyn GeographyStore,
    geoid: &str,
) -> Result<Vec<ParentChainEntry>, GeoError> {
    let geoid = Geoid::parse(geoid)?;
    let registry = summary_levels();
    let policy = &registry.containment().parents;

    let mut chain = vec![ParentChainEntry::this(geoid.clone())];

    for rule in &policy.inferred {
        if let Some(parent) = rule.infer(&geoid) {
            let relation = registry.name_of(&rule.level).unwrap_or(&rule.level);
            chain.push(ParentChainEntry::new(relation, parent, 100.0));
        }
    }

    if policy.coverage_levels.contains(geoid.summary_level()) {
        for edge in store.parent_edges(&geoid, policy.min_coverage).await? {
            let parent = match Geoid::parse(&edge.parent_geoid) {
                Ok(parent) => parent,
                Err(e) => {
                    log::warn!("Skipping containment row for {geoid}: {e}");
                    continue;
                }
            };
            let Some(relation) = registry.name_of(parent.summary_level()) else {
                log::warn!(
                    "Skipping containment row for {geoid}: parent {parent} has unknown summary level {}",
                    parent.summary_level()
                );
                continue;
            };
            chain.push(ParentChainEntry::new(
                relation,
                parent,
                edge.percent_covered,
            ));
        }
    }

    Ok(apply_corrections(chain, parent_corrections()))
}

/// Applies drops and substitutions, then removes later duplicates. The
/// head entry is never removed.
fn apply_corrections(
    chain: Vec<ParentChainEntry>,
    corrections: &ParentCorrections,
) -> Vec<ParentChainEntry> {
    let mut entries = chain.into_iter();
    let Some(head) = entries.next() else {
        return Vec::new();
    };

    let subject = head.geoid.clone();
    let mut seen = BTreeSet::from([head.geoid.clone()]);
    let mut corrected = vec![head];

    for mut entry in entries {
        if corrections.is_dropped(&entry.geoid) {
            continue;
        }
        for sub in corrections.substitutions_for(&subject) {
            if entry.geoid == sub.parent {
                entry.geoid = sub.replacement.clone();
                entry.coverage = sub.coverage;
                entry.display_name.clone_from(&sub.display_name);
            }
        }
        if seen.insert(entry.geoid.clone()) {
            corrected.push(entry);
        }
    }

    corrected
}

/// Fills in display names and summary levels from the name lookup, in one
/// batched query. The nation is never looked up, entries without a lookup
/// row are left as they are, and display names already set are kept.
///
/// # Errors
///
/// Returns [`GeoError`] if the lookup fails.
pub async fn annotate_parents(
    store: &dyn GeographyStore,
    chain: &mut [ParentChainEntry],
) -> Result<(), GeoError> {
    let national_level = summary_levels().containment().national_level.as_str();

    let geoids: Vec<Geoid> = chain
        .iter()
        .map(|e| &e.geoid)
        .filter(|g| g.summary_level() != national_level)
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    if geoids.is_empty() {
        return Ok(());
    }

    let mut names = BTreeMap::new();
    for name in store.geography_names(&geoids).await? {
        names.entry(name.geoid.clone()).or_insert(name);
    }

    for entry in chain.iter_mut() {
        let Some(name) = names.get(&entry.geoid) else {
            continue;
        };
        if entry.display_name.is_none() {
            entry.display_name = Some(name.display_name.clone());
        }
        entry.summary_level = Some(name.summary_level.clone());
    }

    Ok(())
}
