//! Geoid expansion.
//!
//! Callers pass a mix of explicit geoids (`04000US26`) and shorthand
//! tokens of the form `<child level>|<parent geoid>` (`140|05000US26163`,
//! "every tract in Wayne County"). Shorthand is resolved to children and
//! trusted as-is. Explicit geoids are checked for existence in one batched
//! query. Any explicit geoid that cannot be confirmed fails the whole call
//! with a [`GeoidExpansionError`] listing every offender.

use std::collections::BTreeSet;

use census_geo_geography_models::{
    ExpansionResult, Geoid, GeoidExpansionError, releases, summary_levels,
};

use crate::GeoError;
use crate::children::resolve_children;
use crate::store::GeographyStore;

const SHORTHAND_SEPARATOR: char = '|';

/// A `<child level>|<parent geoid>` token, not yet validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Shorthand<'a> {
    child_level: &'a str,
    parent: &'a str,
}

/// Splits a shorthand token. Tokens without exactly one separator or
/// without a three-character level are treated as explicit geoids.
fn parse_shorthand(token: &str) -> Option<Shorthand<'_>> {
    let (child_level, parent) = token.split_once(SHORTHAND_SEPARATOR)?;
    if parent.contains(SHORTHAND_SEPARATOR) || child_level.chars().count() != 3 {
        return None;
    }
    Some(Shorthand {
        child_level,
        parent,
    })
}

/// Expands `tokens` against `release` (a slug, or `"latest"`).
///
/// # Errors
///
/// * [`GeoError::UnknownRelease`] if `release` is not registered
/// * [`GeoError::UnknownSummaryLevel`] if a shorthand child or parent
///   level is not registered
/// * [`GeoError::Format`] if a shorthand parent is not a geoid
/// * [`GeoError::Expansion`] if any explicit geoid is malformed or missing
///   from the release
/// * [`GeoError::Database`] if a query fails
pub async fn expand<S: AsRef<str> + Sync>(
    store: &dyn GeographyStore,
    tokens: &[S],
    release: &str,
) -> Result<ExpansionResult, GeoError> {
    let release = releases()
        .resolve(release)
        .ok_or_else(|| GeoError::UnknownRelease {
            release: release.to_string(),
        })?;
    let registry = summary_levels();

    let mut shorthand = Vec::new();
    let mut explicit = BTreeSet::new();
    let mut malformed = BTreeSet::new();

    for token in tokens {
        let token = token.as_ref().trim();
        if token.is_empty() {
            continue;
        }
        if let Some(parsed) = parse_shorthand(token) {
            shorthand.push(parsed);
            continue;
        }
        match Geoid::parse(token) {
            Ok(geoid) => {
                explicit.insert(geoid);
            }
            Err(e) => {
                log::debug!("expand: {e}");
                malformed.insert(token.to_uppercase());
            }
        }
    }

    // Validate every shorthand token before touching the database.
    let mut requests = Vec::with_capacity(shorthand.len());
    let mut seen = BTreeSet::new();
    for Shorthand {
        child_level,
        parent,
    } in shorthand
    {
        let parent = Geoid::parse(parent)?;
        for level in [child_level, parent.summary_level()] {
            if !registry.is_known(level) {
                return Err(GeoError::UnknownSummaryLevel {
                    level: level.to_string(),
                });
            }
        }
        if seen.insert((child_level, parent.clone())) {
            requests.push((child_level, parent));
        }
    }

    log::debug!(
        "expand: release={} shorthand={} explicit={} malformed={}",
        release.slug,
        requests.len(),
        explicit.len(),
        malformed.len()
    );

    let mut result = ExpansionResult::default();

    for (child_level, parent) in requests {
        for child in resolve_children(store, release, &parent, child_level).await? {
            result.valid_geoids.insert(child.geoid.clone());
            result.child_parent_map.insert(child.geoid, parent.clone());
        }
    }

    let explicit: Vec<Geoid> = explicit.into_iter().collect();
    let confirmed = if explicit.is_empty() {
        BTreeSet::new()
    } else {
        store.existing_geoids(release, &explicit).await?
    };
    result.valid_geoids.extend(confirmed);

    let invalid: BTreeSet<String> = explicit
        .iter()
        .filter(|g| !result.valid_geoids.contains(*g))
        .map(ToString::to_string)
        .chain(malformed)
        .collect();

    if !invalid.is_empty() {
        return Err(GeoidExpansionError {
            release: release.slug.clone(),
            release_name: releases().display_name(&release.slug).to_string(),
            geoids: invalid.into_iter().collect(),
        }
        .into());
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::StoreQuery;
    use crate::test_fixtures::{fixture_store, geoid};

    const RELEASE: &str = "acs2021_5yr";

    #[test]
    fn splits_shorthand() {
        assert_eq!(
            parse_shorthand("140|05000US26163"),
            Some(Shorthand {
                child_level: "140",
                parent: "05000US26163",
            })
        );
        assert_eq!(parse_shorthand("04000US26"), None);
        assert_eq!(parse_shorthand("14|05000US26163"), None);
        assert_eq!(parse_shorthand("1400|05000US26163"), None);
        assert_eq!(parse_shorthand("140|050|00US26163"), None);
    }

    #[tokio::test]
    async fn confirms_explicit_geoids() {
        let store = fixture_store();
        let result = expand(&store, &["04000US26", "05000us26163"], RELEASE)
            .await
            .unwrap();

        assert_eq!(
            result.valid_geoids,
            [geoid("04000US26"), geoid("05000US26163")].into_iter().collect()
        );
        assert!(result.child_parent_map.is_empty());
        assert_eq!(
            store.recorded_queries().await,
            vec![StoreQuery::ExistingGeoids]
        );
    }

    #[tokio::test]
    async fn expansion_is_deterministic() {
        let store = fixture_store();
        let tokens = ["160|31000US19820", "04000US26", "140|06000US2616322000"];

        let first = expand(&store, &tokens, RELEASE).await.unwrap();
        let second = expand(&store, &tokens, RELEASE).await.unwrap();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn repeated_explicit_geoid_is_idempotent() {
        let store = fixture_store();
        let once = expand(&store, &["05000US26163"], RELEASE).await.unwrap();
        let twice = expand(&store, &["05000US26163", "05000US26163"], RELEASE)
            .await
            .unwrap();

        assert_eq!(once, twice);
    }

    #[tokio::test]
    async fn reports_missing_geoid() {
        let store = fixture_store();
        let err = expand(&store, &["99999US00000"], RELEASE).await.unwrap_err();

        let GeoError::Expansion(err) = err else {
            panic!("expected an expansion error, got {err:?}");
        };
        assert_eq!(err.release, RELEASE);
        assert_eq!(err.geoids, vec!["99999US00000".to_string()]);
        assert_eq!(
            err.to_string(),
            "The ACS 2021 5-year release doesn't include GeoID(s) 99999US00000."
        );
    }

    #[tokio::test]
    async fn reports_every_offender_sorted() {
        let store = fixture_store();
        let err = expand(
            &store,
            &["99999US00000", "04000US26", "nonsense", "04000US99"],
            RELEASE,
        )
        .await
        .unwrap_err();

        let GeoError::Expansion(err) = err else {
            panic!("expected an expansion error, got {err:?}");
        };
        assert_eq!(err.geoids, vec!["04000US99", "99999US00000", "NONSENSE"]);
    }

    #[tokio::test]
    async fn malformed_shorthand_falls_through_to_explicit() {
        let store = fixture_store();
        let err = expand(&store, &["14|05000US26163"], RELEASE).await.unwrap_err();

        let GeoError::Expansion(err) = err else {
            panic!("expected an expansion error, got {err:?}");
        };
        assert_eq!(err.geoids, vec!["14|05000US26163"]);
    }

    #[tokio::test]
    async fn expands_tracts_in_county_subdivision() {
        let store = fixture_store();
        let result = expand(&store, &["140|06000US2616322000"], RELEASE)
            .await
            .unwrap();

        assert!(!result.valid_geoids.is_empty());
        assert!(result.valid_geoids.len() < 500);
        for tract in &result.valid_geoids {
            assert_eq!(tract.summary_level(), "140");
            assert!(
                tract.short_id().starts_with("26163"),
                "{tract} is outside Wayne County"
            );
            assert_eq!(result.child_parent_map[tract], "06000US2616322000");
        }
    }

    #[tokio::test]
    async fn unions_shorthand_and_explicit() {
        let store = fixture_store();
        let result = expand(&store, &["050|04000US26", "05000US26163", "04000US06"], RELEASE)
            .await
            .unwrap();

        assert_eq!(
            result.valid_geoids,
            [
                geoid("04000US06"),
                geoid("05000US26125"),
                geoid("05000US26163"),
            ]
            .into_iter()
            .collect()
        );
        assert_eq!(result.child_parent_map.len(), 2);
        assert_eq!(result.child_parent_map[&geoid("05000US26125")], "04000US26");
    }

    #[tokio::test]
    async fn nation_shorthand_enumerates_states() {
        let store = fixture_store();
        let result = expand(&store, &["040|01000US"], RELEASE).await.unwrap();

        assert_eq!(result.valid_geoids.len(), 3);
        assert!(!result.valid_geoids.contains(&geoid("04000US72")));
    }

    #[tokio::test]
    async fn unknown_shorthand_level_fails_before_querying() {
        let store = fixture_store();
        let err = expand(&store, &["999|04000US26"], RELEASE).await.unwrap_err();

        assert!(matches!(err, GeoError::UnknownSummaryLevel { ref level } if level == "999"));
        assert!(store.recorded_queries().await.is_empty());
    }

    #[tokio::test]
    async fn unknown_parent_level_fails_before_querying() {
        let store = fixture_store();
        let err = expand(&store, &["04000US26", "140|99900US1"], RELEASE)
            .await
            .unwrap_err();

        assert!(matches!(err, GeoError::UnknownSummaryLevel { ref level } if level == "999"));
        assert!(store.recorded_queries().await.is_empty());
    }

    #[tokio::test]
    async fn wildcard_shorthand_parent_is_rejected() {
        let store = fixture_store();
        for token in ["140|04000US%", "140|04000US_", "140|0%"] {
            let err = expand(&store, &[token], RELEASE).await.unwrap_err();
            assert!(matches!(err, GeoError::Format(_)), "{token}: {err:?}");
        }
        assert!(store.recorded_queries().await.is_empty());
    }

    #[tokio::test]
    async fn repeated_shorthand_is_resolved_once() {
        let store = fixture_store();
        let once = expand(&store, &["160|31000US19820"], RELEASE).await.unwrap();
        let queries_once = store.recorded_queries().await.len();

        let store = fixture_store();
        let repeated = expand(
            &store,
            &["160|31000US19820", "160|31000us19820", "160|31000US19820"],
            RELEASE,
        )
        .await
        .unwrap();

        assert_eq!(once, repeated);
        assert_eq!(store.recorded_queries().await.len(), queries_once);
        assert_eq!(
            store.recorded_queries().await,
            vec![StoreQuery::CoveredGeographies]
        );
    }

    #[tokio::test]
    async fn unknown_release_fails() {
        let store = fixture_store();
        let err = expand(&store, &["04000US26"], "acs1999_1yr").await.unwrap_err();

        assert!(matches!(err, GeoError::UnknownRelease { .. }));
        assert!(err.is_client_error());
    }

    #[tokio::test]
    async fn empty_tokens_expand_to_nothing() {
        let store = fixture_store();
        let result = expand::<&str>(&store, &[], RELEASE).await.unwrap();

        assert_eq!(result, ExpansionResult::default());
        assert!(store.recorded_queries().await.is_empty());
    }
}
