//! Data access seam for geography resolution.
//!
//! Each method corresponds to one query shape against either a release's
//! canonical geography table (`geoheader`) or the shared TIGER tables
//! (`census_geo_containment`, `census_name_lookup`). Coverage thresholds
//! are always strict: a row qualifies only when `percent_covered` is
//! greater than `min_coverage`.

use std::collections::BTreeSet;

use async_trait::async_trait;
use census_geo_geography_models::{
    ChildGeography, ContainmentEdge, Geoid, GeographyName, Release,
};

use crate::GeoError;

/// Read-only access to the geography database.
///
/// Implementations must be safe to share across concurrent requests and
/// must not retry failed queries.
#[async_trait]
pub trait GeographyStore: Send + Sync {
    /// Returns the whole-area (`component`) geographies at `level`,
    /// skipping any geoid in `exclude`, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns [`GeoError`] if the query fails.
    async fn primary_geographies(
        &self,
        release: &Release,
        level: &str,
        component: &str,
        exclude: &[Geoid],
    ) -> Result<Vec<ChildGeography>, GeoError>;

    /// Returns geographies whose geoid starts with `prefix`, skipping rows
    /// whose name contains `undefined_pattern`, ordered by geoid.
    ///
    /// # Errors
    ///
    /// Returns [`GeoError`] if the query fails.
    async fn geographies_with_prefix(
        &self,
        release: &Release,
        prefix: &str,
        undefined_pattern: &str,
    ) -> Result<Vec<ChildGeography>, GeoError>;

    /// Joins containment edges of `parent` to the release's geography
    /// table, returning children at `child_level` covered by more than
    /// `min_coverage` percent, ordered by name.
    ///
    /// One row is returned per edge, so a child with several edges to the
    /// same parent appears several times.
    ///
    /// # Errors
    ///
    /// Returns [`GeoError`] if the query fails.
    async fn covered_geographies(
        &self,
        release: &Release,
        parent: &Geoid,
        child_level: &str,
        min_coverage: f64,
    ) -> Result<Vec<ChildGeography>, GeoError>;

    /// Returns the geoids of children at `child_level` whose containment
    /// edge with `parent` exceeds `min_coverage` percent.
    ///
    /// # Errors
    ///
    /// Returns [`GeoError`] if the query fails.
    async fn covered_child_geoids(
        &self,
        parent: &Geoid,
        child_level: &str,
        min_coverage: f64,
    ) -> Result<Vec<Geoid>, GeoError>;

    /// Returns the release's rows for `geoids`, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns [`GeoError`] if the query fails.
    async fn geographies_by_geoid(
        &self,
        release: &Release,
        geoids: &[Geoid],
    ) -> Result<Vec<ChildGeography>, GeoError>;

    /// Returns the subset of `geoids` present in the release.
    ///
    /// # Errors
    ///
    /// Returns [`GeoError`] if the query fails.
    async fn existing_geoids(
        &self,
        release: &Release,
        geoids: &[Geoid],
    ) -> Result<BTreeSet<Geoid>, GeoError>;

    /// Returns every containment edge with `child` as the child and more
    /// than `min_coverage` percent coverage, ordered by ascending coverage.
    ///
    /// # Errors
    ///
    /// Returns [`GeoError`] if the query fails.
    async fn parent_edges(
        &self,
        child: &Geoid,
        min_coverage: f64,
    ) -> Result<Vec<ContainmentEdge>, GeoError>;

    /// Returns display metadata for `geoids` from the name lookup.
    /// Geoids without a row are omitted.
    ///
    /// # Errors
    ///
    /// Returns [`GeoError`] if the query fails.
    async fn geography_names(&self, geoids: &[Geoid]) -> Result<Vec<GeographyName>, GeoError>;
}
