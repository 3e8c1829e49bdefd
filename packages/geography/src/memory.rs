//! In-memory [`GeographyStore`] for fixtures and offline use.
//!
//! Mirrors the SQL store's contract: strict coverage thresholds, the same
//! orderings, and one joined row per containment edge. Every call is
//! recorded so callers can check which query shapes were issued.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use census_geo_geography_models::{
    ChildGeography, ContainmentEdge, Geoid, GeographyName, Release,
};
use tokio::sync::Mutex;

use crate::GeoError;
use crate::store::GeographyStore;

/// A query shape served by a [`GeographyStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreQuery {
    /// [`GeographyStore::primary_geographies`]
    PrimaryGeographies,
    /// [`GeographyStore::geographies_with_prefix`]
    GeographiesWithPrefix,
    /// [`GeographyStore::covered_geographies`]
    CoveredGeographies,
    /// [`GeographyStore::covered_child_geoids`]
    CoveredChildGeoids,
    /// [`GeographyStore::geographies_by_geoid`]
    GeographiesByGeoid,
    /// [`GeographyStore::existing_geoids`]
    ExistingGeoids,
    /// [`GeographyStore::parent_edges`]
    ParentEdges,
    /// [`GeographyStore::geography_names`]
    GeographyNames,
}

/// A row of a release's geography table.
#[derive(Debug, Clone, PartialEq, Eq)]
struct GeographyRecord {
    geoid: Geoid,
    name: String,
    component: String,
}

/// Fixture-backed geography store.
#[derive(Debug, Default)]
pub struct InMemoryGeographyStore {
    geographies: BTreeMap<String, Vec<GeographyRecord>>,
    edges: Vec<ContainmentEdge>,
    names: Vec<GeographyName>,
    queries: Mutex<Vec<StoreQuery>>,
}

impl InMemoryGeographyStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a geography to `release`. The component code is read from the
    /// two characters after the summary level (`04001US26` → `01`).
    #[must_use]
    pub fn with_geography(mut self, release: &str, geoid: Geoid, name: &str) -> Self {
        let component = geoid.stem().get(3..5).unwrap_or("00").to_string();
        self.geographies
            .entry(release.to_string())
            .or_default()
            .push(GeographyRecord {
                geoid,
                name: name.to_string(),
                component,
            });
        self
    }

    /// Adds a containment edge. `parent` is stored verbatim so malformed
    /// rows can be represented.
    #[must_use]
    pub fn with_edge(mut self, parent: &str, child: Geoid, percent_covered: f64) -> Self {
        self.edges.push(ContainmentEdge {
            parent_geoid: parent.to_string(),
            child_geoid: child,
            percent_covered,
        });
        self
    }

    /// Adds a name-lookup row.
    #[must_use]
    pub fn with_name(mut self, geoid: Geoid, display_name: &str) -> Self {
        let summary_level = geoid.summary_level().to_string();
        self.names.push(GeographyName {
            geoid,
            display_name: display_name.to_string(),
            summary_level,
        });
        self
    }

    /// Query shapes served so far, in call order.
    pub async fn recorded_queries(&self) -> Vec<StoreQuery> {
        self.queries.lock().await.clone()
    }

    async fn record(&self, query: StoreQuery) {
        self.queries.lock().await.push(query);
    }

    fn rows(&self, release: &Release) -> &[GeographyRecord] {
        self.geographies
            .get(&release.slug)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    fn row(&self, release: &Release, geoid: &Geoid) -> Option<&GeographyRecord> {
        self.rows(release).iter().find(|r| &r.geoid == geoid)
    }

    fn covering_edges<'a>(
        &'a self,
        parent: &'a Geoid,
        child_level: &'a str,
        min_coverage: f64,
    ) -> impl Iterator<Item = &'a ContainmentEdge> + 'a {
        self.edges.iter().filter(move |e| {
            parent == e.parent_geoid.as_str()
                && e.child_geoid.as_str().starts_with(child_level)
                && e.percent_covered > min_coverage
        })
    }
}

fn to_child(record: &GeographyRecord) -> ChildGeography {
    ChildGeography {
        geoid: record.geoid.clone(),
        name: record.name.clone(),
    }
}

fn sorted_by_name(mut children: Vec<ChildGeography>) -> Vec<ChildGeography> {
    children.sort_by(|a, b| a.name.cmp(&b.name));
    children
}

#[async_trait]
impl GeographyStore for InMemoryGeographyStore {
    async fn primary_geographies(
        &self,
        release: &Release,
        level: &str,
        component: &str,
        exclude: &[Geoid],
    ) -> Result<Vec<ChildGeography>, GeoError> {
        self.record(StoreQuery::PrimaryGeographies).await;
        Ok(sorted_by_name(
            self.rows(release)
                .iter()
                .filter(|r| {
                    r.geoid.summary_level() == level
                        && r.component == component
                        && !exclude.contains(&r.geoid)
                })
                .map(to_child)
                .collect(),
        ))
    }

    async fn geographies_with_prefix(
        &self,
        release: &Release,
        prefix: &str,
        undefined_pattern: &str,
    ) -> Result<Vec<ChildGeography>, GeoError> {
        self.record(StoreQuery::GeographiesWithPrefix).await;
        let mut children: Vec<ChildGeography> = self
            .rows(release)
            .iter()
            .filter(|r| r.geoid.as_str().starts_with(prefix) && !r.name.contains(undefined_pattern))
            .map(to_child)
            .collect();
        children.sort_by(|a, b| a.geoid.cmp(&b.geoid));
        Ok(children)
    }

    async fn covered_geographies(
        &self,
        release: &Release,
        parent: &Geoid,
        child_level: &str,
        min_coverage: f64,
    ) -> Result<Vec<ChildGeography>, GeoError> {
        self.record(StoreQuery::CoveredGeographies).await;
        Ok(sorted_by_name(
            self.covering_edges(parent, child_level, min_coverage)
                .filter_map(|e| self.row(release, &e.child_geoid))
                .map(to_child)
                .collect(),
        ))
    }

    async fn covered_child_geoids(
        &self,
        parent: &Geoid,
        child_level: &str,
        min_coverage: f64,
    ) -> Result<Vec<Geoid>, GeoError> {
        self.record(StoreQuery::CoveredChildGeoids).await;
        Ok(self
            .covering_edges(parent, child_level, min_coverage)
            .map(|e| e.child_geoid.clone())
            .collect())
    }

    async fn geographies_by_geoid(
        &self,
        release: &Release,
        geoids: &[Geoid],
    ) -> Result<Vec<ChildGeography>, GeoError> {
        self.record(StoreQuery::GeographiesByGeoid).await;
        Ok(sorted_by_name(
            self.rows(release)
                .iter()
                .filter(|r| geoids.contains(&r.geoid))
                .map(to_child)
                .collect(),
        ))
    }

    async fn existing_geoids(
        &self,
        release: &Release,
        geoids: &[Geoid],
    ) -> Result<BTreeSet<Geoid>, GeoError> {
        self.record(StoreQuery::ExistingGeoids).await;
        Ok(geoids
            .iter()
            .filter(|g| self.row(release, g).is_some())
            .cloned()
            .collect())
    }

    async fn parent_edges(
        &self,
        child: &Geoid,
        min_coverage: f64,
    ) -> Result<Vec<ContainmentEdge>, GeoError> {
        self.record(StoreQuery::ParentEdges).await;
        let mut edges: Vec<ContainmentEdge> = self
            .edges
            .iter()
            .filter(|e| &e.child_geoid == child && e.percent_covered > min_coverage)
            .cloned()
            .collect();
        edges.sort_by(|a, b| a.percent_covered.total_cmp(&b.percent_covered));
        Ok(edges)
    }

    async fn geography_names(&self, geoids: &[Geoid]) -> Result<Vec<GeographyName>, GeoError> {
        self.record(StoreQuery::GeographyNames).await;
        Ok(self
            .names
            .iter()
            .filter(|n| geoids.contains(&n.geoid))
            .cloned()
            .collect())
    }
}
