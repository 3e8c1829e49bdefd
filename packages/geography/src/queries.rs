//! `PostGIS`-backed [`GeographyStore`].
//!
//! Queries run through `switchy_database`'s `query_raw_params()` with `$n`
//! placeholders. Every table is schema-qualified with the release slug or
//! the TIGER schema rather than relying on a connection-level
//! `search_path`, so a pooled connection never carries one request's
//! release into another. Both names come from the validated release
//! registry and are safe to interpolate.

use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::sync::Arc;

use async_trait::async_trait;
use census_geo_geography_models::{
    ChildGeography, ContainmentEdge, Geoid, GeographyName, Release, releases,
};
use moosicbox_json_utils::database::ToValue as _;
use switchy_database::{Database, DatabaseValue, Row};

use crate::GeoError;
use crate::store::GeographyStore;

/// Geography store backed by the census `PostGIS` database.
#[derive(Clone)]
pub struct SqlGeographyStore {
    db: Arc<dyn Database>,
    tiger_schema: String,
}

impl std::fmt::Debug for SqlGeographyStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqlGeographyStore")
            .field("tiger_schema", &self.tiger_schema)
            .finish_non_exhaustive()
    }
}

impl SqlGeographyStore {
    /// Wraps a database connection, reading containment edges and names
    /// from the registry's TIGER schema.
    #[must_use]
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self {
            db,
            tiger_schema: releases().tiger_schema().to_string(),
        }
    }

    async fn query_children(
        &self,
        sql: &str,
        params: &[DatabaseValue],
    ) -> Result<Vec<ChildGeography>, GeoError> {
        log::trace!("geography query: {sql}");
        let rows = self.db.query_raw_params(sql, params).await?;
        rows.iter().map(child_from_row).collect()
    }
}

/// Returns `"$start, $start+1, ..."` for `count` parameters.
fn placeholders(start: usize, count: usize) -> String {
    let mut out = String::new();
    for idx in start..start + count {
        if idx > start {
            out.push_str(", ");
        }
        write!(out, "${idx}").unwrap();
    }
    out
}

fn geoid_params(geoids: &[Geoid]) -> Vec<DatabaseValue> {
    geoids
        .iter()
        .map(|g| DatabaseValue::String(g.to_string()))
        .collect()
}

fn read_string(row: &Row, column: &str) -> Result<String, GeoError> {
    row.to_value(column).map_err(|e| GeoError::Conversion {
        message: format!("Failed to read {column}: {e}"),
    })
}

fn parse_geoid(row: &Row, column: &str) -> Result<Geoid, GeoError> {
    Ok(Geoid::parse(&read_string(row, column)?)?)
}

fn child_from_row(row: &Row) -> Result<ChildGeography, GeoError> {
    Ok(ChildGeography {
        geoid: parse_geoid(row, "geoid")?,
        name: read_string(row, "name")?,
    })
}

fn edge_from_row(row: &Row) -> Result<ContainmentEdge, GeoError> {
    Ok(ContainmentEdge {
        parent_geoid: read_string(row, "parent_geoid")?,
        child_geoid: parse_geoid(row, "child_geoid")?,
        percent_covered: row
            .to_value("percent_covered")
            .map_err(|e| GeoError::Conversion {
                message: format!("Failed to read percent_covered: {e}"),
            })?,
    })
}

fn level_param(level: &str) -> Result<DatabaseValue, GeoError> {
    level
        .parse::<i32>()
        .map(DatabaseValue::Int32)
        .map_err(|e| GeoError::Conversion {
            message: format!("Summary level '{level}' is not numeric: {e}"),
        })
}

#[async_trait]
impl GeographyStore for SqlGeographyStore {
    async fn primary_geographies(
        &self,
        release: &Release,
        level: &str,
        component: &str,
        exclude: &[Geoid],
    ) -> Result<Vec<ChildGeography>, GeoError> {
        let mut sql = format!(
            "SELECT geoid, name
             FROM {schema}.geoheader
             WHERE sumlevel = $1 AND component = $2",
            schema = release.slug,
        );
        let mut params = vec![level_param(level)?, DatabaseValue::String(component.to_string())];

        if !exclude.is_empty() {
            write!(sql, " AND geoid NOT IN ({})", placeholders(3, exclude.len())).unwrap();
            params.extend(geoid_params(exclude));
        }
        sql.push_str(" ORDER BY name");

        self.query_children(&sql, &params).await
    }

    async fn geographies_with_prefix(
        &self,
        release: &Release,
        prefix: &str,
        undefined_pattern: &str,
    ) -> Result<Vec<ChildGeography>, GeoError> {
        let sql = format!(
            "SELECT geoid, name
             FROM {schema}.geoheader
             WHERE geoid LIKE $1
               AND name NOT LIKE $2
             ORDER BY geoid",
            schema = release.slug,
        );

        self.query_children(
            &sql,
            &[
                DatabaseValue::String(format!("{prefix}%")),
                DatabaseValue::String(format!("%{undefined_pattern}%")),
            ],
        )
        .await
    }

    async fn covered_geographies(
        &self,
        release: &Release,
        parent: &Geoid,
        child_level: &str,
        min_coverage: f64,
    ) -> Result<Vec<ChildGeography>, GeoError> {
        let sql = format!(
            "SELECT g.geoid, g.name
             FROM {tiger}.census_geo_containment c
             JOIN {schema}.geoheader g ON g.geoid = c.child_geoid
             WHERE c.parent_geoid = $1
               AND c.child_geoid LIKE $2
               AND c.percent_covered > $3
             ORDER BY g.name",
            tiger = self.tiger_schema,
            schema = release.slug,
        );

        self.query_children(
            &sql,
            &[
                DatabaseValue::String(parent.to_string()),
                DatabaseValue::String(format!("{child_level}%")),
                DatabaseValue::Real64(min_coverage),
            ],
        )
        .await
    }

    async fn covered_child_geoids(
        &self,
        parent: &Geoid,
        child_level: &str,
        min_coverage: f64,
    ) -> Result<Vec<Geoid>, GeoError> {
        let sql = format!(
            "SELECT child_geoid
             FROM {tiger}.census_geo_containment
             WHERE parent_geoid = $1
               AND child_geoid LIKE $2
               AND percent_covered > $3",
            tiger = self.tiger_schema,
        );

        let rows = self
            .db
            .query_raw_params(
                &sql,
                &[
                    DatabaseValue::String(parent.to_string()),
                    DatabaseValue::String(format!("{child_level}%")),
                    DatabaseValue::Real64(min_coverage),
                ],
            )
            .await?;

        rows.iter()
            .map(|row| parse_geoid(row, "child_geoid"))
            .collect()
    }

    async fn geographies_by_geoid(
        &self,
        release: &Release,
        geoids: &[Geoid],
    ) -> Result<Vec<ChildGeography>, GeoError> {
        if geoids.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!(
            "SELECT geoid, name
             FROM {schema}.geoheader
             WHERE geoid IN ({list})
             ORDER BY name",
            schema = release.slug,
            list = placeholders(1, geoids.len()),
        );

        self.query_children(&sql, &geoid_params(geoids)).await
    }

    async fn existing_geoids(
        &self,
        release: &Release,
        geoids: &[Geoid],
    ) -> Result<BTreeSet<Geoid>, GeoError> {
        if geoids.is_empty() {
            return Ok(BTreeSet::new());
        }

        let sql = format!(
            "SELECT geoid
             FROM {schema}.geoheader
             WHERE geoid IN ({list})",
            schema = release.slug,
            list = placeholders(1, geoids.len()),
        );

        let rows = self.db.query_raw_params(&sql, &geoid_params(geoids)).await?;

        rows.iter().map(|row| parse_geoid(row, "geoid")).collect()
    }

    async fn parent_edges(
        &self,
        child: &Geoid,
        min_coverage: f64,
    ) -> Result<Vec<ContainmentEdge>, GeoError> {
        let sql = format!(
            "SELECT parent_geoid, child_geoid, percent_covered::float8 AS percent_covered
             FROM {tiger}.census_geo_containment
             WHERE child_geoid = $1
               AND percent_covered > $2
             ORDER BY percent_covered ASC",
            tiger = self.tiger_schema,
        );

        let rows = self
            .db
            .query_raw_params(
                &sql,
                &[
                    DatabaseValue::String(child.to_string()),
                    DatabaseValue::Real64(min_coverage),
                ],
            )
            .await?;

        rows.iter().map(edge_from_row).collect()
    }

    async fn geography_names(&self, geoids: &[Geoid]) -> Result<Vec<GeographyName>, GeoError> {
        if geoids.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!(
            "SELECT full_geoid, display_name, LPAD(sumlevel::text, 3, '0') AS sumlevel
             FROM {tiger}.census_name_lookup
             WHERE full_geoid IN ({list})
             ORDER BY 3 DESC",
            tiger = self.tiger_schema,
            list = placeholders(1, geoids.len()),
        );

        let rows = self.db.query_raw_params(&sql, &geoid_params(geoids)).await?;

        rows.iter()
            .map(|row| {
                Ok(GeographyName {
                    geoid: parse_geoid(row, "full_geoid")?,
                    display_name: read_string(row, "display_name")?,
                    summary_level: read_string(row, "sumlevel")?,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_placeholder_lists() {
        assert_eq!(placeholders(1, 3), "$1, $2, $3");
        assert_eq!(placeholders(3, 2), "$3, $4");
        assert_eq!(placeholders(1, 0), "");
    }

    fn row(columns: &[(&str, DatabaseValue)]) -> Row {
        Row {
            columns: columns
                .iter()
                .map(|(name, value)| ((*name).to_string(), value.clone()))
                .collect(),
        }
    }

    #[test]
    fn decodes_parent_edges() {
        let edge = edge_from_row(&row(&[
            ("parent_geoid", DatabaseValue::String("16000US2622000".to_string())),
            ("child_geoid", DatabaseValue::String("14000US26163511400".to_string())),
            ("percent_covered", DatabaseValue::Real64(87.5)),
        ]))
        .unwrap();

        assert_eq!(edge.parent_geoid, "16000US2622000");
        assert_eq!(edge.child_geoid, "14000US26163511400");
        assert!((edge.percent_covered - 87.5).abs() < f64::EPSILON);
    }

    #[test]
    fn edge_without_coverage_is_an_error() {
        let err = edge_from_row(&row(&[
            ("parent_geoid", DatabaseValue::String("16000US2622000".to_string())),
            ("child_geoid", DatabaseValue::String("14000US26163511400".to_string())),
        ]))
        .unwrap_err();

        assert!(matches!(err, GeoError::Conversion { .. }), "{err:?}");
    }

    #[test]
    fn child_without_name_is_an_error() {
        let err = child_from_row(&row(&[(
            "geoid",
            DatabaseValue::String("05000US26163".to_string()),
        )]))
        .unwrap_err();

        assert!(matches!(err, GeoError::Conversion { .. }), "{err:?}");
    }

    #[test]
    fn numeric_level_params() {
        assert!(matches!(level_param("040"), Ok(DatabaseValue::Int32(40))));
        assert!(level_param("abc").is_err());
    }
}
