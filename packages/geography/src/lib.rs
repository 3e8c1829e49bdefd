#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Census geography hierarchy resolution.
//!
//! Answers two questions about the census geography hierarchy:
//!
//! 1. **What is inside X?** [`expand::expand`] turns a mix of explicit
//!    geoids and `child_level|parent_geoid` shorthand into a validated set
//!    of geoids, resolving each shorthand through [`children`].
//! 2. **What is above X?** [`parents::resolve_parents`] builds the ordered
//!    ancestor chain of a geoid.
//!
//! Containment comes from three sources: the geoid numbering scheme
//! itself, the curated tables in `census_geo_geography_models`, and
//! spatial overlap percentages computed from TIGER polygons. The
//! [`strategy`] module picks the right one per summary level pair.
//!
//! All data access goes through the [`store::GeographyStore`] trait.
//! [`queries::SqlGeographyStore`] runs against `PostGIS` through
//! `switchy_database`; [`memory::InMemoryGeographyStore`] serves fixtures.

pub mod children;
pub mod expand;
pub mod memory;
pub mod parents;
pub mod queries;
pub mod store;
pub mod strategy;

#[cfg(test)]
pub(crate) mod test_fixtures;

use census_geo_geography_models::{GeoidExpansionError, GeoidFormatError};
use thiserror::Error;

pub use children::resolve_children;
pub use expand::expand;
pub use parents::{annotate_parents, resolve_parents};
pub use store::GeographyStore;
pub use strategy::select_strategy;

/// Errors that can occur during geography resolution.
#[derive(Debug, Error)]
pub enum GeoError {
    /// Database operation failed. Never retried here.
    #[error("Database error: {0}")]
    Database(#[from] switchy_database::DatabaseError),

    /// A geoid was malformed.
    #[error(transparent)]
    Format(#[from] GeoidFormatError),

    /// Requested geoids do not exist in the release.
    #[error(transparent)]
    Expansion(#[from] GeoidExpansionError),

    /// A summary level code or alias is not registered.
    #[error("Unknown summary level: {level}")]
    UnknownSummaryLevel {
        /// The requested level.
        level: String,
    },

    /// A release slug is not registered.
    #[error("Unknown release: {release}")]
    UnknownRelease {
        /// The requested release.
        release: String,
    },

    /// A database row could not be decoded.
    #[error("Conversion error: {message}")]
    Conversion {
        /// Description of what went wrong.
        message: String,
    },
}

impl GeoError {
    /// Whether the error is caused by caller input rather than the
    /// backing store.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Format(_)
                | Self::Expansion(_)
                | Self::UnknownSummaryLevel { .. }
                | Self::UnknownRelease { .. }
        )
    }
}
