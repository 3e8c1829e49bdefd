#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Database connection setup for the census geography resolver.
//!
//! Connects to the census `PostGIS` database through
//! `switchy_database_connection`. The resolver itself only reads, so there
//! are no migrations here.

pub mod db;

pub use db::{DatabaseConfig, connect, connect_from_env};

/// Errors that can occur while connecting to the database.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// Database query error.
    #[error("Database error: {0}")]
    Database(#[from] switchy_database::DatabaseError),

    /// The connection URL could not be parsed.
    #[error("Invalid database URL: {message}")]
    Credentials {
        /// Description of what went wrong.
        message: String,
    },

    /// The connection could not be established.
    #[error("Failed to connect to the database: {message}")]
    Connection {
        /// Description of what went wrong.
        message: String,
    },

    /// A configuration value is malformed.
    #[error("Invalid {name}: {message}")]
    Config {
        /// Environment variable name.
        name: &'static str,
        /// Description of what went wrong.
        message: String,
    },
}
