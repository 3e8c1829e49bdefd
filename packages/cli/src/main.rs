#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for census geography expansion and parent chains.
//!
//! Every subcommand that touches the database connects through
//! `DATABASE_URL` and prints its result as JSON on stdout.

use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use census_geo_database::db;
use census_geo_geography::queries::SqlGeographyStore;
use census_geo_geography::{
    GeoError, annotate_parents, expand, resolve_children, resolve_parents,
};
use census_geo_geography_models::{Geoid, releases, summary_levels};

#[derive(Parser)]
#[command(name = "census_geo", about = "Census geography hierarchy resolver")]
struct Cli {
    /// Give up on the operation after this many seconds
    #[arg(long, global = true, default_value = "120")]
    timeout_secs: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Expand geoids and `level|parent` shorthand into validated geoids
    Expand {
        /// Release slug (e.g. "`acs2021_5yr`"), or "latest"
        #[arg(long, default_value = "latest")]
        release: String,
        /// Geoids or shorthand tokens. Comma-separated lists are accepted.
        #[arg(required = true)]
        tokens: Vec<String>,
    },
    /// List the geographies at one summary level inside a parent
    Children {
        /// Release slug (e.g. "`acs2021_5yr`"), or "latest"
        #[arg(long, default_value = "latest")]
        release: String,
        /// Parent geoid (e.g. "05000US26163")
        parent: String,
        /// Child summary level code or name (e.g. "140", "tract", "census tracts")
        level: String,
    },
    /// Show the parent chain of a geoid
    Parents {
        /// Fill in display names from the name lookup
        #[arg(long)]
        names: bool,
        /// Geoid (e.g. "14000US26163511400")
        geoid: String,
    },
    /// List registered summary levels
    Levels,
    /// List registered releases
    Releases,
}

/// Splits comma-separated arguments into individual tokens.
fn split_tokens(args: &[String]) -> Vec<String> {
    args.iter()
        .flat_map(|arg| arg.split(','))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

async fn store_from_env() -> Result<SqlGeographyStore, Box<dyn std::error::Error>> {
    let db = db::connect_from_env().await?;
    Ok(SqlGeographyStore::new(Arc::from(db)))
}

async fn run(command: Commands) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Expand { release, tokens } => {
            let tokens = split_tokens(&tokens);
            log::info!("Expanding {} token(s) against {release}", tokens.len());
            let store = store_from_env().await?;
            let result = expand(&store, tokens.as_slice(), &release).await?;
            log::info!("Expanded to {} geoid(s)", result.valid_geoids.len());
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Commands::Children {
            release,
            parent,
            level,
        } => {
            let release = releases()
                .resolve(&release)
                .ok_or(GeoError::UnknownRelease { release })?;
            let level = summary_levels()
                .resolve(&level)
                .ok_or(GeoError::UnknownSummaryLevel { level })?;
            let parent = Geoid::parse(&parent).map_err(GeoError::from)?;

            let store = store_from_env().await?;
            let children = resolve_children(&store, release, &parent, &level.code).await?;
            log::info!(
                "Found {} {} in {parent}",
                children.len(),
                summary_levels().plural_of(&level.code).unwrap_or(&level.code)
            );
            println!("{}", serde_json::to_string_pretty(&children)?);
        }
        Commands::Parents { names, geoid } => {
            let store = store_from_env().await?;
            let mut chain = resolve_parents(&store, &geoid).await?;
            if names {
                annotate_parents(&store, &mut chain).await?;
            }
            println!("{}", serde_json::to_string_pretty(&chain)?);
        }
        Commands::Levels => {
            println!("{:<6} {:<36} PLURAL", "CODE", "NAME");
            println!("{}", "-".repeat(80));
            for level in summary_levels().levels() {
                println!("{:<6} {:<36} {}", level.code, level.name, level.plural);
            }
        }
        Commands::Releases => {
            let latest = &releases().latest_expansion().slug;
            println!("{:<16} {:<24} YEARS", "SLUG", "NAME");
            println!("{}", "-".repeat(60));
            for release in releases().releases() {
                let marker = if &release.slug == latest { " (latest)" } else { "" };
                println!(
                    "{:<16} {:<24} {}{marker}",
                    release.slug, release.name, release.years
                );
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init_custom_env("RUST_LOG");
    let cli = Cli::parse();

    let deadline = Duration::from_secs(cli.timeout_secs);
    let Ok(result) = tokio::time::timeout(deadline, run(cli.command)).await else {
        log::error!("Timed out after {}s", cli.timeout_secs);
        std::process::exit(124);
    };

    if let Err(e) = result {
        if e.downcast_ref::<GeoError>()
            .is_some_and(GeoError::is_client_error)
        {
            eprintln!("{e}");
            std::process::exit(2);
        }
        return Err(e);
    }

    Ok(())
}
