#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for inspecting farms and running boundary detection.
//!
//! The interactive map UI is the primary consumer of the boundary
//! subsystem; this binary covers the operational edges — initializing the
//! farms `DuckDB`, dumping a farm's fields with their computed areas and
//! colors, and exercising the outline-detection service for a bounding
//! region.

use clap::{Parser, Subcommand};
use farm_map_database::fields_db;
use farm_map_detect::{DetectError, outline, service_registry};
use farm_map_farm_models::{BoundingRegion, DetectionOptions, Sensitivity};
use farm_map_geometry::{to_acres_rounded, to_hectares, to_hectares_rounded};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "farm_map_cli", about = "Farm boundary management tool")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the farms database and schema at the default path
    InitDb,
    /// Show a farm's boundary and fields with computed areas and colors
    Show {
        /// Farm UUID
        farm_id: String,
    },
    /// Request field outlines from the detection service for a bounding region
    Detect {
        /// Northern latitude limit in decimal degrees
        #[arg(long, allow_hyphen_values = true)]
        north: f64,
        /// Southern latitude limit in decimal degrees
        #[arg(long, allow_hyphen_values = true)]
        south: f64,
        /// Eastern longitude limit in decimal degrees
        #[arg(long, allow_hyphen_values = true)]
        east: f64,
        /// Western longitude limit in decimal degrees
        #[arg(long, allow_hyphen_values = true)]
        west: f64,
        /// Detection sensitivity: low, medium, or high
        #[arg(long, default_value = "medium")]
        sensitivity: String,
        /// Override the configured detection service base URL
        #[arg(long)]
        base_url: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::InitDb => {
            let path = farm_map_database::paths::farms_db_path();
            fields_db::open(&path)?;
            println!("Farms database ready at {}", path.display());
        }
        Commands::Show { farm_id } => {
            show_farm(&farm_id)?;
        }
        Commands::Detect {
            north,
            south,
            east,
            west,
            sensitivity,
            base_url,
        } => {
            let region = BoundingRegion {
                north,
                south,
                east,
                west,
            };
            run_detection(&region, &sensitivity, base_url).await?;
        }
    }

    Ok(())
}

fn show_farm(farm_id: &str) -> Result<(), Box<dyn std::error::Error>> {
    let id = Uuid::parse_str(farm_id)?;
    let conn = fields_db::open_default()?;

    let Some(farm) = fields_db::load_farm(&conn, id)? else {
        println!("No farm with id {id}");
        return Ok(());
    };

    println!("Farm: {} ({})", farm.name, farm.id);
    match farm.area_sq_m {
        Some(area) => println!(
            "  boundary: {} ha ({} acres)",
            to_hectares_rounded(area),
            to_acres_rounded(area)
        ),
        None => println!("  boundary: not drawn"),
    }

    let fields = fields_db::load_fields(&conn, id)?;
    println!("  fields: {}", fields.len());
    for field in fields {
        let area = field.area_sq_m.map_or_else(
            || "no boundary".to_string(),
            |a| {
                format!(
                    "{} ha ({} acres)",
                    to_hectares_rounded(a),
                    to_acres_rounded(a)
                )
            },
        );
        println!("    {} [{}] — {}", field.name, field.color, area);
    }

    Ok(())
}

async fn run_detection(
    region: &BoundingRegion,
    sensitivity: &str,
    base_url: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let sensitivity: Sensitivity = sensitivity.parse()?;
    let options = DetectionOptions {
        sensitivity,
        ..DetectionOptions::default()
    };

    let mut service =
        service_registry::enabled_service().ok_or("no detection service is enabled")?;
    if let Some(url) = base_url {
        service.base_url = url;
    }

    let client = reqwest::Client::new();
    match outline::detect(&client, &service, region, &options).await {
        Ok(candidates) => {
            println!("{} candidate field(s):", candidates.len());
            for (i, candidate) in candidates.iter().enumerate() {
                println!(
                    "  #{num}: {vertices} vertices, {ha:.2} ha, confidence {conf:.2}",
                    num = i + 1,
                    vertices = candidate.boundary.len(),
                    ha = to_hectares(candidate.area_sq_m),
                    conf = candidate.confidence,
                );
            }
        }
        Err(DetectError::Unavailable { message }) => {
            log::warn!("detection unavailable: {message}");
            println!("Detection service unavailable ({message}).");
            println!("Field boundaries can still be drawn manually.");
        }
        Err(err) => return Err(err.into()),
    }

    Ok(())
}
