#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the incident map client tools.
//!
//! Drives the reconciliation engine against a live backend: list and
//! filter incidents the way the map view would, submit reports, register
//! subscriptions, and exercise the geocoder.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use incident_map_client::BackendClient;
use incident_map_client_models::SubscribeRequest;
use incident_map_geocoder::{Geocoder, NominatimClient};
use incident_map_incident_models::Country;
use incident_map_map::{FilterConfig, FilterStatus, InMemorySurface, MapSession, ReportDraft};

#[derive(Parser)]
#[command(name = "incident_map_cli", about = "Incident map client tools")]
struct Cli {
    /// Backend base URL
    #[arg(
        long,
        env = "INCIDENT_MAP_BASE_URL",
        default_value = "http://127.0.0.1:8000"
    )]
    base_url: String,

    /// CSRF token attached to mutating requests
    #[arg(long, env = "INCIDENT_MAP_CSRF_TOKEN")]
    csrf_token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load incidents, place markers, and print the visible set
    Incidents {
        /// Status filter: `all`, `verified`, `unverified`, `recent`,
        /// `week`, `month`, or `3months`
        #[arg(long, default_value = "all")]
        status: String,
        /// Country filter (e.g. "Sudan")
        #[arg(long)]
        country: Option<String>,
    },
    /// Submit an incident report
    Report {
        /// When the incident occurred (e.g. `2024-05-01T12:00`)
        #[arg(long)]
        date_time: String,
        /// Latitude, if known
        #[arg(long)]
        lat: Option<f64>,
        /// Longitude, if known
        #[arg(long)]
        lng: Option<f64>,
        /// What happened
        #[arg(long)]
        description: String,
        /// Source URL backing the report
        #[arg(long)]
        source: Option<String>,
        /// Free-text address, geocoded when no coordinates are given
        #[arg(long)]
        address: Option<String>,
        /// Country classification (e.g. "Sudan")
        #[arg(long)]
        country: Option<String>,
        /// Path to a file containing a `data:image/...;base64,` payload
        #[arg(long)]
        image: Option<PathBuf>,
    },
    /// Register an email subscription for incident alerts
    Subscribe {
        /// Subscriber name
        #[arg(long)]
        name: String,
        /// Subscriber email
        #[arg(long)]
        email: String,
        /// Subscriber address
        #[arg(long)]
        address: String,
        /// Latitude of the address, if known
        #[arg(long)]
        lat: Option<f64>,
        /// Longitude of the address, if known
        #[arg(long)]
        lng: Option<f64>,
    },
    /// Forward-geocode a free-text query
    Search {
        /// The query text
        query: String,
    },
    /// Reverse-geocode a coordinate
    Reverse {
        /// Latitude
        lat: f64,
        /// Longitude
        lng: f64,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    let cli = Cli::parse();
    log::debug!("Using backend at {}", cli.base_url);

    let http = reqwest::Client::builder()
        .user_agent(concat!("incident-map/", env!("CARGO_PKG_VERSION")))
        .build()?;

    let mut backend = BackendClient::new(http.clone(), &cli.base_url);
    if let Some(token) = &cli.csrf_token {
        backend = backend.with_csrf_token(token);
    }
    let backend: Arc<dyn incident_map_client::IncidentApi> = Arc::new(backend);
    let geocoder: Arc<dyn Geocoder> = Arc::new(NominatimClient::new(http));

    match cli.command {
        Commands::Incidents { status, country } => {
            let status: FilterStatus = status
                .parse()
                .map_err(|_| format!("unknown filter status '{status}'"))?;
            let country = parse_country(country)?;

            let mut session =
                MapSession::new(backend, geocoder, InMemorySurface::new());
            session.load().await?;
            session.set_filter(FilterConfig {
                status,
                country,
                radius: None,
            });

            println!(
                "{} incidents loaded, {} markers visible",
                session.store().len(),
                session.visible_marker_count()
            );
            for marker in session.markers().iter().filter(|m| m.visible) {
                let incident = &session.store().incidents()[marker.incident_idx];
                println!(
                    "  [{}] {} @ {:.6},{:.6} {} - {}",
                    incident.id.map_or_else(|| "-".to_string(), |id| id.to_string()),
                    incident.date_time,
                    marker.display.latitude,
                    marker.display.longitude,
                    if incident.verified { "verified" } else { "unverified" },
                    incident.description,
                );
            }
        }

        Commands::Report {
            date_time,
            lat,
            lng,
            description,
            source,
            address,
            country,
            image,
        } => {
            let image = image
                .map(std::fs::read_to_string)
                .transpose()?
                .map(|payload| payload.trim().to_string());

            let draft = ReportDraft {
                date_time,
                latitude: lat,
                longitude: lng,
                description,
                source,
                address,
                country: parse_country(country)?,
                image,
            };

            let mut session =
                MapSession::new(backend, geocoder, InMemorySurface::new());
            session.submit_report(draft).await?;
            println!(
                "Report submitted; backend now lists {} incidents",
                session.store().len()
            );
        }

        Commands::Subscribe {
            name,
            email,
            address,
            lat,
            lng,
        } => {
            let session = MapSession::new(backend, geocoder, InMemorySurface::new());
            session
                .subscribe(&SubscribeRequest {
                    name,
                    email,
                    address,
                    latitude: lat,
                    longitude: lng,
                })
                .await?;
            println!("Subscription registered");
        }

        Commands::Search { query } => {
            let places = geocoder.search(&query).await?;
            if places.is_empty() {
                println!("No matches");
            }
            for place in places {
                println!(
                    "  {:.6},{:.6}  {}",
                    place.latitude,
                    place.longitude,
                    place.display_name.as_deref().unwrap_or("(unnamed)"),
                );
            }
        }

        Commands::Reverse { lat, lng } => {
            match geocoder.reverse(lat, lng).await? {
                Some(place) => println!(
                    "{} (country: {})",
                    place.display_name.as_deref().unwrap_or("(unnamed)"),
                    place.country.as_deref().unwrap_or("unknown"),
                ),
                None => println!("No place found at {lat},{lng}"),
            }
        }
    }

    Ok(())
}

/// Parses an optional `--country` flag against the [`Country`] enum.
fn parse_country(country: Option<String>) -> Result<Option<Country>, String> {
    country
        .map(|c| {
            c.parse::<Country>()
                .map_err(|_| format!("unknown country '{c}'; expected one of Sudan, Palestine, Ukraine, Other"))
        })
        .transpose()
}
