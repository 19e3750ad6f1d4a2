//! Generate a synthetic listings database.
//!
//! Listings are scattered around a centre point so that radius expansion has
//! dense and sparse regions to work with. The database is created through the
//! library's own schema code.
//!
//! Usage:
//!     cargo run --release --bin generate-listings-db -- [--count N] [output_path]

use anyhow::{Context, Result};
use clap::Parser;
use georank::database::Database;
use georank::models::NewListing;
use georank::scoring::EARTH_RADIUS_KM;
use georank::Domain;
use rand::Rng;
use std::path::PathBuf;

/// Share of listings placed in the dense inner ring.
const DENSE_SHARE: f64 = 0.7;

/// Share of listings stored without a location.
const UNPLACED_SHARE: f64 = 0.05;

const JOB_TITLES: &[&str] = &[
    "Delivery driver",
    "Warehouse picker",
    "Customer support executive",
    "Backend engineer",
    "Accountant",
    "Sales associate",
    "Data entry operator",
    "Security guard",
    "Electrician",
    "Field technician",
];

const LOCAL_JOB_TITLES: &[&str] = &[
    "House cleaner",
    "Cook for family",
    "Driver for school pickup",
    "Shop helper",
    "Tailor",
    "Babysitter",
    "Gardener",
    "Painter",
];

const PRODUCT_NAMES: &[&str] = &[
    "Bicycle",
    "Study table",
    "Refrigerator",
    "Washing machine",
    "Sofa set",
    "Laptop",
    "Office chair",
    "Scooter",
];

const DESCRIPTION_WORDS: &[&str] = &[
    "experienced", "immediate", "joining", "weekend", "shift", "flexible", "hours",
    "good", "condition", "urgent", "nearby", "walk-in", "salary", "negotiable",
    "fresher", "welcome", "two-wheeler", "license", "required", "english", "hindi",
];

const PLACES: &[&str] = &["Indiranagar", "Koramangala", "Whitefield", "Jayanagar", "Hebbal", "Yelahanka"];

#[derive(Parser, Debug)]
#[command(name = "generate-listings-db", about = "Seed a SQLite database with synthetic listings")]
struct Args {
    /// Output database path
    #[arg(default_value = "listings.sqlite")]
    output: PathBuf,

    /// Listings per domain
    #[arg(long, default_value_t = 2_000)]
    count: usize,

    /// Centre latitude
    #[arg(long, default_value_t = 12.9716, allow_negative_numbers = true)]
    lat: f64,

    /// Centre longitude
    #[arg(long, default_value_t = 77.5946, allow_negative_numbers = true)]
    lon: f64,

    /// Radius of the dense inner ring in km
    #[arg(long, default_value_t = 40.0)]
    dense_km: f64,

    /// Outer radius in km; listings beyond the dense ring are spread up to here
    #[arg(long, default_value_t = 400.0)]
    spread_km: f64,

    /// Number of users with a stored location
    #[arg(long, default_value_t = 50)]
    users: i64,
}

/// Point at `distance_km` along `bearing` (radians) from the centre.
fn offset(lat: f64, lon: f64, distance_km: f64, bearing: f64) -> (f64, f64) {
    let delta = distance_km / EARTH_RADIUS_KM;
    let phi1 = lat.to_radians();
    let lambda1 = lon.to_radians();

    let phi2 = (phi1.sin() * delta.cos() + phi1.cos() * delta.sin() * bearing.cos()).asin();
    let lambda2 = lambda1
        + (bearing.sin() * delta.sin() * phi1.cos()).atan2(delta.cos() - phi1.sin() * phi2.sin());

    (phi2.to_degrees(), (lambda2.to_degrees() + 540.0) % 360.0 - 180.0)
}

fn description<R: Rng>(rng: &mut R) -> String {
    let len = rng.gen_range(6..24);
    (0..len)
        .map(|_| DESCRIPTION_WORDS[rng.gen_range(0..DESCRIPTION_WORDS.len())])
        .collect::<Vec<_>>()
        .join(" ")
}

fn generate_listing<R: Rng>(rng: &mut R, args: &Args, domain: Domain, now_ms: i64) -> NewListing {
    let created_at = now_ms - rng.gen_range(0..90 * 24 * 3_600_000i64);
    let owner = rng.gen_range(1..=args.users.max(1));

    let title = match domain {
        Domain::Jobs => JOB_TITLES[rng.gen_range(0..JOB_TITLES.len())],
        Domain::LocalJobs => LOCAL_JOB_TITLES[rng.gen_range(0..LOCAL_JOB_TITLES.len())],
        Domain::UsedProducts => PRODUCT_NAMES[rng.gen_range(0..PRODUCT_NAMES.len())],
    };
    let mut listing = NewListing::new(owner, title, description(rng), created_at);

    if !rng.gen_bool(UNPLACED_SHARE) {
        let distance = if rng.gen_bool(DENSE_SHARE) {
            rng.gen_range(0.0..args.dense_km)
        } else {
            rng.gen_range(args.dense_km..args.spread_km.max(args.dense_km + 1.0))
        };
        let bearing = rng.gen_range(0.0..std::f64::consts::TAU);
        let (lat, lon) = offset(args.lat, args.lon, distance, bearing);
        listing = listing.at(lat, lon, PLACES[rng.gen_range(0..PLACES.len())]);
    }

    match domain {
        Domain::Jobs => {
            let salary_min = rng.gen_range(10..60) * 1_000;
            listing.tags = vec!["communication".into(), "teamwork".into()];
            listing
                .attribute("company_name", "Acme Logistics")
                .attribute("work_mode", ["onsite", "remote", "hybrid"][rng.gen_range(0..3)])
                .attribute("salary_min", salary_min)
                .attribute("salary_max", salary_min + rng.gen_range(5..30) * 1_000)
                .attribute("salary_unit", "month")
                .attribute("experience_years", rng.gen_range(0..10))
        }
        Domain::LocalJobs => {
            let salary_min = rng.gen_range(5..25) * 1_000;
            listing.image_urls = (0..rng.gen_range(0..4))
                .map(|i| format!("https://images.example.com/local/{created_at}-{i}.jpg"))
                .collect();
            listing
                .attribute("company", "Household")
                .attribute("salary_min", salary_min)
                .attribute("salary_max", salary_min + 5_000)
                .attribute("salary_unit", "month")
                .attribute("min_age", 18)
                .attribute("max_age", rng.gen_range(35..60))
        }
        Domain::UsedProducts => {
            listing.image_urls = (0..rng.gen_range(1..6))
                .map(|i| format!("https://images.example.com/used/{created_at}-{i}.jpg"))
                .collect();
            listing
                .attribute("price", (rng.gen_range(500.0..50_000.0_f64) * 100.0).round() / 100.0)
                .attribute("price_unit", "INR")
                .attribute("condition", ["new", "like_new", "used"][rng.gen_range(0..3)])
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    if args.output.exists() {
        std::fs::remove_file(&args.output)
            .with_context(|| format!("failed to remove existing {}", args.output.display()))?;
    }

    println!("Generating listings database...");
    println!("Output: {}", args.output.display());

    let db = Database::open(&args.output).context("failed to create database")?;

    let mut rng = rand::thread_rng();
    let now_ms = chrono::Utc::now().timestamp_millis();

    for domain in Domain::ALL {
        for i in 0..args.count {
            let listing = generate_listing(&mut rng, &args, domain, now_ms);
            db.insert_listing(domain, &listing)
                .with_context(|| format!("failed to insert {domain} listing {i}"))?;

            if (i + 1) % 500 == 0 {
                println!("  {}: {}/{} listings...", domain, i + 1, args.count);
            }
        }
    }

    for user_id in 1..=args.users {
        let distance = rng.gen_range(0.0..args.dense_km);
        let (lat, lon) = offset(args.lat, args.lon, distance, rng.gen_range(0.0..std::f64::consts::TAU));
        db.set_user_location(user_id, georank::models::GeoPoint::new(lat, lon))?;
    }

    println!();
    println!("Database created: {}", args.output.display());
    for domain in Domain::ALL {
        println!("  {}: {} listings", domain, db.count_listings(domain)?);
    }
    println!("  Users with location: {}", args.users);
    Ok(())
}
