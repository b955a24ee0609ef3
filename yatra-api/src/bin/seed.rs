//! Replaces the travel catalog with generated departures for the next 30 days.

use anyhow::Context;
use chrono::Utc;
use yatra_catalog::SampleGenerator;
use yatra_core::repository::TravelRepository;
use yatra_store::{Config, DbClient, PgTravelRepository};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "yatra_store=info".into()),
        )
        .init();

    let config = Config::load().context("Failed to load config")?;
    let db = DbClient::new(&config.database.url, config.database.max_connections)
        .await
        .context("Failed to connect to Postgres")?;
    db.migrate().await.context("Failed to run migrations")?;

    println!("Clearing existing travel options...");
    let options = SampleGenerator::new(rand::thread_rng()).generate(Utc::now());

    let created = PgTravelRepository::new(db.pool.clone())
        .replace_catalog(options)
        .await
        .context("Failed to write travel options")?;

    tracing::info!("Seeding finished");
    println!("Successfully created {} sample travel options", created);
    Ok(())
}
