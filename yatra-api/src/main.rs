use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use yatra_api::{app, AppState, AuthConfig};
use yatra_store::{Config, DbClient, PgBookingRepository, PgTravelRepository, PgUserRepository, RedisClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "yatra_api=debug,yatra_store=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting Yatra API on port {}", config.server.port);

    let db = DbClient::new(&config.database.url, config.database.max_connections)
        .await
        .context("Failed to connect to Postgres")?;
    db.migrate().await.context("Failed to run migrations")?;

    let mut state = AppState::new(
        Arc::new(PgUserRepository::new(db.pool.clone())),
        Arc::new(PgTravelRepository::new(db.pool.clone())),
        Arc::new(PgBookingRepository::new(db.pool.clone())),
        AuthConfig {
            secret: config.auth.jwt_secret.clone(),
            expiration: config.auth.jwt_expiration_seconds,
        },
    )
    .with_policy(config.business_rules.booking_policy())
    .with_rate_limit(config.business_rules.rate_limit_per_minute);

    match &config.redis {
        Some(redis) => match RedisClient::new(&redis.url).await {
            Ok(client) => state = state.with_redis(client),
            Err(e) => tracing::warn!("Redis unavailable, rate limiting disabled: {}", e),
        },
        None => tracing::info!("No Redis configured, rate limiting disabled"),
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app(state).into_make_service_with_connect_info::<SocketAddr>()).await?;
    Ok(())
}
