use std::sync::Arc;
use std::time::Duration;
use anyhow::Context;
use bb8_postgres::bb8::Pool;
use bb8_postgres::PostgresConnectionManager;
use bb8_postgres::tokio_postgres::NoTls;
use clap::Parser;
use dotenv::dotenv;
use tracing::info;
use crate::config::{Config, ProviderKind};
use crate::controller::AppState;
use crate::providers::geoapify::GeoapifyClient;
use crate::providers::opentripmap::OpenTripMapClient;
use crate::providers::{build_http_client, PlacesProvider};
use crate::repositories::postgres_repo::PostgresConnectionRepo;
use crate::services::card_service::HttpCardService;

pub mod config;
pub mod controller;
pub mod errors;
pub mod helpers;
pub mod models;
pub mod providers;
pub mod repositories;
pub mod services;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = Config::parse();

    let manager = PostgresConnectionManager::new_from_stringlike(&config.database_url, NoTls)
        .context("Invalid DATABASE_URL")?;
    let postgres_connection = Pool::builder()
        .max_size(config.database_pool_size)
        .build(manager)
        .await
        .context("Failed to build postgres connection pool")?;

    let review_repo = PostgresConnectionRepo::new(postgres_connection);
    review_repo.ensure_schema().await?;

    let app_state = AppState {
        places_provider: places_provider(&config)?,
        review_repo: Arc::new(review_repo),
        card_service: Arc::new(HttpCardService::new(
            build_http_client(Duration::from_secs(config.card_timeout_secs))?,
            config.card_api_url.clone(),
        )),
        search_radius_m: config.search_radius_m,
    };

    controller::serve(app_state, &config).await
}

fn places_provider(config: &Config) -> anyhow::Result<Arc<dyn PlacesProvider>> {
    let api_key = config.provider_api_key()?;
    let client = build_http_client(Duration::from_secs(config.upstream_timeout_secs))?;
    info!("Using {:?} as the places provider", config.places_provider);

    let provider: Arc<dyn PlacesProvider> = match config.places_provider {
        ProviderKind::Opentripmap => Arc::new(OpenTripMapClient::new(client, api_key)),
        ProviderKind::Geoapify => Arc::new(GeoapifyClient::new(client, api_key)),
    };
    Ok(provider)
}
