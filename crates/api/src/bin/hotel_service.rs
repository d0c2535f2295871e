//! Hotel service entry point.

use std::sync::Arc;

use api::config::{Config, HOTEL_SERVICE_PORT};
use api::routes::metrics;
use api::routes::rooms::HotelState;
use hotel::{InMemoryHotelStore, PostgresHotelStore};
use sqlx::postgres::PgPoolOptions;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env(HOTEL_SERVICE_PORT);
    api::init_tracing(&config);
    let metrics_handle = metrics::install_recorder()?;

    let app = match &config.database_url {
        Some(url) => {
            let pool = PgPoolOptions::new().max_connections(10).connect(url).await?;
            let store = PostgresHotelStore::new(pool);
            store.run_migrations().await?;
            tracing::info!("using PostgreSQL hotel store");
            api::create_hotel_app(Arc::new(HotelState::new(store)), metrics_handle)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory hotel store");
            api::create_hotel_app(
                Arc::new(HotelState::new(InMemoryHotelStore::new())),
                metrics_handle,
            )
        }
    };

    tracing::info!(addr = %config.addr(), "starting hotel service");
    api::serve(app, &config).await?;
    Ok(())
}
