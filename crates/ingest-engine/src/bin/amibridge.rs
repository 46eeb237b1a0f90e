//! The amibridge service binary
//!
//! Reads its configuration from the environment, connects to Postgres and
//! to the manager interface, and runs the ingestion loop for the life of
//! the process. Exit is abnormal by design: only startup failure or an
//! unavailable store ends the process, and the supervisor restarts it.

use std::sync::Arc;

use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use tracing::info;
use tracing_subscriber::EnvFilter;

use amibridge_ingest_engine::{
    BridgeConfig, IngestionPipeline, PgCallRecordStore, PgContactDirectory,
};

#[tokio::main]
async fn main() -> Result<()> {
    // A .env file is a convenience for local runs; absence is fine.
    dotenvy::dotenv().ok();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = BridgeConfig::from_env()?;

    info!(version = env!("CARGO_PKG_VERSION"), "starting amibridge");
    info!(
        "manager {} user={}",
        config.ami.endpoint(),
        config.ami.username
    );
    info!(
        "store {} user={}",
        config.store.endpoint(),
        config.store.user
    );

    // The store connection is long-lived and reused; connect eagerly so a
    // bad endpoint fails at startup, not on the first event.
    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect_with(config.store.connect_options())
        .await?;

    let store = PgCallRecordStore::new(pool.clone());
    store.ensure_schema().await?;

    let directory = Arc::new(PgContactDirectory::new(pool));
    let pipeline = IngestionPipeline::new(config, directory, Arc::new(store));
    pipeline.run().await?;

    Ok(())
}
