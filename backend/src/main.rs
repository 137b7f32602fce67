use anyhow::Result;
use backend::axum_http::http_serve;
use backend::background_worker::revocation_purge;
use backend::config::config_loader;
use crates::infra::db::{
    postgres::postgres_connection, repositories::revocations::RevocationPostgres,
};
use std::{sync::Arc, time::Duration};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        error!("Backend exited with error: {}", error);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    crates::observability::init_observability("backend")?;

    let dotenvy_env = config_loader::load()?;
    info!("ENV has been loaded");

    let postgres_pool = Arc::new(postgres_connection::establish_connection(
        &dotenvy_env.database.url,
    )?);
    info!("Postgres connection has been established");

    let purge_task = tokio::spawn(revocation_purge::run_purge_loop(
        Arc::new(RevocationPostgres::new(Arc::clone(&postgres_pool))),
        Duration::from_secs(dotenvy_env.revocation_purge.interval_secs.max(1)),
    ));

    let served = http_serve::start(Arc::new(dotenvy_env), postgres_pool).await;
    purge_task.abort();

    served
}
