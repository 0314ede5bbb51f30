use sqlx::{postgres::PgPoolOptions, Pool, Postgres};

use crate::config::Config;

pub async fn connect(config: &Config) -> Result<Pool<Postgres>, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await?;

    log::info!(
        "Connected to database with up to {} connections",
        config.database_max_connections
    );

    Ok(pool)
}

pub async fn run_migrations(pool: &Pool<Postgres>) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
