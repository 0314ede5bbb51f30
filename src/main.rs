use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

use foodgram_sdk::{
    api::{context::Context, routes::routes},
    config::Config,
    pool::{connect, run_migrations},
};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;

    let pool = connect(&config).await?;
    run_migrations(&pool).await?;

    tokio::fs::create_dir_all(&config.media_root).await?;

    let context = Context::new(&config, pool)?;
    let (address, server) = warp::serve(routes(context))
        .try_bind_with_graceful_shutdown(config.bind_address, async {
            tokio::signal::ctrl_c().await.ok();
            log::info!("Shutting down");
        })?;

    log::info!("Listening on {address}");
    server.await;

    Ok(())
}
