use clap::Parser;

use portal_server::config::Config;
use portal_server::{routes, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::parse();
    let state = AppState::from_config(&config).await?;
    let app = routes::router(state);

    let listener = tokio::net::TcpListener::bind(config.listen).await?;
    log::info!("Starting portal HTTP server on http://{}", config.listen);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    log::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        log::error!("Could not listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
}
