use std::fs::File;
use std::sync::Arc;

use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter};

use ultihub::cache::AnalyticsCache;
use ultihub::config::Config;
use ultihub::live::LiveBus;
use ultihub::routes;
use ultihub::state::AppState;
use ultihub::store::postgres::PgStore;
use ultihub::AppError;

#[tokio::main]
async fn main() {
    if let Err(e) = setup_tracing() {
        panic!("Error trying to setup tracing: {}", e);
    }

    if let Err(e) = run().await {
        panic!("Error trying to run the server: {}", e);
    }
}

/// The main function that runs the server.
async fn run() -> Result<(), AppError> {
    let config = Config::from_env()?;

    let store = PgStore::connect(&config.database_url).await?;
    info!("Successfully connected to the database");

    if config.run_migrations {
        store.migrate().await?;
        info!("Database migrations applied");
    }

    let bus = Arc::new(LiveBus::new());
    let cache = Arc::new(AnalyticsCache::new(config.analytics_cache_ttl));
    let state = AppState::new(Arc::new(store), bus.clone(), cache);

    let app = routes::router(state);
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!("Listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(bus))
        .await?;

    info!("Server stopped");

    Ok(())
}

async fn shutdown_signal(bus: Arc<LiveBus>) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Error listening for the shutdown signal: {}", e);
    }
    info!("Shutdown signal received");

    // Relay loops only exit on client disconnect or bus shutdown; closing the
    // bus here lets graceful shutdown drain sockets that still have viewers.
    bus.close();
}

/// Sets up the tracing subscriber for the server.
fn setup_tracing() -> Result<(), AppError> {
    if cfg!(debug_assertions) {
        let filter = EnvFilter::from_default_env()
            .add_directive("none".parse()?)
            .add_directive("ultihub=info".parse()?);

        tracing_subscriber::fmt::fmt()
            .with_env_filter(filter)
            .with_span_events(FmtSpan::NONE)
            .pretty()
            .init();

        return Ok(());
    }

    let log_file = File::create("server.log")?;

    // Only errors get logged in production.
    tracing_subscriber::fmt::fmt()
        .with_span_events(FmtSpan::NONE)
        .with_max_level(LevelFilter::ERROR)
        .with_writer(log_file)
        .pretty()
        .init();

    Ok(())
}
