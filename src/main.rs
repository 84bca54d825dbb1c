use std::net::SocketAddr;
use std::sync::Arc;

use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use income_insight_api::build_router;
use income_insight_api::config::Config;
use income_insight_api::db::Database;
use income_insight_api::db_storage::PgClientStore;
use income_insight_api::handlers::AppState;

/// Main entry point for the application.
///
/// Initializes logging, loads configuration, connects to PostgreSQL (creating
/// the client schema if needed), then serves the HTTP API. Failing to reach
/// the database aborts startup.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "income_insight_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize database connection pool
    let db = Database::new(&config.database_url, config.database_max_connections).await?;
    tracing::info!("Database connection pool established");

    let store = Arc::new(PgClientStore::new(db.pool.clone()));
    let app_state = Arc::new(AppState::new(store, config.clone()));

    // Configure per-IP rate limiter for the /api routes
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(config.rate_limit_per_second)
            .burst_size(config.rate_limit_burst)
            .key_extractor(SmartIpKeyExtractor)
            .finish()
            .ok_or_else(|| anyhow::anyhow!("Invalid rate limiter configuration"))?,
    );
    tracing::info!(
        "Rate limiting: {} req/sec per IP, burst of {}",
        config.rate_limit_per_second,
        config.rate_limit_burst
    );

    let app = build_router(app_state, |routes| {
        routes.layer(GovernorLayer {
            config: governor_conf,
        })
    });

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
