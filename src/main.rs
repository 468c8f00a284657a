use joker_stats::{
    config::{StatsConfig, StorageBackend},
    shared::AppState,
    stats::{
        handlers, FileStatsRepository, InMemoryStatsRepository, PostgresStatsRepository,
        StatsRepository, StatsService,
    },
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "joker_stats=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = StatsConfig::from_env();
    info!(
        backend = ?config.backend,
        total_blocks = config.total_blocks,
        slot_count = config.slot_count,
        "Starting Joker statistics service"
    );

    let repository: Arc<dyn StatsRepository> = match config.backend {
        StorageBackend::Memory => Arc::new(InMemoryStatsRepository::new()),
        StorageBackend::File => Arc::new(FileStatsRepository::new(&config.data_dir)),
        StorageBackend::Postgres => {
            let database_url = config
                .database_url
                .as_deref()
                .ok_or("DATABASE_URL must be set for the postgres backend")?;
            let pool = sqlx::PgPool::connect(database_url).await?;
            let repository = PostgresStatsRepository::new(pool);
            repository.ensure_schema().await?;
            Arc::new(repository)
        }
    };

    let stats_service = StatsService::builder(repository)
        .with_settings(Arc::new(config.game_settings()))
        .with_slot_count(config.slot_count)
        .with_storage_key(config.storage_key.clone())
        .build();

    let app_state = AppState::new(Arc::new(stats_service));

    let app = handlers::router()
        .route("/", axum::routing::get(|| async { "Joker statistics" }))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("Server running on http://{}", config.bind_addr);
    axum::serve(listener, app).await?;
    Ok(())
}
