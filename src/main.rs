// src/main.rs

use std::sync::Arc;

use dotenvy::dotenv;
use quiz_backend::config::{Config, ScoreBackend};
use quiz_backend::routes;
use quiz_backend::services::score_store::{BlobStore, FileBlobStore, SqliteBlobStore};
use quiz_backend::services::subject_provider::HttpSubjectProvider;
use quiz_backend::state::AppState;
use quiz_backend::utils::time::SystemClock;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenv().ok();

    // Load configuration from environment
    let config = Config::from_env();

    let file_appender = tracing_appender::rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    // Initialize Tracing (Logging)
    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    let blobs: Arc<dyn BlobStore> = match config.score_backend {
        ScoreBackend::File => {
            tracing::info!("Scores stored under {}", config.scores_dir);
            Arc::new(FileBlobStore::new(&config.scores_dir))
        }
        ScoreBackend::Sqlite => {
            let store = SqliteBlobStore::connect(&config.database_url)
                .await
                .expect("Failed to open score database");
            tracing::info!("Scores stored in {}", config.database_url);
            Arc::new(store)
        }
    };

    let provider = HttpSubjectProvider::new(config.subject_api_url.clone(), config.max_subject_id)
        .expect("Failed to build HTTP client");
    tracing::info!("Subjects fetched from {}", config.subject_api_url);

    let state = AppState::new(
        config.clone(),
        Arc::new(provider),
        blobs,
        Arc::new(SystemClock),
    );

    // Create the Axum application router
    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("Failed to bind listening address");
    tracing::info!("Listening on {}", config.bind_addr);

    // Start the server
    axum::serve(listener, app).await.expect("Server error");
}
