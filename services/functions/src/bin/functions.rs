//! services/functions/src/bin/functions.rs

use functions_lib::{
    adapters::{channel_source, GeminiTextAdapter, PgChangeListener, PgDocumentStore},
    config::Config,
    error::ApiError,
    jobs::{run_change_events, run_schedule, AiFetchJob, DailyTrendingJob},
    web::{self, rest::ApiDoc, state::AppState},
};
use launchpad_core::{
    ports::{DatabaseService, TextGenerationService},
    AiContentFetcher, InMemoryStore, NotificationWriter, Schedule, TrendingAggregator,
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Webhook events waiting for the dispatcher.
const HOOK_QUEUE_CAPACITY: usize = 256;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting functions...");

    let shutdown = CancellationToken::new();
    let mut tasks = tokio::task::JoinSet::new();

    // --- 2. Connect to the Document Store ---
    let db: Arc<dyn DatabaseService> = match &config.database_url {
        Some(database_url) => {
            info!("Connecting to database...");
            let db_pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(database_url)
                .await?;
            let store = PgDocumentStore::new(db_pool);
            info!("Running database migrations...");
            store.run_migrations().await?;
            info!("Database migrations complete.");

            let listener = PgChangeListener::connect(store.pool()).await?;
            let writer = NotificationWriter::new(Arc::new(store.clone()));
            tasks.spawn(run_change_events_task(listener, writer, shutdown.clone()));
            Arc::new(store)
        }
        None => {
            warn!("DATABASE_URL not set; using the in-memory store. Data will not persist.");
            Arc::new(InMemoryStore::new())
        }
    };

    // --- 3. Initialize the Generative Text Adapter ---
    let text: Option<Arc<dyn TextGenerationService>> = match &config.gemini_api_key {
        Some(key) => Some(Arc::new(GeminiTextAdapter::new(
            &config.gemini_api_base,
            key,
            config.gemini_model.clone(),
        ))),
        None => {
            warn!("GEMINI_API_KEY not set; AI product fetch will be a no-op.");
            None
        }
    };

    // --- 4. Register Change-Event and Timer Handlers ---
    let (hook_sender, hook_source) = channel_source(HOOK_QUEUE_CAPACITY);
    tasks.spawn(run_change_events_task(
        hook_source,
        NotificationWriter::new(db.clone()),
        shutdown.clone(),
    ));

    tasks.spawn(run_schedule(
        Schedule::every_hours(config.ai_fetch_interval_hours),
        Arc::new(AiFetchJob::new(AiContentFetcher::new(db.clone(), text))),
        shutdown.clone(),
    ));
    tasks.spawn(run_schedule(
        Schedule::DailyAt(config.trending_at),
        Arc::new(DailyTrendingJob::new(TrendingAggregator::new(db.clone()))),
        shutdown.clone(),
    ));

    // --- 5. Build the Shared AppState and Router ---
    let app_state = Arc::new(AppState::new(db, config.clone(), hook_sender));
    let app = web::router(app_state)?
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 6. Start the Server ---
    tokio::spawn(cancel_on_ctrl_c(shutdown.clone()));
    info!("Starting server on {}", config.bind_address);
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    let server_shutdown = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { server_shutdown.cancelled().await })
        .await?;

    // --- 7. Drain Background Loops ---
    shutdown.cancel();
    while tasks.join_next().await.is_some() {}
    info!("Shutdown complete.");

    Ok(())
}

async fn run_change_events_task<S>(source: S, writer: NotificationWriter, shutdown: CancellationToken)
where
    S: launchpad_core::ChangeEventSource + 'static,
{
    let stats = run_change_events(source, writer, shutdown).await;
    info!(
        "Change-event dispatcher stopped: {} received, {} notified, {} failed.",
        stats.received, stats.notified, stats.failed
    );
}

async fn cancel_on_ctrl_c(shutdown: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Could not listen for Ctrl-C: {}", e);
        return;
    }
    info!("Ctrl-C received; shutting down.");
    shutdown.cancel();
}
