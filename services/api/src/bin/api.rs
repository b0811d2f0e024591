//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{
        DbAdapter, InMemoryDb, LogResetNotifier, OpenAiContentAdapter, OpenAiFeedbackAdapter,
        OpenAiImageAdapter, OpenAiQuizAdapter,
    },
    config::{Config, ConfigError},
    error::ApiError,
    web::{self, rest::ApiDoc, state::AppState},
};
use async_openai::{config::OpenAIConfig, Client};
use axum::http::{
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    HeaderValue, Method,
};
use axum::Router;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use study_assistant_core::pipeline::QuizPipeline;
use study_assistant_core::ports::DatabaseService;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

async fn connect_database(config: &Config) -> Result<Arc<dyn DatabaseService>, ApiError> {
    let Some(database_url) = config.database_url.as_deref() else {
        warn!("DATABASE_URL is not set; data will be kept in memory and lost on restart.");
        return Ok(Arc::new(InMemoryDb::new()));
    };

    info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;
    let db_adapter = DbAdapter::new(db_pool);
    info!("Running database migrations...");
    db_adapter.run_migrations().await?;
    info!("Database migrations complete.");
    Ok(Arc::new(db_adapter))
}

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.log_filter))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Storage ---
    let db = connect_database(&config).await?;

    // --- 3. Initialize Model Adapters ---
    let openai_config = OpenAIConfig::new().with_api_key(config.require_openai_api_key()?);
    let openai_client = Client::with_config(openai_config);

    let quiz_adapter = Arc::new(OpenAiQuizAdapter::new(
        openai_client.clone(),
        config.quiz_model.clone(),
    ));
    let image_adapter = Arc::new(OpenAiImageAdapter::new(
        openai_client.clone(),
        config.image_model.clone(),
    ));
    let feedback_adapter = Arc::new(OpenAiFeedbackAdapter::new(
        openai_client.clone(),
        config.feedback_model.clone(),
    ));
    let content_adapter = Arc::new(OpenAiContentAdapter::new(
        openai_client,
        config.content_model.clone(),
    ));

    // --- 4. Build the Shared AppState ---
    let app_state = Arc::new(AppState {
        db,
        config: config.clone(),
        pipeline: QuizPipeline::new(quiz_adapter, image_adapter, content_adapter.clone()),
        feedback_adapter,
        content_adapter: content_adapter.clone(),
        study_plan_adapter: content_adapter,
        reset_notifier: Arc::new(LogResetNotifier),
    });

    // --- 5. Create the Web Router ---
    let cors_origin = config.cors_origin.parse::<HeaderValue>().map_err(|e| {
        ConfigError::InvalidValue("CORS_ORIGIN".to_string(), e.to_string())
    })?;
    let cors = CorsLayer::new()
        .allow_origin(cors_origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);

    let app = Router::new()
        .merge(web::router(app_state).layer(cors))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 6. Start the Server ---
    let shutdown = CancellationToken::new();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Shutdown signal received.");
            }
            shutdown.cancel();
        }
    });

    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    info!("Server stopped.");
    Ok(())
}
