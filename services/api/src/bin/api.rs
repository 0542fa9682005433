//! services/api/src/bin/api.rs

use api_lib::{
    adapters::PgStore,
    config::Config,
    error::ApiError,
    web::{
        auth::{login_handler, me_handler, register_student_handler},
        queue::{
            counter_queue_handler, counter_stats_handler, process_payment_handler, remove_handler,
            skip_handler,
        },
        rest::health_handler,
        student::{create_payment_handler, student_queue_handler},
        ApiDoc, AppState, CredentialSigner,
    },
};
use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use fee_queue_core::{PaymentProcessor, QueueLedger, QueueQueries};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to Database & Run Migrations ---
    info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    let store = Arc::new(PgStore::new(db_pool));
    info!("Running database migrations...");
    store
        .run_migrations()
        .await
        .map_err(|e| ApiError::Internal(format!("Migration failed: {}", e)))?;
    info!("Database migrations complete.");

    // --- 3. Build the Core Services & Shared AppState ---
    let credentials = CredentialSigner::new(&config.auth_secret)
        .map_err(|e| ApiError::Internal(format!("Invalid AUTH_SECRET: {}", e)))?;

    let app_state = Arc::new(AppState {
        ledger: QueueLedger::new(store.clone(), store.clone()),
        processor: PaymentProcessor::new(store.clone(), store.clone()),
        queries: QueueQueries::new(store.clone(), store.clone()),
        identity: store,
        credentials,
        config: config.clone(),
    });

    // --- 4. Create the Web Router ---
    // The original service accepted any origin; the queue views poll from a
    // separately served frontend.
    let cors = CorsLayer::permissive();

    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(health_handler))
        .route("/auth/register/student", post(register_student_handler))
        .route("/auth/login", post(login_handler));

    // Protected routes (auth required; role checks happen per handler)
    let protected_routes = Router::new()
        .route("/auth/me", get(me_handler))
        .route("/student/payments", post(create_payment_handler))
        .route("/student/payments/queue", get(student_queue_handler))
        .route("/payments/process", post(process_payment_handler))
        .route("/queue/skip", post(skip_handler))
        .route("/queue/remove", post(remove_handler))
        .route("/queue/counter/{id}", get(counter_queue_handler))
        .route("/queue/stats/{id}", get(counter_stats_handler))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            api_lib::web::require_auth,
        ));

    // Combine API routes
    let api_router = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(cors)
        .with_state(app_state);

    // Merge the API router with the Swagger UI router for a complete
    // application.
    let app = Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 5. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
