use std::time::Duration;

use axum::Router;
use axum::http::{HeaderName, HeaderValue, Method, Request, header};
use axum::response::Response;
use migration::{Migrator, MigratorTrait};
use sea_orm::{DatabaseConnection, EntityTrait, PaginatorTrait};
use tokio::signal;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::Span;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use game_market_api::auth::AUTH_HEADER;
use game_market_api::config::{Config, Environment};
use game_market_api::entities::{genre, platform};
use game_market_api::state::AppState;
use game_market_api::storage::ImageStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize structured logging
    init_tracing(&config.log_level);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = ?config.environment,
        "Starting game market API"
    );

    // Connect to database
    tracing::info!("Connecting to database...");
    let db = game_market_api::db::connect(&config.database_url).await?;
    tracing::info!("Database connected");

    // Run migrations
    tracing::info!("Running database migrations...");
    Migrator::up(&db, None).await?;
    log_catalogue(&db).await?;

    tokio::fs::create_dir_all(&config.image_dir).await?;
    tracing::info!(
        image_dir = %config.image_dir.display(),
        max_image_bytes = config.max_image_bytes,
        "Image store ready"
    );
    let state = AppState {
        db,
        images: ImageStore::new(config.image_dir.clone()),
        config: config.clone(),
    };

    let app = build_app(state, &config);

    // Start the server
    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Report the seeded genre and platform catalogue once migrations have run.
async fn log_catalogue(db: &DatabaseConnection) -> anyhow::Result<()> {
    let genres = genre::Entity::find().count(db).await?;
    let platforms = platform::Entity::find().count(db).await?;
    tracing::info!(genres, platforms, "Migrations applied");
    Ok(())
}

/// Resolve on Ctrl+C or, on unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    tracing::info!("Shutdown signal received, draining connections");
}

/// Browser access policy. Production only admits the storefront origin from `FRONTEND_URL`.
fn cors_layer(config: &Config) -> CorsLayer {
    if config.environment != Environment::Production {
        return CorsLayer::permissive();
    }

    let origin = config.frontend_url.parse::<HeaderValue>().unwrap_or_else(|_| {
        tracing::warn!(
            frontend_url = %config.frontend_url,
            "FRONTEND_URL is not a valid origin, falling back to http://localhost:8080"
        );
        HeaderValue::from_static("http://localhost:8080")
    });

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        // Session tokens travel in a custom header; image uploads send their own content type.
        .allow_headers([
            HeaderName::from_static(AUTH_HEADER),
            header::CONTENT_TYPE,
            header::ACCEPT,
        ])
        .max_age(Duration::from_secs(3600))
}

/// Build the full application router with all middleware layers.
fn build_app(state: AppState, config: &Config) -> Router {
    let cors = cors_layer(config);

    let trace = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<_>| {
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                status_code = tracing::field::Empty,
            )
        })
        .on_response(|response: &Response, latency: Duration, span: &Span| {
            span.record("status_code", response.status().as_u16());
            tracing::info!(latency_ms = latency.as_millis(), "response");
        });

    game_market_api::routes::router(config)
        .with_state(state)
        .layer(cors)
        .layer(trace)
}

/// Initialize the `tracing` subscriber with an environment-based filter.
fn init_tracing(log_level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("game_market_api={log_level},tower_http=info,sea_orm=warn").into()
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
