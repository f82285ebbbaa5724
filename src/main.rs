use std::sync::{Arc, Mutex};

use axum::routing::{get, patch, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use servicebook::config::AppConfig;
use servicebook::db;
use servicebook::handlers;
use servicebook::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let conn = db::init_db(&config.database_url)?;

    if config.allow_confirmed_cancellation {
        tracing::info!("confirmed -> cancelled transition is enabled");
    }

    let state = Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        config: config.clone(),
    });

    let app = router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/api/users", post(handlers::users::register))
        .route("/api/users/:id", patch(handlers::users::update_profile))
        .route("/api/workers", get(handlers::workers::list_workers))
        .route("/api/workers", post(handlers::workers::create_worker))
        .route("/api/workers/:id", get(handlers::workers::get_worker))
        .route("/api/workers/:id", patch(handlers::workers::update_worker))
        .route("/api/bookings", post(handlers::bookings::create_booking))
        .route(
            "/api/bookings/my-bookings",
            get(handlers::bookings::my_bookings),
        )
        .route("/api/bookings/all", get(handlers::bookings::all_bookings))
        .route(
            "/api/bookings/:id/status",
            patch(handlers::bookings::update_status),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
