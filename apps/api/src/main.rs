use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use axum_helpers::{create_app, create_router, health_router};
use core_config::tracing::{init_tracing, install_color_eyre};
use domain_catalog::{handlers, PgProductRepository, ProductService};
use sea_orm::DatabaseConnection;
use serde_json::json;
use tracing::info;

mod config;
mod openapi;

use config::Config;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Install color-eyre first for colored error output (before any fallible operations)
    install_color_eyre();

    // Load configuration from environment variables
    let config = Config::from_env()?;

    init_tracing(&config.environment);

    let db = database::postgres::connect_from_config_with_retry(config.database.clone(), None)
        .await
        .map_err(|e| eyre::eyre!("PostgreSQL connection failed: {}", e))?;

    // Bring the schema up to date before serving traffic
    database::postgres::run_migrations::<migration::Migrator>(&db, config.app.name)
        .await
        .map_err(|e| eyre::eyre!("Migration failed: {}", e))?;

    let service = ProductService::new(PgProductRepository::new(db.clone()));

    let api_routes = Router::new().nest("/products", handlers::router(service));

    let router = create_router::<openapi::ApiDoc>(api_routes)
        .await?
        .merge(health_router(config.app))
        .merge(Router::new().route("/ready", get(ready)).with_state(db));

    info!(
        "{} v{} listening on {}",
        config.app.name,
        config.app.version,
        config.server.address()
    );

    create_app(router, &config.server).await?;

    Ok(())
}

/// Readiness probe: verifies the database is reachable
async fn ready(State(db): State<DatabaseConnection>) -> impl IntoResponse {
    match database::postgres::check_health(&db).await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "ready": true, "database": "connected" })),
        ),
        Err(e) => {
            tracing::error!("Readiness check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "ready": false, "database": "disconnected" })),
            )
        }
    }
}
