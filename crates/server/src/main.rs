mod config;
mod doc;
mod dtos;
mod error;
mod routes;
mod state;
mod utils;

use crate::{
    config::Config,
    doc::ApiDoc,
    routes::health::{health, root},
    state::AppState,
    utils::shutdown::shutdown_signal,
};
use axum::{Router, routing::get};
use database::db::create_connection;
use log::info;
use migration::{Migrator, MigratorTrait};
use std::sync::Arc;
use storage::{HttpObjectStore, Uploader};
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tower_oauth2_resource_server::server::OAuth2ResourceServer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    env_logger::init();

    let config = Config::from_env().unwrap_or_else(|e| panic!("Invalid configuration: {e}"));

    let db = create_connection(&config.database_url)
        .await
        .expect("Failed to connect to database");
    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    let store = HttpObjectStore::new(&config.storage_url, &config.storage_api_key)
        .expect("Failed to set up storage client");
    let state = AppState {
        db,
        uploader: Uploader::new(Arc::new(store)),
    };

    let oauth2_resource_server = <OAuth2ResourceServer>::builder()
        .issuer_url(config.oidc_issuer_url.as_str())
        .build()
        .await
        .expect("Failed to build OAuth2ResourceServer");

    let api = routes::api_router()
        .layer(ServiceBuilder::new().layer(oauth2_resource_server.into_layer()));

    let app = Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .nest("/api", api)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CompressionLayer::new())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .expect("Failed to bind listener");
    info!("Running axum on http://{}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");
}
