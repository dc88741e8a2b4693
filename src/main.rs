mod config;
mod core;
mod models;
mod routes;
mod services;

use actix_cors::Cors;
use actix_web::{error, http::StatusCode, middleware, web, App, HttpResponse, HttpServer};
use config::Settings;
use core::Engine;
use routes::search::AppState;
use services::{CatalogStore, FetchCoordinator, LocalItemStore, ProviderClient, ResponseCache};
use std::sync::Arc;
use tracing::{error, info};

/// JSON error response for JSON payload errors
#[derive(Debug, serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

impl std::fmt::Display for JsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

impl std::error::Error for JsonError {}

impl error::ResponseError for JsonError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::BAD_REQUEST))
            .content_type("application/json")
            .body(serde_json::to_string(self).unwrap())
    }
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(err: error::JsonPayloadError, req: &actix_web::HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    JsonError {
        error: "invalid_json".to_string(),
        message: format!("Invalid JSON: {}", err),
        status_code: 400,
    }
    .into()
}

/// Handle query payload errors
pub fn handle_query_payload_error(err: error::QueryPayloadError, _req: &actix_web::HttpRequest) -> actix_web::Error {
    JsonError {
        error: "invalid_query".to_string(),
        message: format!("Invalid query: {}", err),
        status_code: 400,
    }
    .into()
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    // Initialize logging
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "json".to_string());

    let subscriber = tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true);

    if log_format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.init();
    }

    info!("Starting listing-rank service...");

    // Load configuration
    let settings = Settings::load().unwrap_or_else(|e| {
        error!("Failed to load configuration: {}", e);
        panic!("Configuration error: {}", e);
    });

    info!("Configuration loaded successfully");

    // Initialize the criteria catalog store
    let catalog = Arc::new(CatalogStore::new(settings.catalog.config_dir.clone()));
    match catalog.list_keys() {
        Ok(keys) => info!("Catalog store initialized ({} catalogs)", keys.len()),
        Err(e) => error!("Catalog directory not readable yet: {}", e),
    }

    // Initialize item sources
    let local_items = Arc::new(LocalItemStore::new(settings.catalog.data_dir.clone()));

    let provider = settings.provider.base_url.clone().map(|base_url| {
        info!("Provider client initialized for {}", base_url);
        Arc::new(ProviderClient::new(
            base_url,
            settings.provider.api_key.clone(),
            settings.provider.fetch_limit,
            settings.provider.sample_size,
        ))
    });
    if provider.is_none() {
        info!("No provider configured, serving local datasets only");
    }

    // Initialize response cache
    let cache = Arc::new(ResponseCache::new(
        settings.cache.max_entries,
        settings.cache.ttl_secs,
    ));
    info!(
        "Response cache initialized ({} entries, TTL: {}s)",
        settings.cache.max_entries, settings.cache.ttl_secs
    );

    // Initialize the debounced fetch coordinator
    let fetcher = Arc::new(FetchCoordinator::new(settings.search.debounce_ms));

    // Initialize the ranking engine with configured constants
    let params = settings.ranking.params();
    let engine = Engine::new(params);
    info!("Ranking engine initialized with params: {:?}", params);

    // Build application state
    let app_state = AppState {
        catalog,
        local_items,
        provider,
        cache,
        fetcher,
        engine,
    };

    // Configure HTTP server
    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
            .app_data(web::QueryConfig::default().error_handler(handle_query_payload_error))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
