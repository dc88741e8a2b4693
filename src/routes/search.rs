use actix_web::{web, HttpResponse, Responder};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use validator::Validate;

use crate::core::{parse_search_term_key, Engine};
use crate::models::{ErrorResponse, HealthResponse, SearchRequest, SearchResponse};
use crate::services::{
    fingerprint, CacheKey, CatalogConfig, CatalogError, CatalogStore, FetchCoordinator,
    ItemSourceError, LocalItemStore, ProviderClient, ResponseCache,
};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<CatalogStore>,
    pub local_items: Arc<LocalItemStore>,
    pub provider: Option<Arc<ProviderClient>>,
    pub cache: Arc<ResponseCache>,
    pub fetcher: Arc<FetchCoordinator>,
    pub engine: Engine,
}

/// Configure all search-related routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check))
        .route("/config/{config_key}", web::get().to(get_config))
        .route("/listings/search", web::post().to(search_listings));
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    // A readable config directory is the one hard dependency
    let catalogs_ok = state.catalog.list_keys().is_ok();
    let status = if catalogs_ok { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Serve the raw criteria catalog for a config key
///
/// GET /api/v1/config/{config_key}
async fn get_config(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let config_key = path.into_inner();
    match state.catalog.load_raw(&config_key) {
        Ok(document) => HttpResponse::Ok().json(document),
        Err(CatalogError::NotFound(key)) => HttpResponse::NotFound().json(ErrorResponse {
            error: "Config not found".to_string(),
            message: format!("No catalog for key '{}'", key),
            status_code: 404,
        }),
        Err(e) => {
            tracing::error!("Failed to load catalog {}: {}", config_key, e);
            HttpResponse::InternalServerError().json(ErrorResponse {
                error: "Failed to load catalog".to_string(),
                message: e.to_string(),
                status_code: 500,
            })
        }
    }
}

/// Score, rank and paginate listings endpoint
///
/// POST /api/v1/listings/search
///
/// Request body:
/// ```json
/// {
///   "configKey": "string",
///   "sectionOrder": ["price", "brand"],
///   "selections": {"price": {"min": 100, "max": 500}, "brand": ["acme"]},
///   "page": 1,
///   "perPage": 24
/// }
/// ```
async fn search_listings(
    state: web::Data<AppState>,
    req: web::Json<SearchRequest>,
) -> impl Responder {
    // Validate request
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for search request: {:?}", errors);
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Validation failed".to_string(),
            message: errors.to_string(),
            status_code: 400,
        });
    }

    let req = req.into_inner();
    let page = req.page.max(1);
    let per_page = req.per_page.clamp(1, 200);

    tracing::info!(
        "Searching {}: {} ordered sections, {} selections, page {}",
        req.config_key,
        req.section_order.len(),
        req.selections.len(),
        page
    );

    // The request doubles as the cache fingerprint: selections are ordered
    // maps, so equal queries serialize identically.
    let query_fingerprint = fingerprint(&req);
    let cache_key = CacheKey::search(&req.config_key, &query_fingerprint);
    if let Some(cached) = state.cache.get::<SearchResponse>(&cache_key) {
        tracing::debug!("Serving cached response for {}", cache_key);
        return HttpResponse::Ok().json(cached);
    }

    let config = match state.catalog.load(&req.config_key) {
        Ok(config) => config,
        Err(CatalogError::NotFound(key)) => {
            return HttpResponse::NotFound().json(ErrorResponse {
                error: "Config not found".to_string(),
                message: format!("No catalog for key '{}'", key),
                status_code: 404,
            });
        }
        Err(e) => {
            tracing::error!("Failed to load catalog {}: {}", req.config_key, e);
            return HttpResponse::InternalServerError().json(ErrorResponse {
                error: "Failed to load catalog".to_string(),
                message: e.to_string(),
                status_code: 500,
            });
        }
    };

    let section_order = if req.section_order.is_empty() {
        config.default_section_order()
    } else {
        req.section_order.clone()
    };

    let items = match load_items(&state, &req, &config).await {
        Ok(items) => items,
        Err(response) => return response,
    };

    tracing::debug!("Scoring {} listings for {}", items.len(), req.config_key);

    let outcome = state.engine.search(
        &items,
        &config.filters,
        &section_order,
        &req.selections,
        page,
        per_page,
    );

    let response = SearchResponse {
        listings: outcome.page.items,
        page_info: outcome.page.info,
    };

    tracing::info!(
        "Returning page {}/{} ({} of {} listings) for {}",
        response.page_info.page,
        response.page_info.total_pages,
        response.listings.len(),
        response.page_info.total,
        req.config_key
    );

    if let Err(e) = state.cache.set(&cache_key, &response) {
        tracing::warn!("Failed to cache search response: {}", e);
    }
    HttpResponse::Ok().json(response)
}

/// Load the item snapshot for a request from the catalog's data source.
async fn load_items(
    state: &web::Data<AppState>,
    req: &SearchRequest,
    config: &CatalogConfig,
) -> Result<Vec<Value>, HttpResponse> {
    let source = config.data_source();
    let source_type = source.map(|s| s.source_type.as_str()).unwrap_or("local_json");

    match source_type {
        "local_json" => {
            // Catalogs without an explicit source use a dataset named after
            // the config key.
            let dataset_key = source
                .map(|s| s.provider_key.as_str())
                .filter(|key| !key.is_empty())
                .unwrap_or(req.config_key.as_str());
            state
                .local_items
                .load(dataset_key)
                .map_err(|e| item_source_error(dataset_key, e))
        }
        "external_api" => fetch_provider_sample(state, req, config).await,
        other => Err(HttpResponse::BadRequest().json(ErrorResponse {
            error: "Unsupported data source".to_string(),
            message: format!("Cannot score listings from source type '{}'", other),
            status_code: 400,
        })),
    }
}

/// Fetch (or reuse) a provider sample, debounced with last-request-wins.
async fn fetch_provider_sample(
    state: &web::Data<AppState>,
    req: &SearchRequest,
    config: &CatalogConfig,
) -> Result<Vec<Value>, HttpResponse> {
    let Some(provider) = state.provider.as_ref() else {
        return Err(HttpResponse::BadRequest().json(ErrorResponse {
            error: "Provider not configured".to_string(),
            message: "This catalog requires an external provider".to_string(),
            status_code: 400,
        }));
    };

    let query = build_provider_query(req, config);

    // The sample only depends on the provider query, so all pages of the
    // same search share one upstream fetch.
    let sample_key = CacheKey::sample(&req.config_key, &fingerprint(&query));
    if let Some(sample) = state.cache.get::<Vec<Value>>(&sample_key) {
        tracing::debug!("Reusing cached sample of {} listings", sample.len());
        return Ok(sample);
    }

    let fetched = state
        .fetcher
        .run(|| provider.fetch_sample(&query))
        .await;

    match fetched {
        None => Err(HttpResponse::Conflict().json(ErrorResponse {
            error: "Superseded".to_string(),
            message: "A newer search superseded this request".to_string(),
            status_code: 409,
        })),
        Some(Err(e)) => {
            tracing::error!("Provider fetch failed for {}: {}", req.config_key, e);
            Err(item_source_error(&req.config_key, e))
        }
        Some(Ok(sample)) => {
            if let Err(e) = state.cache.set(&sample_key, &sample) {
                tracing::warn!("Failed to cache provider sample: {}", e);
            }
            Ok(sample)
        }
    }
}

fn item_source_error(key: &str, e: ItemSourceError) -> HttpResponse {
    match &e {
        ItemSourceError::NotFound(_) => HttpResponse::NotFound().json(ErrorResponse {
            error: "Dataset not found".to_string(),
            message: format!("No dataset for key '{}'", key),
            status_code: 404,
        }),
        _ if e.is_retryable() => HttpResponse::BadGateway().json(ErrorResponse {
            error: "Item source unavailable".to_string(),
            message: e.to_string(),
            status_code: 502,
        }),
        _ => HttpResponse::InternalServerError().json(ErrorResponse {
            error: "Failed to load items".to_string(),
            message: e.to_string(),
            status_code: 500,
        }),
    }
}

/// Build the upstream provider query: the catalog's preset query plus the
/// user's free-text terms (including individually-tracked term sections).
fn build_provider_query(req: &SearchRequest, config: &CatalogConfig) -> String {
    let text_keys: HashSet<&str> = config
        .filters
        .iter()
        .filter(|criterion| criterion.is_text())
        .map(|criterion| criterion.key.as_str())
        .collect();

    let mut terms: Vec<String> = Vec::new();
    for (key, selection) in &req.selections {
        if text_keys.contains(key.as_str()) {
            terms.extend(selection.ranked_values());
        } else if let Some(parsed) = parse_search_term_key(key) {
            if text_keys.contains(parsed.base_key.as_str()) {
                let values = selection.ranked_values();
                if values.is_empty() {
                    terms.push(parsed.term);
                } else {
                    terms.extend(values);
                }
            }
        }
    }
    // Synthetic keys can appear in the order without a selections entry.
    for key in &req.section_order {
        if req.selections.contains_key(key) {
            continue;
        }
        if let Some(parsed) = parse_search_term_key(key) {
            if text_keys.contains(parsed.base_key.as_str()) {
                terms.push(parsed.term);
            }
        }
    }

    let mut parts: Vec<String> = Vec::new();
    if let Some(preset) = config.preset_query() {
        parts.push(preset.to_string());
    }
    let mut seen: HashSet<String> = HashSet::new();
    for term in terms {
        let term = term.trim().to_string();
        if term.is_empty() || !seen.insert(term.clone()) {
            continue;
        }
        parts.push(term);
    }
    parts.join(" ")
}
