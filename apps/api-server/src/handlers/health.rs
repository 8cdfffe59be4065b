//! Health check endpoint.

use actix_web::{HttpResponse, web};
use cachet_shared::dto::{CacheHealth, HealthResponse};

use crate::state::AppState;

/// Health check endpoint - returns server status and the cache backend.
///
/// GET /api/health
pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    let response = HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        cache: CacheHealth {
            backend: state.cache.backend_type().to_string(),
            available: state.cache.is_available(),
        },
    };

    HttpResponse::Ok().json(response)
}
