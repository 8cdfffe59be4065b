//! HTTP handlers and route configuration.

mod demo;
mod health;

use actix_web::web;

use cachet_core::domain::RateLimitPreset;

use crate::middleware::rate_limit::RateLimitMiddleware;
use crate::state::AppState;

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig, state: &AppState) {
    cfg.service(
        web::scope("/api")
            .wrap(RateLimitMiddleware::new(
                state.rate_limiter.clone(),
                RateLimitPreset::Api.config(),
            ))
            // Public routes
            .route("/health", web::get().to(health::health_check))
            // Demo routes
            .service(
                web::scope("/demo")
                    .route("/status", web::get().to(demo::demo_status))
                    .route("/{scenario}", web::post().to(demo::run_demo)),
            ),
    );
}
