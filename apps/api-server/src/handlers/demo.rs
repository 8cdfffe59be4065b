//! Demo gating handlers.

use actix_web::{HttpRequest, HttpResponse, web};

use cachet_core::domain::{DemoLimitResult, format_reset_time};
use cachet_shared::ApiResponse;
use cachet_shared::dto::DemoStatusResponse;

use crate::middleware::error::{AppError, AppResult};
use crate::middleware::rate_limit::client_key;
use crate::state::AppState;

const MAX_SCENARIO_LEN: usize = 64;

fn status_response(result: DemoLimitResult) -> DemoStatusResponse {
    let (count, scenarios_viewed) = match result.usage {
        Some(usage) => (usage.count, usage.scenarios_viewed.into_iter().collect()),
        None => (0, Vec::new()),
    };

    DemoStatusResponse {
        allowed: result.allowed,
        remaining: result.remaining,
        limit: result.limit,
        reset_in_seconds: result.reset_in_seconds,
        reset_in: format_reset_time(result.reset_in_seconds as i64),
        count,
        scenarios_viewed,
    }
}

/// GET /api/demo/status
pub async fn demo_status(state: web::Data<AppState>, req: HttpRequest) -> HttpResponse {
    let status = state.demo.check_demo_limit(&client_key(&req)).await;
    HttpResponse::Ok().json(ApiResponse::ok(status_response(status)))
}

/// POST /api/demo/{scenario}
pub async fn run_demo(
    state: web::Data<AppState>,
    req: HttpRequest,
    scenario: web::Path<String>,
) -> AppResult<HttpResponse> {
    let scenario = scenario.into_inner();
    if scenario.is_empty() || scenario.len() > MAX_SCENARIO_LEN {
        return Err(AppError::BadRequest("Invalid scenario".to_string()));
    }

    let client = client_key(&req);
    let status = state.demo.check_demo_limit(&client).await;
    if !status.allowed {
        return Err(AppError::QuotaExceeded {
            reset_in_seconds: status.reset_in_seconds,
        });
    }

    let updated = state.demo.record_demo_usage(&client, &scenario).await;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(status_response(updated))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use actix_web::{App, http::StatusCode, test};
    use cachet_core::domain::CacheConfig;
    use cachet_infra::CacheProvider;

    #[actix_web::test]
    async fn test_demo_quota_flow() {
        let cache = Arc::new(CacheProvider::in_memory(CacheConfig::default()));
        let state = AppState::with_cache(cache);

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .route("/demo/status", web::get().to(demo_status))
                .route("/demo/{scenario}", web::post().to(run_demo)),
        )
        .await;

        for _ in 0..3 {
            let req = test::TestRequest::post().uri("/demo/saas").to_request();
            let res = test::call_service(&app, req).await;
            assert_eq!(res.status(), StatusCode::OK);
        }

        let req = test::TestRequest::get().uri("/demo/status").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["count"], 3);
        assert_eq!(body["data"]["remaining"], 0);
        assert_eq!(body["data"]["scenariosViewed"], serde_json::json!(["saas"]));

        let req = test::TestRequest::post().uri("/demo/saas").to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
    }
}
