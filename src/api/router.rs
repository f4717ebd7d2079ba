//! Route table and middleware stack.

use std::env;
use std::num::NonZeroU32;
use std::sync::Arc;

use axum::{
    Router,
    extract::{Request, State},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing::warn;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::app::AppState;
use crate::domain::AppError;

use super::handlers::{
    ApiDoc, create_account_handler, create_transaction_handler, get_account_handler,
    get_account_history_handler, health_check_handler, list_accounts_handler,
    list_transactions_handler, liveness_handler, readiness_handler,
};

/// Upper bound on request bodies
const MAX_BODY_BYTES: usize = 64 * 1024;

/// Global request rate limit settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Sustained requests per second
    pub requests_per_second: u32,
    /// Requests allowed in a burst above the sustained rate
    pub burst_size: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_second: 10,
            burst_size: 20,
        }
    }
}

impl RateLimitConfig {
    /// Read `RATE_LIMIT_RPS` and `RATE_LIMIT_BURST`, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let requests_per_second = env::var("RATE_LIMIT_RPS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.requests_per_second);
        let burst_size = env::var("RATE_LIMIT_BURST")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.burst_size);
        Self {
            requests_per_second,
            burst_size,
        }
    }

    fn quota(&self) -> Quota {
        let rate = NonZeroU32::new(self.requests_per_second).unwrap_or(NonZeroU32::MIN);
        let burst = NonZeroU32::new(self.burst_size).unwrap_or(rate);
        Quota::per_second(rate).allow_burst(burst)
    }
}

fn api_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/account",
            get(list_accounts_handler).post(create_account_handler),
        )
        .route("/account/{id}", get(get_account_handler))
        .route("/account/{id}/history", get(get_account_history_handler))
        .route(
            "/transaction",
            get(list_transactions_handler).post(create_transaction_handler),
        )
        .route("/health", get(health_check_handler))
        .route("/health/live", get(liveness_handler))
        .route("/health/ready", get(readiness_handler))
        .with_state(state)
}

fn with_common_layers(router: Router) -> Router {
    router
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
                .layer(CorsLayer::permissive()),
        )
}

/// Build the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    with_common_layers(api_routes(state))
}

/// Build the application router with a global rate limit
pub fn create_router_with_rate_limit(state: Arc<AppState>, config: RateLimitConfig) -> Router {
    let limiter = Arc::new(RateLimiter::direct(config.quota()));
    let router = api_routes(state).layer(middleware::from_fn_with_state(
        limiter,
        rate_limit_middleware,
    ));
    with_common_layers(router)
}

async fn rate_limit_middleware(
    State(limiter): State<Arc<DefaultDirectRateLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    match limiter.check() {
        Ok(()) => next.run(request).await,
        Err(_) => {
            warn!(path = %request.uri().path(), "Rate limit exceeded");
            AppError::RateLimited.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{MockDatabaseClient, MockNotifier};
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    fn test_state() -> Arc<AppState> {
        Arc::new(AppState::new(
            Arc::new(MockDatabaseClient::new()),
            Arc::new(MockNotifier::new()),
        ))
    }

    #[test]
    fn test_rate_limit_config_default() {
        let config = RateLimitConfig::default();
        assert_eq!(config.requests_per_second, 10);
        assert_eq!(config.burst_size, 20);
    }

    #[test]
    fn test_zero_rate_falls_back_to_minimum() {
        let config = RateLimitConfig {
            requests_per_second: 0,
            burst_size: 0,
        };
        let quota = config.quota();
        assert_eq!(quota.burst_size(), NonZeroU32::MIN);
    }

    #[tokio::test]
    async fn test_rate_limit_rejects_after_burst() {
        let config = RateLimitConfig {
            requests_per_second: 1,
            burst_size: 2,
        };
        let router = create_router_with_rate_limit(test_state(), config);

        let mut statuses = Vec::new();
        for _ in 0..3 {
            let request = Request::builder()
                .uri("/health/live")
                .body(Body::empty())
                .unwrap();
            let response = router.clone().oneshot(request).await.unwrap();
            statuses.push(response.status());
        }

        assert_eq!(
            statuses,
            vec![StatusCode::OK, StatusCode::OK, StatusCode::TOO_MANY_REQUESTS]
        );
    }

    #[tokio::test]
    async fn test_oversized_body_rejected() {
        let router = create_router(test_state());
        let body = vec![b' '; MAX_BODY_BYTES + 1];
        let request = Request::builder()
            .method("POST")
            .uri("/account")
            .header("Content-Length", body.len())
            .body(Body::from(body))
            .unwrap();
        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_cors_preflight_allowed() {
        let router = create_router(test_state());
        let request = Request::builder()
            .method("OPTIONS")
            .uri("/account")
            .header("Origin", "http://localhost:3000")
            .header("Access-Control-Request-Method", "POST")
            .body(Body::empty())
            .unwrap();
        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(
            response
                .headers()
                .contains_key("access-control-allow-origin")
        );
    }

    #[tokio::test]
    async fn test_openapi_document_served() {
        let router = create_router(test_state());
        let request = Request::builder()
            .uri("/api-docs/openapi.json")
            .body(Body::empty())
            .unwrap();
        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
