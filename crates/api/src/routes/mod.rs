pub mod subscriptions;

use axum::{
    http::StatusCode,
    middleware::from_fn,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::{any::Any, time::Duration};
use tower_http::{catch_panic::CatchPanicLayer, timeout::TimeoutLayer};
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    error::ApiError, middleware::request_logging_middleware, openapi::ApiDoc, state::AppState,
};

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: &'static str,
    /// API version
    pub version: &'static str,
}

/// Health check endpoint
///
/// Returns the health status of the API service for load balancers and orchestration tools.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    )
)]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Turn a handler panic into a logged 500 with the usual error body
fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };
    tracing::error!(panic = %detail, "Request handler panicked");

    ApiError::internal_server_error("internal server error").into_response()
}

/// Unknown routes still answer with the usual error body
async fn route_not_found() -> ApiError {
    ApiError::not_found("route not found")
}

/// Create the application router without a request timeout
pub fn create_router(app_state: AppState) -> Router {
    build_router(app_state, None)
}

/// Create the application router, answering requests that run longer than
/// `request_timeout` with 408
pub fn create_router_with_timeout(app_state: AppState, request_timeout: Duration) -> Router {
    build_router(app_state, Some(request_timeout))
}

fn build_router(app_state: AppState, request_timeout: Option<Duration>) -> Router {
    let mut router = Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", subscriptions::create_subscriptions_router())
        .with_state(app_state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .fallback(route_not_found)
        .layer(CatchPanicLayer::custom(handle_panic));

    if let Some(timeout) = request_timeout {
        router = router.layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            timeout,
        ));
    }

    // Outermost, so panics and timeouts are logged with their final status
    router.layer(from_fn(request_logging_middleware))
}
