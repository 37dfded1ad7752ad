pub mod hooks;
pub mod middleware;
pub mod rest;
pub mod state;

pub use middleware::{identify_caller, AuthContext};
pub use rest::ApiDoc;
pub use state::AppState;

use axum::{
    http::{header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE}, HeaderValue, Method},
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::error::ApiError;

/// Builds the full HTTP router: callable, ranking read, webhook, health.
pub fn router(app_state: Arc<AppState>) -> Result<Router, ApiError> {
    let origin = app_state
        .config
        .allowed_origin
        .parse::<HeaderValue>()
        .map_err(|e| ApiError::Internal(format!("Invalid ALLOWED_ORIGIN: {}", e)))?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);

    // Callable routes see the resolved caller
    let callable_routes = Router::new()
        .route(
            "/generateDailyTrendingNow",
            post(rest::generate_daily_trending_now_handler),
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            identify_caller,
        ));

    let public_routes = Router::new()
        .route("/rankings/{date_id}", get(rest::get_daily_ranking_handler))
        .route(
            "/hooks/products/{product_id}/{collection}",
            post(hooks::engagement_hook_handler),
        )
        .route("/healthz", get(rest::health_handler));

    Ok(Router::new()
        .merge(callable_routes)
        .merge(public_routes)
        .layer(cors)
        .with_state(app_state))
}
