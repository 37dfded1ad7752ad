//! services/functions/src/web/middleware.rs
//!
//! Resolves the caller behind a request for the callable endpoints.

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::Response,
};
use launchpad_core::domain::CallerIdentity;
use std::sync::Arc;
use tracing::error;

use crate::web::state::AppState;

/// Who is calling, if anyone. Always present in the extensions of requests
/// that went through [`identify_caller`].
#[derive(Debug, Clone, Default)]
pub struct AuthContext {
    pub caller: Option<CallerIdentity>,
}

fn bearer_token(req: &Request) -> Option<&str> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Middleware that resolves the bearer token and records the caller.
///
/// A missing or unknown token is not rejected here; the handler decides what an
/// anonymous caller may do. Only a failing token lookup ends the request.
pub async fn identify_caller(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let token = bearer_token(&req).map(str::to_owned);
    let caller = match token {
        Some(token) => state
            .db
            .resolve_auth_token(&token)
            .await
            .map_err(|e| {
                error!("Failed to resolve auth token: {:?}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            })?
            .map(|uid| CallerIdentity { uid }),
        None => None,
    };

    req.extensions_mut().insert(AuthContext { caller });
    Ok(next.run(req).await)
}
