//! services/functions/src/web/hooks.rs
//!
//! HTTP change-event source: an upstream platform posts each new comment or
//! upvote here, and it is queued for the notification dispatcher.

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use launchpad_core::domain::EngagementKind;
use launchpad_core::ports::ChangeEvent;
use std::sync::Arc;
use tracing::{error, warn};

use crate::adapters::events::EngagementDoc;
use crate::web::state::AppState;

pub const HOOK_SECRET_HEADER: &str = "x-hook-secret";

/// Queue a newly created comment or upvote for notification.
///
/// The body is the created document: `{"userId": ..., "userInfo": {"displayName": ..., "profilePicture": ...}}`.
#[utoipa::path(
    post,
    path = "/hooks/products/{product_id}/{collection}",
    params(
        ("product_id" = String, Path, description = "Parent product id"),
        ("collection" = String, Path, description = "`comments` or `upvotes`"),
        ("x-hook-secret" = Option<String>, Header, description = "Required when the service has a hook secret configured")
    ),
    responses(
        (status = 202, description = "Event queued"),
        (status = 401, description = "Missing or wrong hook secret"),
        (status = 404, description = "Not a comment or upvote collection"),
        (status = 503, description = "Dispatcher is not running")
    )
)]
pub async fn engagement_hook_handler(
    State(state): State<Arc<AppState>>,
    Path((product_id, collection)): Path<(String, String)>,
    headers: HeaderMap,
    Json(doc): Json<EngagementDoc>,
) -> Result<StatusCode, (StatusCode, String)> {
    if let Some(secret) = &state.config.hook_secret {
        let presented = headers
            .get(HOOK_SECRET_HEADER)
            .and_then(|v| v.to_str().ok());
        if presented != Some(secret.as_str()) {
            warn!("Rejected engagement hook with a bad secret.");
            return Err((StatusCode::UNAUTHORIZED, "Invalid hook secret".to_string()));
        }
    }

    let kind = EngagementKind::from_collection(&collection).ok_or_else(|| {
        (
            StatusCode::NOT_FOUND,
            format!("Unknown collection '{}'", collection),
        )
    })?;

    let event = ChangeEvent {
        product_id,
        kind,
        engagement: doc.to_domain(),
    };
    state.hook_sender.send(event).await.map_err(|e| {
        error!("Change-event dispatcher is gone: {}", e);
        (
            StatusCode::SERVICE_UNAVAILABLE,
            "Event dispatcher unavailable".to_string(),
        )
    })?;

    Ok(StatusCode::ACCEPTED)
}
