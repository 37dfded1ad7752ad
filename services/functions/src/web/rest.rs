//! services/functions/src/web/rest.rs
//!
//! Contains the Axum handlers for the HTTP endpoints and the master
//! definition for the OpenAPI specification.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    Extension,
};
use chrono::{DateTime, Utc};
use launchpad_core::domain::{DailyRanking, RankEntry};
use launchpad_core::CallableError;
use serde::Serialize;
use std::sync::Arc;
use tracing::error;
use utoipa::{OpenApi, ToSchema};

use crate::web::{hooks, middleware::AuthContext, state::AppState};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        generate_daily_trending_now_handler,
        get_daily_ranking_handler,
        hooks::engagement_hook_handler,
    ),
    components(
        schemas(
            CallableResult,
            DateIdPayload,
            CallableErrorBody,
            CallableErrorDetail,
            DailyRankingResponse,
            RankEntryResponse
        )
    ),
    tags(
        (name = "Launchpad Functions", description = "Trending, notification and AI listing handlers for the launch platform.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DateIdPayload {
    date_id: String,
}

/// Successful callable response envelope.
#[derive(Serialize, ToSchema)]
pub struct CallableResult {
    result: DateIdPayload,
}

#[derive(Serialize, ToSchema)]
pub struct CallableErrorDetail {
    status: String,
    message: String,
}

/// Failed callable response envelope.
#[derive(Serialize, ToSchema)]
pub struct CallableErrorBody {
    error: CallableErrorDetail,
}

fn callable_error_response(err: CallableError) -> Response {
    let (status, tag) = match &err {
        CallableError::Unauthenticated => (StatusCode::UNAUTHORIZED, "UNAUTHENTICATED"),
        CallableError::PermissionDenied => (StatusCode::FORBIDDEN, "PERMISSION_DENIED"),
        CallableError::Port(e) => {
            error!("On-demand trending build failed: {:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL")
        }
    };
    let message = match err {
        CallableError::Port(_) => "Internal error".to_string(),
        other => other.to_string(),
    };
    let body = CallableErrorBody {
        error: CallableErrorDetail {
            status: tag.to_string(),
            message,
        },
    };
    (status, Json(body)).into_response()
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RankEntryResponse {
    product_id: String,
    rank: u32,
    upvote_count: i64,
    name: String,
    tagline: String,
    logo_url: String,
}

impl From<RankEntry> for RankEntryResponse {
    fn from(entry: RankEntry) -> Self {
        Self {
            product_id: entry.product_id,
            rank: entry.rank,
            upvote_count: entry.upvote_count,
            name: entry.name,
            tagline: entry.tagline,
            logo_url: entry.logo_url,
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DailyRankingResponse {
    date_id: String,
    date: DateTime<Utc>,
    generated_at: DateTime<Utc>,
    top_products: Vec<RankEntryResponse>,
    total_products: usize,
}

impl From<DailyRanking> for DailyRankingResponse {
    fn from(ranking: DailyRanking) -> Self {
        Self {
            date_id: ranking.date_id,
            date: ranking.date,
            generated_at: ranking.generated_at,
            top_products: ranking.top_products.into_iter().map(Into::into).collect(),
            total_products: ranking.total_products,
        }
    }
}

//=========================================================================================
// Handlers
//=========================================================================================

/// Rebuild today's trending snapshot on demand. Admins only.
#[utoipa::path(
    post,
    path = "/generateDailyTrendingNow",
    responses(
        (status = 200, description = "Snapshot rebuilt", body = CallableResult),
        (status = 401, description = "No valid bearer token", body = CallableErrorBody),
        (status = 403, description = "Caller is not an admin", body = CallableErrorBody),
        (status = 500, description = "Internal server error", body = CallableErrorBody)
    )
)]
pub async fn generate_daily_trending_now_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
) -> Response {
    match state
        .trending_callable
        .generate_daily_trending_now(auth.caller.as_ref(), Utc::now())
        .await
    {
        Ok(date_id) => Json(CallableResult {
            result: DateIdPayload { date_id },
        })
        .into_response(),
        Err(e) => callable_error_response(e),
    }
}

/// Read the stored ranking for one UTC day.
#[utoipa::path(
    get,
    path = "/rankings/{date_id}",
    params(("date_id" = String, Path, description = "UTC day as YYYY-MM-DD")),
    responses(
        (status = 200, description = "Stored ranking", body = DailyRankingResponse),
        (status = 404, description = "No ranking for that day"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn get_daily_ranking_handler(
    State(state): State<Arc<AppState>>,
    Path(date_id): Path<String>,
) -> Result<Json<DailyRankingResponse>, (StatusCode, String)> {
    let ranking = state.db.get_daily_ranking(&date_id).await.map_err(|e| {
        error!("Failed to read ranking {}: {:?}", date_id, e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to read ranking".to_string(),
        )
    })?;

    ranking
        .map(|r| Json(r.into()))
        .ok_or_else(|| (StatusCode::NOT_FOUND, format!("No ranking for {}", date_id)))
}

pub async fn health_handler() -> &'static str {
    "ok"
}
