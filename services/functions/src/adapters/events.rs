//! services/functions/src/adapters/events.rs
//!
//! Change-event sources: where "a comment/upvote was just created" comes from.
//! `PgChangeListener` follows the `engagement_created` channel fed by the
//! trigger in the migrations; `ChannelEventSource` drains events pushed by the
//! webhook route.

use async_trait::async_trait;
use launchpad_core::domain::{ActorInfo, Engagement, EngagementKind};
use launchpad_core::ports::{ChangeEvent, ChangeEventSource, PortError, PortResult};
use serde::Deserialize;
use sqlx::postgres::PgListener;
use sqlx::PgPool;
use tokio::sync::mpsc;
use tracing::warn;
use utoipa::ToSchema;

/// Postgres channel the engagement trigger notifies on.
pub const ENGAGEMENT_CHANNEL: &str = "engagement_created";

//=========================================================================================
// Wire Shapes
//=========================================================================================

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserInfoDoc {
    pub display_name: Option<String>,
    pub profile_picture: Option<String>,
}

/// A comment or upvote document as stored under a product.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EngagementDoc {
    pub user_id: Option<String>,
    pub user_info: Option<UserInfoDoc>,
}

impl EngagementDoc {
    pub fn to_domain(self) -> Engagement {
        let user_info = self.user_info.unwrap_or_default();
        Engagement {
            user_id: self.user_id.unwrap_or_default(),
            user_info: ActorInfo {
                display_name: user_info.display_name,
                profile_picture: user_info.profile_picture,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct EngagementNotice {
    collection: String,
    #[serde(flatten)]
    doc: EngagementDoc,
}

/// Splits `products/{product_id}/{comments|upvotes}` into its product id and kind.
pub fn parse_engagement_path(collection: &str) -> Option<(String, EngagementKind)> {
    let mut parts = collection.split('/');
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some("products"), Some(product_id), Some(sub), None) if !product_id.is_empty() => {
            EngagementKind::from_collection(sub).map(|kind| (product_id.to_string(), kind))
        }
        _ => None,
    }
}

fn parse_notice(payload: &str) -> Result<ChangeEvent, String> {
    let notice: EngagementNotice =
        serde_json::from_str(payload).map_err(|e| format!("malformed payload: {e}"))?;
    let (product_id, kind) = parse_engagement_path(&notice.collection)
        .ok_or_else(|| format!("not an engagement collection: {}", notice.collection))?;
    Ok(ChangeEvent {
        product_id,
        kind,
        engagement: notice.doc.to_domain(),
    })
}

//=========================================================================================
// Postgres LISTEN Source
//=========================================================================================

pub struct PgChangeListener {
    listener: PgListener,
}

impl PgChangeListener {
    pub async fn connect(pool: &PgPool) -> Result<Self, sqlx::Error> {
        let mut listener = PgListener::connect_with(pool).await?;
        listener.listen(ENGAGEMENT_CHANNEL).await?;
        Ok(Self { listener })
    }
}

#[async_trait]
impl ChangeEventSource for PgChangeListener {
    async fn next_event(&mut self) -> PortResult<Option<ChangeEvent>> {
        loop {
            let notification = self
                .listener
                .recv()
                .await
                .map_err(|e| PortError::Unexpected(e.to_string()))?;

            match parse_notice(notification.payload()) {
                Ok(event) => return Ok(Some(event)),
                Err(reason) => warn!("Ignoring {} notice: {}", ENGAGEMENT_CHANNEL, reason),
            }
        }
    }
}

//=========================================================================================
// In-Process Channel Source
//=========================================================================================

/// Creates a webhook-fed source and the sender the HTTP layer pushes into.
pub fn channel_source(capacity: usize) -> (mpsc::Sender<ChangeEvent>, ChannelEventSource) {
    let (tx, rx) = mpsc::channel(capacity);
    (tx, ChannelEventSource { rx })
}

pub struct ChannelEventSource {
    rx: mpsc::Receiver<ChangeEvent>,
}

#[async_trait]
impl ChangeEventSource for ChannelEventSource {
    async fn next_event(&mut self) -> PortResult<Option<ChangeEvent>> {
        Ok(self.rx.recv().await)
    }
}
