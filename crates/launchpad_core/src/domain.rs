//! crates/launchpad_core/src/domain.rs
//!
//! Defines the pure, core data structures for the launch platform.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, Utc};

/// Publication state of a product listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProductStatus {
    Draft,
    Published,
    /// Any state this service does not act on (archived, rejected, ...).
    Other(String),
}

impl ProductStatus {
    pub fn as_str(&self) -> &str {
        match self {
            ProductStatus::Draft => "draft",
            ProductStatus::Published => "published",
            ProductStatus::Other(s) => s,
        }
    }

    pub fn parse(raw: &str) -> Self {
        match raw {
            "draft" => ProductStatus::Draft,
            "published" => ProductStatus::Published,
            other => ProductStatus::Other(other.to_string()),
        }
    }
}

/// A product launched on the platform. Created and edited elsewhere.
#[derive(Debug, Clone)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub tagline: String,
    pub description: String,
    pub website: String,
    pub logo_url: String,
    pub status: ProductStatus,
    pub launch_date: Option<DateTime<Utc>>,
    pub upvote_count: i64,
    /// Owning user id; empty when the product has no recorded owner.
    pub created_by: String,
}

// Denormalized actor info carried on comments and upvotes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActorInfo {
    pub display_name: Option<String>,
    pub profile_picture: Option<String>,
}

/// Whether an engagement is a comment or an upvote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngagementKind {
    Comment,
    Upvote,
}

impl EngagementKind {
    /// Name of the product sub-collection holding this kind of record.
    pub fn collection(self) -> &'static str {
        match self {
            EngagementKind::Comment => "comments",
            EngagementKind::Upvote => "upvotes",
        }
    }

    pub fn from_collection(name: &str) -> Option<Self> {
        match name {
            "comments" => Some(EngagementKind::Comment),
            "upvotes" => Some(EngagementKind::Upvote),
            _ => None,
        }
    }

    /// The `type` tag stored on notifications.
    pub fn notification_type(self) -> &'static str {
        match self {
            EngagementKind::Comment => "comment",
            EngagementKind::Upvote => "upvote",
        }
    }

    fn verb(self) -> &'static str {
        match self {
            EngagementKind::Comment => "commented on",
            EngagementKind::Upvote => "upvoted",
        }
    }
}

/// A comment or upvote sub-record of a product.
#[derive(Debug, Clone, Default)]
pub struct Engagement {
    pub user_id: String,
    pub user_info: ActorInfo,
}

/// A notification ready to be written; the store assigns id and timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotification {
    pub user_id: String,
    pub kind: EngagementKind,
    pub product_id: String,
    pub actor_id: String,
    pub actor_name: String,
    pub actor_photo: String,
    pub message: String,
}

impl NewNotification {
    const ANONYMOUS_ACTOR: &'static str = "Someone";

    /// Builds the notification telling `owner_id` about `engagement` on `product_id`.
    pub fn for_engagement(
        owner_id: &str,
        product_id: &str,
        kind: EngagementKind,
        engagement: &Engagement,
    ) -> Self {
        let actor_name = engagement
            .user_info
            .display_name
            .clone()
            .unwrap_or_else(|| Self::ANONYMOUS_ACTOR.to_string());
        let message = format!("{} {} your product.", actor_name, kind.verb());

        Self {
            user_id: owner_id.to_string(),
            kind,
            product_id: product_id.to_string(),
            actor_id: engagement.user_id.clone(),
            actor_photo: engagement.user_info.profile_picture.clone().unwrap_or_default(),
            actor_name,
            message,
        }
    }
}

/// A persisted notification. Written once, never mutated here.
#[derive(Debug, Clone)]
pub struct Notification {
    pub id: String,
    pub user_id: String,
    pub kind: EngagementKind,
    pub product_id: String,
    pub actor_id: String,
    pub actor_name: String,
    pub actor_photo: String,
    pub message: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

/// One row of a daily ranking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankEntry {
    pub product_id: String,
    pub rank: u32,
    pub upvote_count: i64,
    pub name: String,
    pub tagline: String,
    pub logo_url: String,
}

/// A ranking snapshot to store under `date_id`; the store stamps `generated_at`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDailyRanking {
    pub date_id: String,
    pub date: DateTime<Utc>,
    pub top_products: Vec<RankEntry>,
    pub total_products: usize,
}

/// A stored daily ranking, keyed by its `YYYY-MM-DD` date id.
#[derive(Debug, Clone)]
pub struct DailyRanking {
    pub date_id: String,
    pub date: DateTime<Utc>,
    pub generated_at: DateTime<Utc>,
    pub top_products: Vec<RankEntry>,
    pub total_products: usize,
}

/// An AI-sourced listing ready to be written; the store assigns id and timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAiProduct {
    pub name: String,
    pub tagline: String,
    pub description: String,
    pub website: String,
    pub image: String,
    pub source: String,
}

/// An AI-sourced product listing.
#[derive(Debug, Clone)]
pub struct AiProduct {
    pub id: String,
    pub name: String,
    pub tagline: String,
    pub description: String,
    pub website: String,
    pub image: String,
    pub source: String,
    pub created_at: DateTime<Utc>,
}

/// A platform user, as far as authorization is concerned.
#[derive(Debug, Clone)]
pub struct UserProfile {
    pub uid: String,
    pub role: Option<String>,
}

impl UserProfile {
    pub const ADMIN_ROLE: &'static str = "admin";

    pub fn is_admin(&self) -> bool {
        self.role.as_deref() == Some(Self::ADMIN_ROLE)
    }
}

/// The authenticated identity behind a callable request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    pub uid: String,
}
