//! services/functions/src/adapters/db.rs
//!
//! The Postgres adapter for the `DatabaseService` port. Every document lives as
//! JSONB in a single `documents` table keyed by `(collection, id)`, with
//! sub-collections addressed by path (`products/{id}/comments`). Server
//! timestamps come from the database clock.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use launchpad_core::domain::{
    AiProduct, DailyRanking, NewAiProduct, NewDailyRanking, NewNotification, Notification,
    Product, ProductStatus, RankEntry, UserProfile,
};
use launchpad_core::ports::{DatabaseService, PortError, PortResult};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

const PRODUCTS: &str = "products";
const NOTIFICATIONS: &str = "notifications";
const DAILY_RANKINGS: &str = "dailyRankings";
const AI_PRODUCTS: &str = "aiProducts";
const USERS: &str = "users";
const AUTH_TOKENS: &str = "authTokens";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A document-store adapter that implements the `DatabaseService` port.
#[derive(Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    /// Creates a new `PgDocumentStore`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

//=========================================================================================
// Document Shapes
//=========================================================================================

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProductDoc {
    name: Option<String>,
    tagline: Option<String>,
    description: Option<String>,
    website: Option<String>,
    logo_url: Option<String>,
    status: Option<String>,
    launch_date: Option<DateTime<Utc>>,
    upvote_count: Option<i64>,
    created_by: Option<String>,
}
impl ProductDoc {
    fn to_domain(self, id: String) -> Product {
        Product {
            id,
            name: self.name.unwrap_or_default(),
            tagline: self.tagline.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            website: self.website.unwrap_or_default(),
            logo_url: self.logo_url.unwrap_or_default(),
            status: ProductStatus::parse(self.status.as_deref().unwrap_or_default()),
            launch_date: self.launch_date,
            upvote_count: self.upvote_count.unwrap_or(0),
            created_by: self.created_by.unwrap_or_default(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NotificationDoc<'a> {
    user_id: &'a str,
    #[serde(rename = "type")]
    kind: &'a str,
    product_id: &'a str,
    actor_id: &'a str,
    actor_name: &'a str,
    actor_photo: &'a str,
    message: &'a str,
    read: bool,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RankEntryDoc {
    product_id: String,
    rank: u32,
    upvote_count: i64,
    name: String,
    tagline: String,
    logo_url: String,
}
impl From<RankEntry> for RankEntryDoc {
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
impl RankEntryDoc {
    fn to_domain(self) -> RankEntry {
        RankEntry {
            product_id: self.product_id,
            rank: self.rank,
            upvote_count: self.upvote_count,
            name: self.name,
            tagline: self.tagline,
            logo_url: self.logo_url,
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DailyRankingDoc {
    date: DateTime<Utc>,
    /// Filled in by the database on write.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    generated_at: Option<DateTime<Utc>>,
    top_products: Vec<RankEntryDoc>,
    total_products: usize,
}
impl DailyRankingDoc {
    fn to_domain(self, date_id: String, written_at: DateTime<Utc>) -> DailyRanking {
        DailyRanking {
            date_id,
            date: self.date,
            generated_at: self.generated_at.unwrap_or(written_at),
            top_products: self.top_products.into_iter().map(RankEntryDoc::to_domain).collect(),
            total_products: self.total_products,
        }
    }
}

#[derive(Serialize)]
struct AiProductDoc<'a> {
    name: &'a str,
    tagline: &'a str,
    description: &'a str,
    website: &'a str,
    image: &'a str,
    source: &'a str,
}

#[derive(Deserialize)]
struct UserDoc {
    role: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthTokenDoc {
    uid: String,
    expires_at: Option<DateTime<Utc>>,
}

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for PgDocumentStore {
    async fn get_product(&self, product_id: &str) -> PortResult<Option<Product>> {
        let row = sqlx::query_as::<_, (Json<ProductDoc>,)>(
            "SELECT data FROM documents WHERE collection = $1 AND id = $2",
        )
        .bind(PRODUCTS)
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(row.map(|(Json(doc),)| doc.to_domain(product_id.to_string())))
    }

    async fn list_published_products_launched_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> PortResult<Vec<Product>> {
        let rows = sqlx::query_as::<_, (String, Json<ProductDoc>)>(
            "SELECT id, data FROM documents \
             WHERE collection = $1 \
               AND data->>'status' = 'published' \
               AND (data->>'launchDate')::timestamptz >= $2 \
               AND (data->>'launchDate')::timestamptz < $3",
        )
        .bind(PRODUCTS)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(rows
            .into_iter()
            .map(|(id, Json(doc))| doc.to_domain(id))
            .collect())
    }

    async fn insert_notification(&self, notification: NewNotification) -> PortResult<Notification> {
        let id = Uuid::new_v4().to_string();
        let doc = NotificationDoc {
            user_id: &notification.user_id,
            kind: notification.kind.notification_type(),
            product_id: &notification.product_id,
            actor_id: &notification.actor_id,
            actor_name: &notification.actor_name,
            actor_photo: &notification.actor_photo,
            message: &notification.message,
            read: false,
        };

        let created_at = sqlx::query_scalar::<_, DateTime<Utc>>(
            "INSERT INTO documents (collection, id, data) \
             VALUES ($1, $2, $3::jsonb || jsonb_build_object('createdAt', now())) \
             RETURNING created_at",
        )
        .bind(NOTIFICATIONS)
        .bind(&id)
        .bind(Json(&doc))
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(Notification {
            id,
            user_id: notification.user_id,
            kind: notification.kind,
            product_id: notification.product_id,
            actor_id: notification.actor_id,
            actor_name: notification.actor_name,
            actor_photo: notification.actor_photo,
            message: notification.message,
            read: false,
            created_at,
        })
    }

    async fn put_daily_ranking(&self, ranking: NewDailyRanking) -> PortResult<DailyRanking> {
        let doc = DailyRankingDoc {
            date: ranking.date,
            generated_at: None,
            top_products: ranking.top_products.into_iter().map(RankEntryDoc::from).collect(),
            total_products: ranking.total_products,
        };

        // Full replacement, never a merge with the previous snapshot.
        let (Json(stored), written_at) = sqlx::query_as::<_, (Json<DailyRankingDoc>, DateTime<Utc>)>(
            "INSERT INTO documents (collection, id, data) \
             VALUES ($1, $2, $3::jsonb || jsonb_build_object('generatedAt', now())) \
             ON CONFLICT (collection, id) DO UPDATE SET data = EXCLUDED.data \
             RETURNING data, now()",
        )
        .bind(DAILY_RANKINGS)
        .bind(&ranking.date_id)
        .bind(Json(&doc))
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(stored.to_domain(ranking.date_id, written_at))
    }

    async fn get_daily_ranking(&self, date_id: &str) -> PortResult<Option<DailyRanking>> {
        let row = sqlx::query_as::<_, (Json<DailyRankingDoc>, DateTime<Utc>)>(
            "SELECT data, created_at FROM documents WHERE collection = $1 AND id = $2",
        )
        .bind(DAILY_RANKINGS)
        .bind(date_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(row.map(|(Json(doc), created_at)| doc.to_domain(date_id.to_string(), created_at)))
    }

    async fn ai_product_name_exists(&self, name: &str) -> PortResult<bool> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM documents \
             WHERE collection = $1 AND btrim(data->>'name') = $2)",
        )
        .bind(AI_PRODUCTS)
        .bind(name.trim())
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)
    }

    async fn insert_ai_product(&self, product: NewAiProduct) -> PortResult<AiProduct> {
        let id = Uuid::new_v4().to_string();
        let doc = AiProductDoc {
            name: &product.name,
            tagline: &product.tagline,
            description: &product.description,
            website: &product.website,
            image: &product.image,
            source: &product.source,
        };

        let created_at = sqlx::query_scalar::<_, DateTime<Utc>>(
            "INSERT INTO documents (collection, id, data) \
             VALUES ($1, $2, $3::jsonb || jsonb_build_object('createdAt', now())) \
             RETURNING created_at",
        )
        .bind(AI_PRODUCTS)
        .bind(&id)
        .bind(Json(&doc))
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(AiProduct {
            id,
            name: product.name,
            tagline: product.tagline,
            description: product.description,
            website: product.website,
            image: product.image,
            source: product.source,
            created_at,
        })
    }

    async fn get_user(&self, uid: &str) -> PortResult<Option<UserProfile>> {
        let row = sqlx::query_as::<_, (Json<UserDoc>,)>(
            "SELECT data FROM documents WHERE collection = $1 AND id = $2",
        )
        .bind(USERS)
        .bind(uid)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(row.map(|(Json(doc),)| UserProfile {
            uid: uid.to_string(),
            role: doc.role,
        }))
    }

    async fn resolve_auth_token(&self, token: &str) -> PortResult<Option<String>> {
        let row = sqlx::query_as::<_, (Json<AuthTokenDoc>,)>(
            "SELECT data FROM documents WHERE collection = $1 AND id = $2",
        )
        .bind(AUTH_TOKENS)
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;

        let now = Utc::now();
        Ok(row
            .map(|(Json(doc),)| doc)
            .filter(|doc| doc.expires_at.map_or(true, |at| at > now))
            .map(|doc| doc.uid))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn sparse_product_documents_fall_back_to_defaults() {
        let doc: ProductDoc = serde_json::from_value(serde_json::json!({
            "name": "Rocket",
            "status": "published",
            "launchDate": "2024-01-01T09:00:00.000+00:00",
            "upvoteCount": null
        }))
        .unwrap();

        let product = doc.to_domain("p1".to_string());
        assert_eq!(product.status, ProductStatus::Published);
        assert_eq!(product.upvote_count, 0);
        assert_eq!(product.logo_url, "");
        assert_eq!(product.created_by, "");
        assert_eq!(
            product.launch_date,
            Some(Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap())
        );
    }

    #[test]
    fn ranking_documents_use_camel_case_fields() {
        let doc = DailyRankingDoc {
            date: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            generated_at: None,
            top_products: vec![RankEntryDoc {
                product_id: "P2".to_string(),
                rank: 1,
                upvote_count: 20,
                name: "Two".to_string(),
                tagline: String::new(),
                logo_url: String::new(),
            }],
            total_products: 1,
        };

        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["totalProducts"], 1);
        assert_eq!(json["topProducts"][0]["productId"], "P2");
        assert_eq!(json["topProducts"][0]["upvoteCount"], 20);
        assert!(json.get("generatedAt").is_none());
    }

    #[test]
    fn notification_documents_carry_type_and_unread_flag() {
        let doc = NotificationDoc {
            user_id: "owner",
            kind: "upvote",
            product_id: "p1",
            actor_id: "alice",
            actor_name: "Alice",
            actor_photo: "",
            message: "Alice upvoted your product.",
            read: false,
        };

        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["type"], "upvote");
        assert_eq!(json["userId"], "owner");
        assert_eq!(json["read"], false);
    }
}
