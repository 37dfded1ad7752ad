//! crates/launchpad_core/src/memory.rs
//!
//! An in-memory implementation of the `DatabaseService` port. It backs the unit
//! tests and lets the service run locally without a database. Nothing survives
//! a restart.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::domain::{
    AiProduct, DailyRanking, NewAiProduct, NewDailyRanking, NewNotification, Notification,
    Product, ProductStatus, UserProfile,
};
use crate::ports::{DatabaseService, PortResult};

#[derive(Debug, Default)]
struct Collections {
    products: HashMap<String, Product>,
    notifications: Vec<Notification>,
    daily_rankings: HashMap<String, DailyRanking>,
    ai_products: Vec<AiProduct>,
    users: HashMap<String, UserProfile>,
    auth_tokens: HashMap<String, (String, Option<DateTime<Utc>>)>,
}

/// Cloning shares the same underlying collections.
#[derive(Debug, Default, Clone)]
pub struct InMemoryStore {
    inner: Arc<Mutex<Collections>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a product.
    pub async fn put_product(&self, product: Product) {
        self.inner
            .lock()
            .await
            .products
            .insert(product.id.clone(), product);
    }

    pub async fn put_user(&self, user: UserProfile) {
        self.inner.lock().await.users.insert(user.uid.clone(), user);
    }

    pub async fn put_auth_token(&self, token: &str, uid: &str, expires_at: Option<DateTime<Utc>>) {
        self.inner
            .lock()
            .await
            .auth_tokens
            .insert(token.to_string(), (uid.to_string(), expires_at));
    }

    /// Snapshot of every notification written so far, in insertion order.
    pub async fn notifications(&self) -> Vec<Notification> {
        self.inner.lock().await.notifications.clone()
    }

    pub async fn ai_products(&self) -> Vec<AiProduct> {
        self.inner.lock().await.ai_products.clone()
    }
}

#[async_trait]
impl DatabaseService for InMemoryStore {
    async fn get_product(&self, product_id: &str) -> PortResult<Option<Product>> {
        Ok(self.inner.lock().await.products.get(product_id).cloned())
    }

    async fn list_published_products_launched_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> PortResult<Vec<Product>> {
        let collections = self.inner.lock().await;
        let products = collections
            .products
            .values()
            .filter(|p| p.status == ProductStatus::Published)
            .filter(|p| matches!(p.launch_date, Some(at) if at >= start && at < end))
            .cloned()
            .collect();
        Ok(products)
    }

    async fn insert_notification(&self, notification: NewNotification) -> PortResult<Notification> {
        let stored = Notification {
            id: Uuid::new_v4().to_string(),
            user_id: notification.user_id,
            kind: notification.kind,
            product_id: notification.product_id,
            actor_id: notification.actor_id,
            actor_name: notification.actor_name,
            actor_photo: notification.actor_photo,
            message: notification.message,
            read: false,
            created_at: Utc::now(),
        };
        self.inner.lock().await.notifications.push(stored.clone());
        Ok(stored)
    }

    async fn put_daily_ranking(&self, ranking: NewDailyRanking) -> PortResult<DailyRanking> {
        let stored = DailyRanking {
            date_id: ranking.date_id,
            date: ranking.date,
            generated_at: Utc::now(),
            top_products: ranking.top_products,
            total_products: ranking.total_products,
        };
        self.inner
            .lock()
            .await
            .daily_rankings
            .insert(stored.date_id.clone(), stored.clone());
        Ok(stored)
    }

    async fn get_daily_ranking(&self, date_id: &str) -> PortResult<Option<DailyRanking>> {
        Ok(self.inner.lock().await.daily_rankings.get(date_id).cloned())
    }

    async fn ai_product_name_exists(&self, name: &str) -> PortResult<bool> {
        Ok(self
            .inner
            .lock()
            .await
            .ai_products
            .iter()
            .any(|p| p.name.trim() == name.trim()))
    }

    async fn insert_ai_product(&self, product: NewAiProduct) -> PortResult<AiProduct> {
        let stored = AiProduct {
            id: Uuid::new_v4().to_string(),
            name: product.name,
            tagline: product.tagline,
            description: product.description,
            website: product.website,
            image: product.image,
            source: product.source,
            created_at: Utc::now(),
        };
        self.inner.lock().await.ai_products.push(stored.clone());
        Ok(stored)
    }

    async fn get_user(&self, uid: &str) -> PortResult<Option<UserProfile>> {
        Ok(self.inner.lock().await.users.get(uid).cloned())
    }

    async fn resolve_auth_token(&self, token: &str) -> PortResult<Option<String>> {
        let collections = self.inner.lock().await;
        let uid = collections
            .auth_tokens
            .get(token)
            .filter(|(_, expires_at)| expires_at.map_or(true, |at| at > Utc::now()))
            .map(|(uid, _)| uid.clone());
        Ok(uid)
    }
}
