//! crates/launchpad_core/src/notifications.rs
//!
//! Turns a new comment or upvote into a notification for the product owner.

use std::sync::Arc;

use tracing::{debug, info};

use crate::domain::{Engagement, EngagementKind, NewNotification, Notification};
use crate::ports::{ChangeEvent, DatabaseService, PortResult};

#[derive(Clone)]
pub struct NotificationWriter {
    db: Arc<dyn DatabaseService>,
}

impl NotificationWriter {
    pub fn new(db: Arc<dyn DatabaseService>) -> Self {
        Self { db }
    }

    /// Writes one notification for the owner of `product_id`, unless the product is
    /// gone, has no owner, or the owner is the one who acted. Store failures propagate.
    pub async fn notify_owner(
        &self,
        product_id: &str,
        kind: EngagementKind,
        engagement: &Engagement,
    ) -> PortResult<Option<Notification>> {
        let Some(product) = self.db.get_product(product_id).await? else {
            debug!("Product {} not found; skipping {:?} notification.", product_id, kind);
            return Ok(None);
        };

        let owner_id = product.created_by.as_str();
        if owner_id.is_empty() || owner_id == engagement.user_id {
            return Ok(None);
        }

        let notification = NewNotification::for_engagement(owner_id, product_id, kind, engagement);
        let stored = self.db.insert_notification(notification).await?;
        info!(
            "Notified {} of {} on product {}.",
            stored.user_id,
            kind.notification_type(),
            product_id
        );
        Ok(Some(stored))
    }

    pub async fn handle_event(&self, event: &ChangeEvent) -> PortResult<Option<Notification>> {
        self.notify_owner(&event.product_id, event.kind, &event.engagement)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ActorInfo, Product, ProductStatus};
    use crate::memory::InMemoryStore;
    use crate::ports::{MockDatabaseService, PortError};

    fn rocket(owner: &str) -> Product {
        Product {
            id: "p1".to_string(),
            name: "Rocket".to_string(),
            tagline: String::new(),
            description: String::new(),
            website: String::new(),
            logo_url: String::new(),
            status: ProductStatus::Published,
            launch_date: None,
            upvote_count: 0,
            created_by: owner.to_string(),
        }
    }

    async fn store_with_product(owner: &str) -> InMemoryStore {
        let store = InMemoryStore::new();
        store.put_product(rocket(owner)).await;
        store
    }

    fn engagement(user_id: &str, name: Option<&str>) -> Engagement {
        Engagement {
            user_id: user_id.to_string(),
            user_info: ActorInfo {
                display_name: name.map(str::to_string),
                profile_picture: None,
            },
        }
    }

    #[tokio::test]
    async fn comment_from_another_user_notifies_owner() {
        let store = store_with_product("owner").await;
        let writer = NotificationWriter::new(Arc::new(store.clone()));

        let written = writer
            .notify_owner("p1", EngagementKind::Comment, &engagement("alice", Some("Alice")))
            .await
            .unwrap()
            .expect("notification should be written");

        assert_eq!(written.user_id, "owner");
        assert_eq!(written.actor_id, "alice");
        assert_eq!(written.actor_name, "Alice");
        assert_eq!(written.actor_photo, "");
        assert_eq!(written.message, "Alice commented on your product.");
        assert!(!written.read);
        assert_eq!(store.notifications().await.len(), 1);
    }

    #[tokio::test]
    async fn upvote_without_display_name_uses_placeholder() {
        let store = store_with_product("owner").await;
        let writer = NotificationWriter::new(Arc::new(store.clone()));

        let written = writer
            .notify_owner("p1", EngagementKind::Upvote, &engagement("bob", None))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(written.kind, EngagementKind::Upvote);
        assert_eq!(written.message, "Someone upvoted your product.");
    }

    #[tokio::test]
    async fn owner_engaging_with_own_product_is_silent() {
        let store = store_with_product("owner").await;
        let writer = NotificationWriter::new(Arc::new(store.clone()));

        for kind in [EngagementKind::Comment, EngagementKind::Upvote] {
            let result = writer
                .notify_owner("p1", kind, &engagement("owner", Some("Me")))
                .await
                .unwrap();
            assert!(result.is_none());
        }
        assert!(store.notifications().await.is_empty());
    }

    #[tokio::test]
    async fn missing_product_or_owner_is_a_no_op() {
        let store = store_with_product("").await;
        let writer = NotificationWriter::new(Arc::new(store.clone()));

        let ownerless = writer
            .notify_owner("p1", EngagementKind::Comment, &engagement("alice", None))
            .await
            .unwrap();
        let missing = writer
            .notify_owner("nope", EngagementKind::Upvote, &engagement("alice", None))
            .await
            .unwrap();

        assert!(ownerless.is_none());
        assert!(missing.is_none());
        assert!(store.notifications().await.is_empty());
    }

    #[tokio::test]
    async fn product_read_failure_propagates() {
        let mut db = MockDatabaseService::new();
        db.expect_get_product()
            .times(1)
            .returning(|_| Err(PortError::Unexpected("store offline".to_string())));
        db.expect_insert_notification().never();
        let writer = NotificationWriter::new(Arc::new(db));

        let err = writer
            .notify_owner("p1", EngagementKind::Comment, &engagement("alice", None))
            .await
            .unwrap_err();

        assert!(matches!(err, PortError::Unexpected(msg) if msg == "store offline"));
    }

    #[tokio::test]
    async fn notification_write_failure_propagates() {
        let mut db = MockDatabaseService::new();
        db.expect_get_product()
            .returning(|_| Ok(Some(rocket("owner"))));
        db.expect_insert_notification()
            .times(1)
            .withf(|n| n.user_id == "owner" && n.actor_id == "alice")
            .returning(|_| Err(PortError::Unexpected("write rejected".to_string())));
        let writer = NotificationWriter::new(Arc::new(db));

        let result = writer
            .notify_owner("p1", EngagementKind::Upvote, &engagement("alice", Some("Alice")))
            .await;

        assert!(result.is_err());
    }
}
