//! crates/launchpad_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of the managed document store, the generative APIs, and the
//! platform that delivers change events.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{
    AiProduct, DailyRanking, Engagement, EngagementKind, NewAiProduct, NewDailyRanking,
    NewNotification, Notification, Product, UserProfile,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// Read/query/write access to the document store shared by every handler.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- Products ---
    async fn get_product(&self, product_id: &str) -> PortResult<Option<Product>>;

    /// Published products whose launch date falls in `[start, end)`, in no particular order.
    async fn list_published_products_launched_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> PortResult<Vec<Product>>;

    // --- Notifications ---
    async fn insert_notification(&self, notification: NewNotification) -> PortResult<Notification>;

    // --- Daily Rankings ---
    /// Replaces whatever ranking is stored under `ranking.date_id`.
    async fn put_daily_ranking(&self, ranking: NewDailyRanking) -> PortResult<DailyRanking>;

    async fn get_daily_ranking(&self, date_id: &str) -> PortResult<Option<DailyRanking>>;

    // --- AI Products ---
    async fn ai_product_name_exists(&self, name: &str) -> PortResult<bool>;

    async fn insert_ai_product(&self, product: NewAiProduct) -> PortResult<AiProduct>;

    // --- Users & Auth ---
    async fn get_user(&self, uid: &str) -> PortResult<Option<UserProfile>>;

    /// Maps an opaque bearer token to the uid it was issued for, if still valid.
    async fn resolve_auth_token(&self, token: &str) -> PortResult<Option<String>>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TextGenerationService: Send + Sync {
    /// Sends a prompt to a generative text model and returns its raw text output.
    async fn generate_text(&self, prompt: &str) -> PortResult<String>;
}

/// A newly created comment or upvote, as delivered by a change-event source.
#[derive(Debug, Clone)]
pub struct ChangeEvent {
    pub product_id: String,
    pub kind: EngagementKind,
    pub engagement: Engagement,
}

#[async_trait]
pub trait ChangeEventSource: Send {
    /// Waits for the next event. `Ok(None)` means the source is closed for good.
    async fn next_event(&mut self) -> PortResult<Option<ChangeEvent>>;
}
