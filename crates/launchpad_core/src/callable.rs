//! crates/launchpad_core/src/callable.rs
//!
//! The admin-only, on-demand rebuild of today's trending snapshot.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::domain::CallerIdentity;
use crate::ports::{DatabaseService, PortError};
use crate::trending::TrendingAggregator;

/// Why a callable request was refused or failed.
#[derive(Debug, thiserror::Error)]
pub enum CallableError {
    #[error("Login required")]
    Unauthenticated,
    #[error("Admins only")]
    PermissionDenied,
    #[error(transparent)]
    Port(#[from] PortError),
}

#[derive(Clone)]
pub struct TrendingCallable {
    db: Arc<dyn DatabaseService>,
    aggregator: TrendingAggregator,
}

impl TrendingCallable {
    pub fn new(db: Arc<dyn DatabaseService>) -> Self {
        Self {
            aggregator: TrendingAggregator::new(db.clone()),
            db,
        }
    }

    /// Rebuilds the ranking for the day containing `now` on behalf of `caller`,
    /// who must be signed in and hold the admin role.
    pub async fn generate_daily_trending_now(
        &self,
        caller: Option<&CallerIdentity>,
        now: DateTime<Utc>,
    ) -> Result<String, CallableError> {
        let caller = caller.ok_or(CallableError::Unauthenticated)?;

        let is_admin = self
            .db
            .get_user(&caller.uid)
            .await?
            .is_some_and(|user| user.is_admin());
        if !is_admin {
            warn!("User {} denied on-demand trending build.", caller.uid);
            return Err(CallableError::PermissionDenied);
        }

        info!("User {} requested an on-demand trending build.", caller.uid);
        Ok(self.aggregator.build_trending(now).await?)
    }
}
