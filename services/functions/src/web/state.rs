//! services/functions/src/web/state.rs
//!
//! Defines the application's shared state.

use std::sync::Arc;

use launchpad_core::ports::{ChangeEvent, DatabaseService};
use launchpad_core::TrendingCallable;
use tokio::sync::mpsc;

use crate::config::Config;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn DatabaseService>,
    pub config: Arc<Config>,
    pub trending_callable: TrendingCallable,
    /// Webhook deliveries are pushed here for the change-event dispatcher.
    pub hook_sender: mpsc::Sender<ChangeEvent>,
}

impl AppState {
    pub fn new(
        db: Arc<dyn DatabaseService>,
        config: Arc<Config>,
        hook_sender: mpsc::Sender<ChangeEvent>,
    ) -> Self {
        Self {
            trending_callable: TrendingCallable::new(db.clone()),
            db,
            config,
            hook_sender,
        }
    }
}
