//! crates/launchpad_core/src/trending.rs
//!
//! Builds the daily trending snapshot: the published products launched on a UTC
//! day, ranked and stored under the day's `YYYY-MM-DD` key. Re-running for the
//! same day overwrites the previous snapshot.

use std::cmp::Ordering;
use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveTime, Utc};
use tracing::info;

use crate::domain::{NewDailyRanking, Product, RankEntry};
use crate::ports::{DatabaseService, PortResult};

/// Maximum number of entries in a daily ranking.
pub const MAX_RANKED_PRODUCTS: usize = 50;

/// The half-open UTC calendar day `[start, end)` containing `instant`.
pub fn utc_day_window(instant: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = instant.date_naive().and_time(NaiveTime::MIN).and_utc();
    (start, start + Duration::days(1))
}

pub fn date_id(day_start: DateTime<Utc>) -> String {
    day_start.format("%Y-%m-%d").to_string()
}

/// Launch date ascending, then upvotes descending. Product id breaks any remaining
/// tie so the result does not depend on the store's iteration order.
fn launch_then_upvotes(a: &Product, b: &Product) -> Ordering {
    a.launch_date
        .cmp(&b.launch_date)
        .then_with(|| b.upvote_count.cmp(&a.upvote_count))
        .then_with(|| a.id.cmp(&b.id))
}

/// Orders, truncates to [`MAX_RANKED_PRODUCTS`], and numbers the products from 1.
pub fn rank_products(mut products: Vec<Product>) -> Vec<RankEntry> {
    products.sort_by(launch_then_upvotes);
    products.truncate(MAX_RANKED_PRODUCTS);

    products
        .into_iter()
        .zip(1u32..)
        .map(|(product, rank)| RankEntry {
            product_id: product.id,
            rank,
            upvote_count: product.upvote_count,
            name: product.name,
            tagline: product.tagline,
            logo_url: product.logo_url,
        })
        .collect()
}

#[derive(Clone)]
pub struct TrendingAggregator {
    db: Arc<dyn DatabaseService>,
}

impl TrendingAggregator {
    pub fn new(db: Arc<dyn DatabaseService>) -> Self {
        Self { db }
    }

    /// Computes and stores the ranking for the UTC day containing `target`,
    /// returning the day's date id.
    pub async fn build_trending(&self, target: DateTime<Utc>) -> PortResult<String> {
        let (start, end) = utc_day_window(target);
        let products = self
            .db
            .list_published_products_launched_between(start, end)
            .await?;

        let top_products = rank_products(products);
        let date_id = date_id(start);
        let total_products = top_products.len();

        self.db
            .put_daily_ranking(NewDailyRanking {
                date_id: date_id.clone(),
                date: start,
                top_products,
                total_products,
            })
            .await?;

        info!("Daily ranking {} built with {} products.", date_id, total_products);
        Ok(date_id)
    }
}
