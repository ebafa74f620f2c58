use crate::analytics::models::{NewEvent, NewPageview};
use crate::analytics::storage::{
    BrowserCount, CountryCount, DailyCount, EventRecord, PageCount, PageviewRecord,
    ReferrerCount, SchemaReport, WindowTotals,
};
use anyhow::Result;
use async_trait::async_trait;

pub const PAGEVIEWS_TABLE: &str = "analytics_pageviews";
pub const EVENTS_TABLE: &str = "analytics_events";

/// Persistent store for analytics rows.
///
/// Every windowed query takes `since`, a Unix timestamp in seconds; rows with
/// `created_at >= since` are inside the window.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Initialize the storage (create tables and indexes)
    async fn init(&self) -> Result<()>;

    /// Insert one pageview row
    async fn insert_pageview(&self, pageview: &NewPageview) -> Result<()>;

    /// Insert one event row
    async fn insert_event(&self, event: &NewEvent) -> Result<()>;

    /// Total pageviews, distinct visitors and distinct active UTC dates
    async fn window_totals(&self, since: i64) -> Result<WindowTotals>;

    /// Distinct visitors in the window with no pageview before `since`
    async fn new_visitor_count(&self, since: i64) -> Result<i64>;

    /// Per UTC date visitors and pageviews, oldest first
    async fn daily_trend(&self, since: i64) -> Result<Vec<DailyCount>>;

    /// Most viewed (url, title) pairs
    async fn top_pages(&self, since: i64, limit: i64) -> Result<Vec<PageCount>>;

    /// Most frequent non-empty referrers
    async fn top_referrers(&self, since: i64, limit: i64) -> Result<Vec<ReferrerCount>>;

    /// Countries ordered by distinct visitors
    async fn top_countries(&self, since: i64, limit: i64) -> Result<Vec<CountryCount>>;

    /// Distinct visitors per browser family, classified in the database
    /// with [`Browser::sql_case`](crate::analytics::Browser::sql_case)
    async fn browser_counts(&self, since: i64) -> Result<Vec<BrowserCount>>;

    /// Most recent pageviews, newest first (`cicerone-admin recent`)
    async fn recent_pageviews(&self, limit: i64) -> Result<Vec<PageviewRecord>>;

    /// Most recent events, newest first (`cicerone-admin recent --events`)
    async fn recent_events(&self, limit: i64) -> Result<Vec<EventRecord>>;

    /// Inspect the analytics schema without assuming it exists
    async fn schema_report(&self) -> Result<SchemaReport>;
}
