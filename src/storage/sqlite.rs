use crate::analytics::browser::Browser;
use crate::analytics::models::{NewEvent, NewPageview};
use crate::analytics::storage::{
    BrowserCount, CountryCount, DailyCount, EventRecord, PageCount, PageviewRecord, ReferrerCount,
    SchemaReport, WindowTotals,
};
use crate::storage::Storage;
use anyhow::Result;
use async_trait::async_trait;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::sync::{Arc, LazyLock};

/// Distinct visitors per browser family; the classification runs in SQL
static BROWSER_COUNTS_QUERY: LazyLock<String> = LazyLock::new(|| {
    format!(
        r#"
        SELECT
            {} AS browser,
            COUNT(DISTINCT visitor_hash) AS visitors
        FROM analytics_pageviews
        WHERE created_at >= ?
        GROUP BY 1
        ORDER BY 2 DESC
        "#,
        Browser::sql_case(|token| format!("instr(user_agent, '{}') > 0", token))
    )
});

pub struct SqliteStorage {
    pool: Arc<SqlitePool>,
}

impl SqliteStorage {
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self {
            pool: Arc::new(pool),
        })
    }
}

#[async_trait]
impl Storage for SqliteStorage {
    async fn init(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS analytics_pageviews (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                url TEXT NOT NULL,
                referrer TEXT,
                title TEXT,
                screen TEXT,
                language TEXT,
                country TEXT,
                visitor_hash TEXT NOT NULL,
                user_agent TEXT,
                created_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(self.pool.as_ref())
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_pageviews_created_at ON analytics_pageviews(created_at)",
        )
        .execute(self.pool.as_ref())
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_pageviews_visitor_hash ON analytics_pageviews(visitor_hash)",
        )
        .execute(self.pool.as_ref())
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS analytics_events (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                event_name TEXT NOT NULL,
                event_data TEXT,
                url TEXT NOT NULL,
                visitor_hash TEXT NOT NULL,
                created_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(self.pool.as_ref())
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_events_created_at ON analytics_events(created_at)",
        )
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }

    async fn insert_pageview(&self, pageview: &NewPageview) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO analytics_pageviews
                (url, referrer, title, screen, language, country, visitor_hash, user_agent, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&pageview.url)
        .bind(&pageview.referrer)
        .bind(&pageview.title)
        .bind(&pageview.screen)
        .bind(&pageview.language)
        .bind(&pageview.country)
        .bind(&pageview.visitor_hash)
        .bind(&pageview.user_agent)
        .bind(pageview.created_at)
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }

    async fn insert_event(&self, event: &NewEvent) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO analytics_events (event_name, event_data, url, visitor_hash, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&event.event_name)
        .bind(&event.event_data)
        .bind(&event.url)
        .bind(&event.visitor_hash)
        .bind(event.created_at)
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }

    async fn window_totals(&self, since: i64) -> Result<WindowTotals> {
        let totals = sqlx::query_as::<_, WindowTotals>(
            r#"
            SELECT
                COUNT(*) AS total_pageviews,
                COUNT(DISTINCT visitor_hash) AS unique_visitors,
                COUNT(DISTINCT date(created_at, 'unixepoch')) AS active_days
            FROM analytics_pageviews
            WHERE created_at >= ?
            "#,
        )
        .bind(since)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(totals)
    }

    async fn new_visitor_count(&self, since: i64) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(DISTINCT visitor_hash)
            FROM analytics_pageviews
            WHERE created_at >= ?
              AND visitor_hash NOT IN (
                  SELECT visitor_hash FROM analytics_pageviews WHERE created_at < ?
              )
            "#,
        )
        .bind(since)
        .bind(since)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(count)
    }

    async fn daily_trend(&self, since: i64) -> Result<Vec<DailyCount>> {
        let days = sqlx::query_as::<_, DailyCount>(
            r#"
            SELECT
                date(created_at, 'unixepoch') AS "date",
                COUNT(DISTINCT visitor_hash) AS visitors,
                COUNT(*) AS pageviews
            FROM analytics_pageviews
            WHERE created_at >= ?
            GROUP BY date(created_at, 'unixepoch')
            ORDER BY "date" ASC
            "#,
        )
        .bind(since)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(days)
    }

    async fn top_pages(&self, since: i64, limit: i64) -> Result<Vec<PageCount>> {
        let pages = sqlx::query_as::<_, PageCount>(
            r#"
            SELECT
                url,
                title,
                COUNT(*) AS views,
                COUNT(DISTINCT visitor_hash) AS unique_visitors
            FROM analytics_pageviews
            WHERE created_at >= ?
            GROUP BY url, title
            ORDER BY views DESC, url ASC
            LIMIT ?
            "#,
        )
        .bind(since)
        .bind(limit)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(pages)
    }

    async fn top_referrers(&self, since: i64, limit: i64) -> Result<Vec<ReferrerCount>> {
        let referrers = sqlx::query_as::<_, ReferrerCount>(
            r#"
            SELECT
                referrer,
                COUNT(*) AS visits,
                COUNT(DISTINCT visitor_hash) AS unique_visitors
            FROM analytics_pageviews
            WHERE created_at >= ? AND referrer IS NOT NULL AND referrer != ''
            GROUP BY referrer
            ORDER BY visits DESC, referrer ASC
            LIMIT ?
            "#,
        )
        .bind(since)
        .bind(limit)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(referrers)
    }

    async fn top_countries(&self, since: i64, limit: i64) -> Result<Vec<CountryCount>> {
        let countries = sqlx::query_as::<_, CountryCount>(
            r#"
            SELECT
                country,
                COUNT(DISTINCT visitor_hash) AS visitors,
                COUNT(*) AS pageviews
            FROM analytics_pageviews
            WHERE created_at >= ? AND country IS NOT NULL
            GROUP BY country
            ORDER BY visitors DESC, country ASC
            LIMIT ?
            "#,
        )
        .bind(since)
        .bind(limit)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(countries)
    }

    async fn browser_counts(&self, since: i64) -> Result<Vec<BrowserCount>> {
        let rows = sqlx::query_as::<_, (String, i64)>(BROWSER_COUNTS_QUERY.as_str())
            .bind(since)
            .fetch_all(self.pool.as_ref())
            .await?;

        Ok(rows
            .into_iter()
            .map(|(browser, visitors)| BrowserCount {
                browser: Browser::from_name(&browser),
                visitors,
            })
            .collect())
    }

    async fn recent_pageviews(&self, limit: i64) -> Result<Vec<PageviewRecord>> {
        let rows = sqlx::query_as::<_, PageviewRecord>(
            r#"
            SELECT id, url, referrer, title, screen, language, country, visitor_hash, user_agent, created_at
            FROM analytics_pageviews
            ORDER BY created_at DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows)
    }

    async fn recent_events(&self, limit: i64) -> Result<Vec<EventRecord>> {
        let rows = sqlx::query_as::<_, EventRecord>(
            r#"
            SELECT id, event_name, event_data, url, visitor_hash, created_at
            FROM analytics_events
            ORDER BY created_at DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows)
    }

    async fn schema_report(&self) -> Result<SchemaReport> {
        let tables = sqlx::query_scalar::<_, String>(
            r#"
            SELECT name FROM sqlite_master
            WHERE type = 'table' AND name NOT LIKE 'sqlite_%'
            ORDER BY name
            "#,
        )
        .fetch_all(self.pool.as_ref())
        .await?;

        let pageview_columns = sqlx::query_scalar::<_, String>(
            "SELECT name FROM pragma_table_info('analytics_pageviews') ORDER BY cid",
        )
        .fetch_all(self.pool.as_ref())
        .await?;

        let mut report = SchemaReport {
            tables,
            pageview_columns,
            ..Default::default()
        };

        if !report.has_pageview_table() {
            return Ok(report);
        }

        if !report.has_country_column() {
            report.total_pageviews =
                sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM analytics_pageviews")
                    .fetch_one(self.pool.as_ref())
                    .await?;
            report.without_country = report.total_pageviews;
            return Ok(report);
        }

        let (total, with_country) = sqlx::query_as::<_, (i64, i64)>(
            "SELECT COUNT(*), COUNT(country) FROM analytics_pageviews",
        )
        .fetch_one(self.pool.as_ref())
        .await?;

        report.total_pageviews = total;
        report.with_country = with_country;
        report.without_country = total - with_country;

        report.countries = sqlx::query_as::<_, (String, i64)>(
            r#"
            SELECT country, COUNT(*) AS pageviews
            FROM analytics_pageviews
            WHERE country IS NOT NULL
            GROUP BY country
            ORDER BY pageviews DESC, country ASC
            "#,
        )
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(report)
    }
}
