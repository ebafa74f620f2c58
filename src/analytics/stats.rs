//! Windowed summary statistics for the admin dashboard
//!
//! Every request recomputes the summary from stored pageviews. The window
//! is the trailing `days * 24h` ending now; it is not aligned to calendar
//! days, while the daily trend and active day count use UTC dates.

use anyhow::Result;
use serde::Serialize;

use crate::analytics::storage::{
    BrowserCount, CountryCount, DailyCount, PageCount, ReferrerCount,
};
use crate::storage::Storage;

pub const TOP_PAGES_LIMIT: i64 = 10;
pub const TOP_REFERRERS_LIMIT: i64 = 10;
pub const TOP_COUNTRIES_LIMIT: i64 = 15;

const SECONDS_PER_DAY: i64 = 86_400;

/// Trailing window of whole days ending at `now`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsWindow {
    pub days: i64,
    /// Unix timestamp of the window start (inclusive)
    pub since: i64,
}

impl StatsWindow {
    pub fn ending_at(now: i64, days: i64) -> Self {
        let since = now.saturating_sub(days.saturating_mul(SECONDS_PER_DAY));
        Self { days, since }
    }

    pub fn ending_now(days: i64) -> Self {
        Self::ending_at(chrono::Utc::now().timestamp(), days)
    }

    pub fn period(&self) -> String {
        format!("{} days", self.days)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SummaryTotals {
    pub total_pageviews: i64,
    pub unique_visitors: i64,
    pub active_days: i64,
    pub avg_pages_per_visitor: f64,
    pub new_visitors: i64,
    pub returning_visitors: i64,
}

/// Dashboard payload for `GET /stats`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSummary {
    pub period: String,
    pub stats: SummaryTotals,
    pub daily_trend: Vec<DailyCount>,
    pub top_pages: Vec<PageCount>,
    pub top_referrers: Vec<ReferrerCount>,
    pub browsers: Vec<BrowserCount>,
    pub countries: Vec<CountryCount>,
}

/// Compute the summary for a window
pub async fn summarize(storage: &dyn Storage, window: StatsWindow) -> Result<AnalyticsSummary> {
    let since = window.since;

    let totals = storage.window_totals(since).await?;
    let new_visitors = storage.new_visitor_count(since).await?;
    let daily_trend = storage.daily_trend(since).await?;
    let top_pages = storage.top_pages(since, TOP_PAGES_LIMIT).await?;
    let top_referrers = storage.top_referrers(since, TOP_REFERRERS_LIMIT).await?;
    let countries = storage.top_countries(since, TOP_COUNTRIES_LIMIT).await?;
    let browsers = storage.browser_counts(since).await?;

    // Inserts may land between the queries above; keep the split consistent
    // with the unique count that is reported.
    let new_visitors = new_visitors.min(totals.unique_visitors);

    Ok(AnalyticsSummary {
        period: window.period(),
        stats: SummaryTotals {
            total_pageviews: totals.total_pageviews,
            unique_visitors: totals.unique_visitors,
            active_days: totals.active_days,
            avg_pages_per_visitor: average_per_visitor(
                totals.total_pageviews,
                totals.unique_visitors,
            ),
            new_visitors,
            returning_visitors: totals.unique_visitors - new_visitors,
        },
        daily_trend,
        top_pages,
        top_referrers,
        browsers: rank_browsers(browsers),
        countries,
    })
}

/// Pageviews per visitor rounded to two decimals, zero when there are none
pub fn average_per_visitor(pageviews: i64, visitors: i64) -> f64 {
    if visitors <= 0 {
        return 0.0;
    }
    let avg = pageviews as f64 / visitors as f64;
    (avg * 100.0).round() / 100.0
}

/// Largest first; ties keep the enum order so the output is stable
pub fn rank_browsers(mut counts: Vec<BrowserCount>) -> Vec<BrowserCount> {
    counts.sort_by(|a, b| b.visitors.cmp(&a.visitors).then(a.browser.cmp(&b.browser)));
    counts
}
