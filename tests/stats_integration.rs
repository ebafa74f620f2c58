//! Summary statistics computed over seeded databases
//!
//! Every scenario runs against both storage backends.

#[macro_use]
mod common;

use cicerone::analytics::{
    summarize, AnalyticsSummary, Browser, NewPageview, StatsWindow, TOP_COUNTRIES_LIMIT,
    TOP_PAGES_LIMIT,
};
use cicerone::storage::{SqliteStorage, Storage};
use std::sync::Arc;

const DAY: i64 = 86_400;
// 2024-03-15 12:00:00 UTC
const NOW: i64 = 1_710_504_000;

const FIREFOX_UA: &str = "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0";
const SAFARI_UA: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_5) AppleWebKit/605.1.15 \
                         (KHTML, like Gecko) Version/17.5 Safari/605.1.15";
const EDGE_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                       (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36 Edg/126.0.0.0";

fn pageview(url: &str, visitor: &str, created_at: i64) -> NewPageview {
    NewPageview {
        url: url.to_string(),
        referrer: None,
        title: None,
        screen: None,
        language: None,
        country: None,
        visitor_hash: visitor.to_string(),
        user_agent: FIREFOX_UA.to_string(),
        created_at,
    }
}

async fn insert_all(storage: &Arc<dyn Storage>, rows: Vec<NewPageview>) {
    for row in rows {
        storage.insert_pageview(&row).await.unwrap();
    }
}

async fn window_summary(storage: &Arc<dyn Storage>, days: i64) -> AnalyticsSummary {
    summarize(storage.as_ref(), StatsWindow::ending_at(NOW, days))
        .await
        .unwrap()
}

async fn new_and_returning_visitors(storage: Arc<dyn Storage>) {
    insert_all(
        &storage,
        vec![
            pageview("/", "visitor-a", NOW - 10 * DAY),
            pageview("/tours", "visitor-a", NOW - 3 * DAY),
            pageview("/", "visitor-a", NOW - DAY),
            pageview("/", "visitor-b", NOW - DAY),
        ],
    )
    .await;

    let summary = window_summary(&storage, 7).await;

    assert_eq!(summary.period, "7 days");
    // The day -10 row falls outside the window
    assert_eq!(summary.stats.total_pageviews, 3);
    assert_eq!(summary.stats.unique_visitors, 2);
    assert_eq!(summary.stats.active_days, 2);
    assert_eq!(summary.stats.avg_pages_per_visitor, 1.5);
    assert_eq!(summary.stats.new_visitors, 1);
    assert_eq!(summary.stats.returning_visitors, 1);

    // Widening the window makes visitor A new as well
    let summary = window_summary(&storage, 30).await;
    assert_eq!(summary.stats.total_pageviews, 4);
    assert_eq!(summary.stats.new_visitors, 2);
    assert_eq!(summary.stats.returning_visitors, 0);
}

async fn new_plus_returning_equals_unique(storage: Arc<dyn Storage>) {
    let mut rows = Vec::new();
    for i in 0..20 {
        let visitor = format!("visitor-{}", i % 7);
        rows.push(pageview("/", &visitor, NOW - (i * DAY) / 2));
    }
    insert_all(&storage, rows).await;

    for days in [1, 3, 7, 30] {
        let summary = window_summary(&storage, days).await;
        let stats = &summary.stats;
        assert_eq!(
            stats.new_visitors + stats.returning_visitors,
            stats.unique_visitors,
            "days={}",
            days
        );
        assert!(stats.new_visitors >= 0 && stats.returning_visitors >= 0);
    }
}

async fn window_start_is_inclusive(storage: Arc<dyn Storage>) {
    insert_all(
        &storage,
        vec![
            pageview("/edge", "visitor-a", NOW - 7 * DAY),
            pageview("/outside", "visitor-b", NOW - 7 * DAY - 1),
        ],
    )
    .await;

    let summary = window_summary(&storage, 7).await;
    assert_eq!(summary.stats.total_pageviews, 1);
    assert_eq!(summary.top_pages.len(), 1);
    assert_eq!(summary.top_pages[0].url, "/edge");
}

async fn daily_trend_is_ascending_by_utc_date(storage: Arc<dyn Storage>) {
    insert_all(
        &storage,
        vec![
            pageview("/", "visitor-a", NOW - DAY),
            pageview("/", "visitor-b", NOW - DAY),
            pageview("/", "visitor-a", NOW - 2 * DAY),
            pageview("/", "visitor-a", NOW),
        ],
    )
    .await;

    let summary = window_summary(&storage, 7).await;

    let trend: Vec<_> = summary
        .daily_trend
        .iter()
        .map(|d| (d.date.as_str(), d.visitors, d.pageviews))
        .collect();
    assert_eq!(
        trend,
        vec![
            ("2024-03-13", 1, 1),
            ("2024-03-14", 2, 2),
            ("2024-03-15", 1, 1),
        ]
    );
}

async fn top_pages_are_sorted_and_limited(storage: Arc<dyn Storage>) {
    let mut rows = Vec::new();
    // Page i gets i + 1 views
    for i in 0..12 {
        for v in 0..=i {
            rows.push(pageview(&format!("/page-{:02}", i), &format!("v{}", v), NOW - 60));
        }
    }
    insert_all(&storage, rows).await;

    let summary = window_summary(&storage, 7).await;

    assert_eq!(summary.top_pages.len() as i64, TOP_PAGES_LIMIT);
    assert_eq!(summary.top_pages[0].url, "/page-11");
    assert_eq!(summary.top_pages[0].views, 12);
    assert_eq!(summary.top_pages[0].unique_visitors, 12);
    assert!(summary
        .top_pages
        .windows(2)
        .all(|pair| pair[0].views >= pair[1].views));
}

async fn top_referrers_skip_direct_traffic(storage: Arc<dyn Storage>) {
    let mut rows = Vec::new();
    for (i, referrer) in [
        Some("https://www.google.com/"),
        Some("https://www.google.com/"),
        Some("https://duckduckgo.com/"),
        Some(""),
        None,
    ]
    .into_iter()
    .enumerate()
    {
        let mut row = pageview("/", &format!("v{}", i), NOW - 60);
        row.referrer = referrer.map(str::to_string);
        rows.push(row);
    }
    insert_all(&storage, rows).await;

    let summary = window_summary(&storage, 7).await;

    let referrers: Vec<_> = summary
        .top_referrers
        .iter()
        .map(|r| (r.referrer.as_str(), r.visits, r.unique_visitors))
        .collect();
    assert_eq!(
        referrers,
        vec![
            ("https://www.google.com/", 2, 2),
            ("https://duckduckgo.com/", 1, 1),
        ]
    );
}

async fn countries_are_limited_and_skip_unknown(storage: Arc<dyn Storage>) {
    let codes = [
        "AR", "AT", "AU", "BE", "BR", "CA", "CH", "DE", "DK", "ES", "FI", "FR", "GB", "IE", "IT",
        "JP", "NL",
    ];
    let mut rows = Vec::new();
    for (i, code) in codes.iter().enumerate() {
        let mut row = pageview("/", &format!("v{}", i), NOW - 60);
        row.country = Some(code.to_string());
        rows.push(row);
    }
    // Two more French visitors and one without a country
    for visitor in ["fr-1", "fr-2"] {
        let mut row = pageview("/", visitor, NOW - 60);
        row.country = Some("FR".to_string());
        rows.push(row);
    }
    rows.push(pageview("/", "nowhere", NOW - 60));
    insert_all(&storage, rows).await;

    let summary = window_summary(&storage, 7).await;

    assert_eq!(summary.countries.len() as i64, TOP_COUNTRIES_LIMIT);
    assert_eq!(summary.countries[0].country, "FR");
    assert_eq!(summary.countries[0].visitors, 3);
    assert_eq!(summary.countries[0].pageviews, 3);
    assert_eq!(summary.countries[1].country, "AR");
}

async fn browser_breakdown_counts_visitors(storage: Arc<dyn Storage>) {
    let mut rows = vec![
        pageview("/", "firefox-1", NOW - 60),
        pageview("/tours", "firefox-1", NOW - 30),
        pageview("/", "firefox-2", NOW - 60),
    ];
    let mut safari = pageview("/", "safari-1", NOW - 60);
    safari.user_agent = SAFARI_UA.to_string();
    rows.push(safari);
    let mut edge = pageview("/", "edge-1", NOW - 60);
    edge.user_agent = EDGE_UA.to_string();
    rows.push(edge);
    let mut unknown = pageview("/", "curl-1", NOW - 60);
    unknown.user_agent = "unknown".to_string();
    rows.push(unknown);
    insert_all(&storage, rows).await;

    let summary = window_summary(&storage, 7).await;

    let browsers: Vec<_> = summary
        .browsers
        .iter()
        .map(|b| (b.browser, b.visitors))
        .collect();
    assert_eq!(browsers[0], (Browser::Firefox, 2));
    assert_eq!(browsers.len(), 4);
    assert!(browsers.contains(&(Browser::Safari, 1)));
    assert!(browsers.contains(&(Browser::Edge, 1)));
    assert!(browsers.contains(&(Browser::Other, 1)));
}

async fn empty_window(storage: Arc<dyn Storage>) {
    insert_all(&storage, vec![pageview("/", "old", NOW - 100 * DAY)]).await;

    let summary = window_summary(&storage, 7).await;

    assert_eq!(summary.stats.total_pageviews, 0);
    assert_eq!(summary.stats.unique_visitors, 0);
    assert_eq!(summary.stats.avg_pages_per_visitor, 0.0);
    assert_eq!(summary.stats.new_visitors, 0);
    assert_eq!(summary.stats.returning_visitors, 0);
    assert!(summary.daily_trend.is_empty());
    assert!(summary.top_pages.is_empty());
    assert!(summary.browsers.is_empty());
    assert!(summary.countries.is_empty());
}

#[tokio::test]
async fn test_summary_fails_without_tables() {
    let storage = SqliteStorage::new("sqlite::memory:", 1).await.unwrap();

    let result = summarize(&storage, StatsWindow::ending_at(NOW, 7)).await;
    assert!(result.is_err());
}

backend_tests!(
    new_and_returning_visitors,
    new_plus_returning_equals_unique,
    window_start_is_inclusive,
    daily_trend_is_ascending_by_utc_date,
    top_pages_are_sorted_and_limited,
    top_referrers_skip_direct_traffic,
    countries_are_limited_and_skip_unknown,
    browser_breakdown_counts_visitors,
    empty_window,
);
