//! Analytics storage models

use serde::{Deserialize, Serialize};

use crate::analytics::browser::Browser;

/// Pageview row stored in database
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PageviewRecord {
    pub id: i64,
    pub url: String,
    pub referrer: Option<String>,
    pub title: Option<String>,
    pub screen: Option<String>,
    pub language: Option<String>,
    pub country: Option<String>,
    pub visitor_hash: String,
    pub user_agent: Option<String>,
    pub created_at: i64,
}

/// Event row stored in database
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct EventRecord {
    pub id: i64,
    pub event_name: String,
    pub event_data: Option<String>,
    pub url: String,
    pub visitor_hash: String,
    pub created_at: i64,
}

/// Window totals computed in a single pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, sqlx::FromRow)]
pub struct WindowTotals {
    pub total_pageviews: i64,
    pub unique_visitors: i64,
    pub active_days: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct DailyCount {
    /// UTC calendar date, `YYYY-MM-DD`
    pub date: String,
    pub visitors: i64,
    pub pageviews: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct PageCount {
    pub url: String,
    pub title: Option<String>,
    pub views: i64,
    pub unique_visitors: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct ReferrerCount {
    pub referrer: String,
    pub visits: i64,
    pub unique_visitors: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct CountryCount {
    pub country: String,
    pub visitors: i64,
    pub pageviews: i64,
}

/// Distinct visitors per browser family
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BrowserCount {
    pub browser: Browser,
    pub visitors: i64,
}

/// Diagnostic view of the analytics schema
#[derive(Debug, Clone, Default, Serialize)]
pub struct SchemaReport {
    pub tables: Vec<String>,
    pub pageview_columns: Vec<String>,
    pub total_pageviews: i64,
    pub with_country: i64,
    pub without_country: i64,
    pub countries: Vec<(String, i64)>,
}

impl SchemaReport {
    pub fn has_pageview_table(&self) -> bool {
        self.tables.iter().any(|t| t == crate::storage::PAGEVIEWS_TABLE)
    }

    pub fn has_event_table(&self) -> bool {
        self.tables.iter().any(|t| t == crate::storage::EVENTS_TABLE)
    }

    pub fn has_country_column(&self) -> bool {
        self.pageview_columns.iter().any(|c| c == "country")
    }
}
