//! First-party visitor analytics
//!
//! Beacons are recorded with a salted visitor hash and, when an offline
//! GeoIP table is configured, a country code. Raw addresses are never
//! stored. Summary statistics are computed on demand from the stored rows.

pub mod browser;
pub mod geoip;
pub mod ip_extractor;
pub mod models;
pub mod recorder;
pub mod stats;
pub mod storage;
pub mod visitor;

pub use browser::Browser;
pub use geoip::{CidrTable, CountryResolver, CountryTable, MaxMindTable};
pub use ip_extractor::{extract_client_address, extract_user_agent};
pub use models::{EventBeacon, NewEvent, NewPageview, PageviewBeacon};
pub use recorder::{Recorder, RecordError};
pub use stats::{
    summarize, AnalyticsSummary, StatsWindow, SummaryTotals, TOP_COUNTRIES_LIMIT,
    TOP_PAGES_LIMIT, TOP_REFERRERS_LIMIT,
};
pub use storage::{
    BrowserCount, CountryCount, DailyCount, EventRecord, PageCount, PageviewRecord,
    ReferrerCount, SchemaReport, WindowTotals,
};
pub use visitor::VisitorHasher;
