//! Beacon validation and persistence

use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use crate::analytics::geoip::CountryResolver;
use crate::analytics::models::{
    event_payload, non_empty, EventBeacon, NewEvent, NewPageview, PageviewBeacon,
};
use crate::analytics::visitor::VisitorHasher;
use crate::storage::Storage;

#[derive(Debug, Error)]
pub enum RecordError {
    /// A required beacon field is missing; nothing was persisted
    #[error("{0}")]
    Validation(&'static str),
    /// The row could not be written; the beacon is lost
    #[error("failed to persist beacon: {0:#}")]
    Persistence(#[source] anyhow::Error),
}

/// Turns beacons into stored rows, one row per accepted beacon
#[derive(Clone)]
pub struct Recorder {
    storage: Arc<dyn Storage>,
    hasher: VisitorHasher,
    resolver: CountryResolver,
}

impl Recorder {
    pub fn new(
        storage: Arc<dyn Storage>,
        hasher: VisitorHasher,
        resolver: CountryResolver,
    ) -> Self {
        Self {
            storage,
            hasher,
            resolver,
        }
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    /// Validate and store a pageview
    ///
    /// `address` and `user_agent` come from the request, see
    /// [`crate::analytics::ip_extractor`].
    pub async fn record_pageview(
        &self,
        beacon: PageviewBeacon,
        address: &str,
        user_agent: &str,
    ) -> Result<(), RecordError> {
        let url = non_empty(beacon.url).ok_or(RecordError::Validation("URL is required"))?;

        let country = self.resolver.resolve(address);
        let row = NewPageview {
            url,
            referrer: non_empty(beacon.referrer),
            title: non_empty(beacon.title),
            screen: non_empty(beacon.screen),
            language: non_empty(beacon.language),
            country,
            visitor_hash: self.hasher.hash(address, user_agent),
            user_agent: user_agent.to_string(),
            created_at: chrono::Utc::now().timestamp(),
        };

        self.storage
            .insert_pageview(&row)
            .await
            .map_err(RecordError::Persistence)?;

        debug!(url = %row.url, country = ?row.country, "recorded pageview");
        Ok(())
    }

    /// Validate and store a custom event
    pub async fn record_event(
        &self,
        beacon: EventBeacon,
        address: &str,
        user_agent: &str,
    ) -> Result<(), RecordError> {
        let (Some(event_name), Some(url)) = (non_empty(beacon.event_name), non_empty(beacon.url))
        else {
            return Err(RecordError::Validation("eventName and url are required"));
        };

        let row = NewEvent {
            event_name,
            event_data: event_payload(beacon.event_data),
            url,
            visitor_hash: self.hasher.hash(address, user_agent),
            created_at: chrono::Utc::now().timestamp(),
        };

        self.storage
            .insert_event(&row)
            .await
            .map_err(RecordError::Persistence)?;

        debug!(event = %row.event_name, url = %row.url, "recorded event");
        Ok(())
    }
}
