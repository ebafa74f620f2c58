//! Fire-and-forget beacon client
//!
//! Tracking must never break the caller: transport failures and error
//! statuses are logged at debug level and otherwise ignored.

use serde::Serialize;
use tracing::debug;

use crate::analytics::{EventBeacon, PageviewBeacon};

#[derive(Debug, Clone)]
pub struct BeaconClient {
    base_url: String,
    enabled: bool,
    http: reqwest::Client,
}

impl BeaconClient {
    /// `base_url` is the analytics mount point, e.g. `http://host/api/analytics`
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, reqwest::Client::new())
    }

    pub fn with_client(base_url: impl Into<String>, http: reqwest::Client) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            enabled: true,
            http,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Send a pageview; returns whether the server accepted it
    pub async fn track_pageview(&self, beacon: &PageviewBeacon) -> bool {
        self.send("pageview", beacon).await
    }

    /// Send a custom event; returns whether the server accepted it
    pub async fn track_event(&self, beacon: &EventBeacon) -> bool {
        self.send("event", beacon).await
    }

    async fn send<T: Serialize>(&self, endpoint: &str, body: &T) -> bool {
        if !self.enabled {
            return false;
        }

        let url = format!("{}/{}", self.base_url, endpoint);
        match self.http.post(&url).json(body).send().await {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                debug!(%url, status = %response.status(), "beacon rejected");
                false
            }
            Err(e) => {
                debug!(%url, error = %e, "failed to send beacon");
                false
            }
        }
    }
}
