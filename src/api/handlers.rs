use axum::{
    extract::{
        connect_info::ConnectInfo,
        rejection::{JsonRejection, QueryRejection},
        FromRequestParts, Query, State,
    },
    http::{request::Parts, HeaderMap},
    Json,
};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use super::error::ApiError;
use crate::analytics::{
    extract_client_address, extract_user_agent, summarize, AnalyticsSummary, CountryResolver,
    EventBeacon, PageviewBeacon, RecordError, Recorder, StatsWindow, VisitorHasher,
};
use crate::storage::Storage;

pub struct AppState {
    pub storage: Arc<dyn Storage>,
    pub recorder: Recorder,
}

impl AppState {
    pub fn new(
        storage: Arc<dyn Storage>,
        hasher: VisitorHasher,
        resolver: CountryResolver,
    ) -> Self {
        Self {
            recorder: Recorder::new(Arc::clone(&storage), hasher, resolver),
            storage,
        }
    }
}

/// Transport peer address, when the server was started with connect info
pub struct PeerAddr(pub Option<SocketAddr>);

impl<S> FromRequestParts<S> for PeerAddr
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(PeerAddr(
            parts
                .extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| *addr),
        ))
    }
}

#[derive(Serialize)]
pub struct OkResponse {
    pub ok: bool,
}

#[derive(Serialize)]
pub struct SuccessResponse {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    #[serde(default = "default_days")]
    pub days: i64,
}

fn default_days() -> i64 {
    7
}

fn record_error(err: RecordError, message: &'static str) -> ApiError {
    match err {
        RecordError::Validation(reason) => ApiError::BadRequest(reason.to_string()),
        RecordError::Persistence(source) => ApiError::Persistence { message, source },
    }
}

/// Record a pageview beacon
pub async fn record_pageview(
    State(state): State<Arc<AppState>>,
    PeerAddr(peer): PeerAddr,
    headers: HeaderMap,
    payload: Result<Json<PageviewBeacon>, JsonRejection>,
) -> Result<Json<OkResponse>, ApiError> {
    let Json(beacon) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let address = extract_client_address(&headers, peer);
    let user_agent = extract_user_agent(&headers);

    state
        .recorder
        .record_pageview(beacon, &address, &user_agent)
        .await
        .map_err(|e| record_error(e, "Failed to record pageview"))?;

    Ok(Json(OkResponse { ok: true }))
}

/// Record a custom event beacon
pub async fn record_event(
    State(state): State<Arc<AppState>>,
    PeerAddr(peer): PeerAddr,
    headers: HeaderMap,
    payload: Result<Json<EventBeacon>, JsonRejection>,
) -> Result<Json<OkResponse>, ApiError> {
    let Json(beacon) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let address = extract_client_address(&headers, peer);
    let user_agent = extract_user_agent(&headers);

    state
        .recorder
        .record_event(beacon, &address, &user_agent)
        .await
        .map_err(|e| record_error(e, "Failed to record event"))?;

    Ok(Json(OkResponse { ok: true }))
}

/// Summary statistics for the trailing `days` window
pub async fn get_stats(
    State(state): State<Arc<AppState>>,
    query: Result<Query<StatsQuery>, QueryRejection>,
) -> Result<Json<AnalyticsSummary>, ApiError> {
    let Query(query) = query.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    if query.days < 1 {
        return Err(ApiError::BadRequest(
            "days must be a positive integer".to_string(),
        ));
    }

    let window = StatsWindow::ending_now(query.days);
    let summary = summarize(state.storage.as_ref(), window)
        .await
        .map_err(ApiError::Stats)?;

    Ok(Json(summary))
}

/// Health check endpoint
pub async fn health_check() -> Json<SuccessResponse> {
    Json(SuccessResponse {
        message: "OK".to_string(),
    })
}
