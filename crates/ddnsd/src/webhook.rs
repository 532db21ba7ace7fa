//! Webhook entry point
//!
//! `GET /?zone=<zone>&ip=<ipv4>` writes the zone's `A` record through the
//! shared [`RecordUpdater`], so a webhook write and a poll tick never race
//! on the same record.

use axum::extract::{OriginalUri, Query, State};
use axum::http::{HeaderMap, Method, StatusCode, header};
use axum::routing::get;
use axum::{Json, Router};
use ddns_core::address::Family;
use ddns_core::notify::NotificationSink;
use ddns_core::updater::RecordUpdater;
use serde_json::{Value, json};
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use tracing::{error, info};

#[derive(Clone)]
pub struct AppState {
    pub updater: Arc<RecordUpdater>,
    pub notifier: Arc<NotificationSink>,
}

type Reply = (StatusCode, Json<Value>);

pub fn router(state: AppState) -> Router {
    Router::new().route("/", get(update)).with_state(state)
}

fn failure(status: StatusCode, message: impl Into<String>) -> Reply {
    (status, Json(json!({ "error": message.into() })))
}

/// First value of `key`; later repeats are ignored
fn first<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

async fn update(
    State(state): State<AppState>,
    method: Method,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    Query(params): Query<Vec<(String, String)>>,
) -> Reply {
    let agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-");
    info!(%method, %uri, agent, "New request");

    let Some(zone) = first(&params, "zone") else {
        return failure(StatusCode::BAD_REQUEST, "missing zone parameter in query");
    };
    let Some(ip) = first(&params, "ip") else {
        return failure(StatusCode::BAD_REQUEST, "missing ip parameter in query");
    };
    // Literal only: no surrounding whitespace, no IPv6
    let Ok(address) = ip.parse::<Ipv4Addr>() else {
        return failure(StatusCode::BAD_REQUEST, format!("invalid ipv4 address {}", ip));
    };

    match state.updater.update_ipv4(IpAddr::V4(address), zone).await {
        Ok(result) => {
            info!(zone = %zone, ?result, "webhook update applied");
            (StatusCode::OK, Json(json!({ "message": "record updated" })))
        }
        Err(e) => {
            error!(zone = %zone, error = %e, "Failed to update IP");
            state.notifier.update_failed(Family::V4, &e).await;
            failure(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}
