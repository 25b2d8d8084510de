//! Google Calendar v3 wire types

use calrelay_domain::{ChangeItem, ChangePage, ItemStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct EventsResponse {
    #[serde(default)]
    pub items: Vec<GoogleEvent>,
    pub next_page_token: Option<String>,
    pub next_sync_token: Option<String>,
}

impl From<EventsResponse> for ChangePage {
    fn from(response: EventsResponse) -> Self {
        ChangePage {
            items: response.items.into_iter().map(ChangeItem::from).collect(),
            next_page_token: response.next_page_token,
            next_cursor: response.next_sync_token,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct GoogleEvent {
    pub id: String,
    pub etag: Option<String>,
    pub updated: Option<String>,
    pub status: Option<String>,
    pub summary: Option<String>,
    pub start: Option<EventTime>,
    pub end: Option<EventTime>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct EventTime {
    pub date_time: Option<String>,
    pub date: Option<String>,
}

impl EventTime {
    fn into_value(self) -> Option<String> {
        self.date_time.or(self.date)
    }
}

impl From<GoogleEvent> for ChangeItem {
    fn from(event: GoogleEvent) -> Self {
        let status = match event.status.as_deref() {
            Some("cancelled") => ItemStatus::Cancelled,
            _ => ItemStatus::Active,
        };

        ChangeItem {
            id: event.id,
            // Cancelled entries in an incremental feed may carry neither field.
            marker: event.etag.or(event.updated).unwrap_or_default(),
            status,
            summary: event.summary,
            start: event.start.and_then(EventTime::into_value),
            end: event.end.and_then(EventTime::into_value),
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct WatchRequest<'a> {
    pub id: &'a str,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub address: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct WatchResponse {
    pub resource_id: String,
    pub expiration: Option<EpochMillis>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct StopRequest<'a> {
    pub id: &'a str,
    pub resource_id: &'a str,
}

/// Channel expiration; the API sends epoch milliseconds as a string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(super) enum EpochMillis {
    Text(String),
    Number(i64),
}

impl EpochMillis {
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        let millis = match self {
            Self::Text(raw) => raw.trim().parse::<i64>().ok()?,
            Self::Number(millis) => *millis,
        };
        DateTime::from_timestamp_millis(millis)
    }
}
