//! Sync state, change feed pages and diff events

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ResourceId;

/// Durable per-resource sync record.
///
/// Field names on disk (`syncToken`, `events`) are kept stable so existing
/// state directories remain readable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncState {
    /// Position in the provider's change stream. `None` means no baseline.
    #[serde(rename = "syncToken", default)]
    pub cursor: Option<String>,
    /// Item id to last reported revision marker.
    #[serde(rename = "events", default)]
    pub items: BTreeMap<String, String>,
}

impl SyncState {
    pub fn is_bootstrapped(&self) -> bool {
        self.cursor.is_some()
    }

    /// Forget the cursor so the next sync re-establishes a baseline.
    pub fn clear_cursor(&mut self) {
        self.cursor = None;
    }
}

/// Provider-reported item status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    #[default]
    Active,
    /// Removed or cancelled (soft delete).
    Cancelled,
}

/// One item returned by a change-feed page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeItem {
    pub id: String,
    /// Revision marker; changes whenever the item is modified.
    #[serde(default)]
    pub marker: String,
    #[serde(default)]
    pub status: ItemStatus,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub end: Option<String>,
}

impl ChangeItem {
    pub fn active(id: impl Into<String>, marker: impl Into<String>) -> Self {
        Self { id: id.into(), marker: marker.into(), ..Self::default() }
    }

    pub fn cancelled(id: impl Into<String>) -> Self {
        Self { id: id.into(), status: ItemStatus::Cancelled, ..Self::default() }
    }

    pub fn is_cancelled(&self) -> bool {
        self.status == ItemStatus::Cancelled
    }

    pub fn snapshot(&self) -> ItemSnapshot {
        ItemSnapshot { summary: self.summary.clone(), start: self.start.clone(), end: self.end.clone() }
    }
}

/// One page of a baseline or incremental listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangePage {
    pub items: Vec<ChangeItem>,
    pub next_page_token: Option<String>,
    /// Resume point for the next incremental query; carried by the final page.
    pub next_cursor: Option<String>,
}

/// Classification of a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffKind {
    Created,
    Updated,
    Deleted,
}

impl DiffKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Deleted => "deleted",
        }
    }
}

impl fmt::Display for DiffKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Human-facing fields of an item, when the provider supplies them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemSnapshot {
    pub summary: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
}

impl ItemSnapshot {
    /// `summary [start -> end]`, used in log lines.
    pub fn describe(&self) -> String {
        let summary = self.summary.as_deref().unwrap_or("(no title)");
        let start = self.start.as_deref().unwrap_or("?");
        let end = self.end.as_deref().unwrap_or("?");
        format!("{summary} [{start} -> {end}]")
    }
}

/// One classified change, produced by the sync engine and handed to a sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffEvent {
    pub resource_id: ResourceId,
    pub item_id: String,
    pub kind: DiffKind,
    /// New revision marker; absent for deletions.
    pub marker: Option<String>,
    pub snapshot: Option<ItemSnapshot>,
    pub observed_at: DateTime<Utc>,
}

impl DiffEvent {
    pub fn from_item(resource_id: &ResourceId, kind: DiffKind, item: &ChangeItem) -> Self {
        Self {
            resource_id: resource_id.clone(),
            item_id: item.id.clone(),
            kind,
            marker: Some(item.marker.clone()),
            snapshot: Some(item.snapshot()),
            observed_at: Utc::now(),
        }
    }

    pub fn deleted(resource_id: &ResourceId, item_id: impl Into<String>) -> Self {
        Self {
            resource_id: resource_id.clone(),
            item_id: item_id.into(),
            kind: DiffKind::Deleted,
            marker: None,
            snapshot: None,
            observed_at: Utc::now(),
        }
    }
}
