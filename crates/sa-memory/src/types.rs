//! The `MemoryEntry` model, its search options, and aggregate stats
//! (Section 4.6 and the data model's Memory key `(AppName, UserID,
//! EntryID)`).

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryEntry {
    pub id: String,
    pub app_name: String,
    pub user_id: String,
    pub content: String,
    /// Who produced the content this entry stores, e.g. `"user"`,
    /// `"assistant"`, or a fixed label for transcript-derived entries.
    pub author: String,
    /// The session this entry was extracted from, when it has one. Entries
    /// added directly through a tool rather than session extraction may
    /// have none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Set by search; absent on entries read outside a search call.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    Timestamp,
    Score,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

/// An inclusive bound on `MemoryEntry.created_at`. Either side may be open.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TimeRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<DateTime<Utc>>,
}

impl TimeRange {
    fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start.map(|start| at >= start).unwrap_or(true) && self.end.map(|end| at <= end).unwrap_or(true)
    }
}

/// `SearchMemory`'s option set, wire names pinned in Section 6.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: usize,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude_session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_range: Option<TimeRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<SortBy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<SortOrder>,
}

impl SearchOptions {
    pub const DEFAULT_LIMIT: usize = 100;

    pub fn effective_limit(&self) -> usize {
        self.limit.unwrap_or(Self::DEFAULT_LIMIT)
    }

    pub fn matches(&self, entry: &MemoryEntry) -> bool {
        if !self.authors.is_empty() && !self.authors.iter().any(|a| a == &entry.author) {
            return false;
        }
        if let Some(include) = &self.include_session_id {
            if entry.session_id.as_deref() != Some(include.as_str()) {
                return false;
            }
        }
        if let Some(exclude) = &self.exclude_session_id {
            if entry.session_id.as_deref() == Some(exclude.as_str()) {
                return false;
            }
        }
        if let Some(range) = &self.time_range {
            if !range.contains(entry.created_at) {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone)]
pub struct SearchResponse {
    pub entries: Vec<MemoryEntry>,
    pub total_count: usize,
    pub elapsed_time: Duration,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct MemoryStats {
    pub total_sessions: usize,
    pub total_entries: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oldest_timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub newest_timestamp: Option<DateTime<Utc>>,
    pub average_entries_per_session: f64,
}
