//! The `Session` aggregate and its summary projection (Section 3).

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sa_domain::event::Event;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::key::SessionKey;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub key: SessionKey,
    pub events: Vec<Event>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub state: HashMap<String, Value>,
}

impl Session {
    pub fn new(key: SessionKey, state: HashMap<String, Value>) -> Self {
        let now = Utc::now();
        Self {
            key,
            events: Vec::new(),
            summary: None,
            created_at: now,
            updated_at: now,
            state,
        }
    }

    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    pub fn summarize(&self) -> SessionSummary {
        SessionSummary {
            key: self.key.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
            event_count: self.event_count(),
            has_summary: self.summary.is_some(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub key: SessionKey,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub event_count: usize,
    pub has_summary: bool,
}
