//! Hook diagnostics retention
//!
//! Capped in-memory ring of the engine's own events: matches, applied
//! insertions, degraded types, extraction faults. Touched only at
//! class-load time or on faults, never on the healthy call path, so the
//! lock cost stays out of the hot path. Retention is for in-process
//! inspection; persistence is the host's business.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What kind of engine event an entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookEventKind {
    Matched,
    Instrumented,
    SkippedDegraded,
    ExtractionDegraded,
    DispatchFault,
}

/// One diagnostic event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HookEvent {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub kind: HookEventKind,
    /// Type name or server tag the event concerns.
    pub subject: String,
    pub detail: String,
}

impl HookEvent {
    pub fn new(kind: HookEventKind, subject: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            kind,
            subject: subject.into(),
            detail: detail.into(),
        }
    }
}

/// Capped event ring.
pub struct DiagnosticsStore {
    entries: RwLock<VecDeque<HookEvent>>,
    max_entries: usize,
}

impl DiagnosticsStore {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: RwLock::new(VecDeque::with_capacity(max_entries.min(256))),
            max_entries,
        }
    }

    pub fn record(&self, event: HookEvent) {
        let mut entries = self.entries.write();
        if entries.len() >= self.max_entries {
            entries.pop_front();
        }
        entries.push_back(event);
    }

    /// Most recent events first.
    pub fn recent(&self, limit: usize) -> Vec<HookEvent> {
        let entries = self.entries.read();
        entries.iter().rev().take(limit).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    /// Export all retained events as pretty JSON.
    pub fn export(&self) -> String {
        let entries = self.entries.read();
        let all: Vec<&HookEvent> = entries.iter().collect();
        serde_json::to_string_pretty(&all).unwrap_or_else(|_| "[]".to_string())
    }
}
