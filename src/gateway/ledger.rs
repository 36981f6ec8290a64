use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// One delivered answer, in the shape orchestration layers consume.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRecord {
    /// Whether the generation slot was terminal at delivery time.
    pub done: bool,
    pub answer: String,
    /// Reasoning-block text that accompanied the answer, empty when the
    /// model emitted none.
    pub reasoning: String,
    pub agent_name: String,
    /// False when the answer is a degraded-mode filler.
    pub success: bool,
    /// Structured payload slots, keyed by insertion index.
    pub blocks: HashMap<String, serde_json::Value>,
    pub status: String,
    pub uid: Uuid,
    pub created_at: DateTime<Utc>,
}

/// A completed result waiting to be delivered exactly once.
#[derive(Debug, Clone)]
pub struct PendingAnswer {
    pub answer: String,
    pub reasoning: String,
    pub success: bool,
}

/// Append-only history of delivered answers. Insertion order is delivery
/// order; records are never mutated or removed, so a `uid` observed once
/// stays valid forever.
#[derive(Debug, Default)]
pub struct ResponseLedger {
    entries: Vec<QueryRecord>,
}

impl ResponseLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delivery dedup key: exact equality on the answer text.
    pub fn contains_answer(&self, answer: &str) -> bool {
        self.entries.iter().any(|record| record.answer == answer)
    }

    pub fn append(&mut self, record: QueryRecord) {
        self.entries.push(record);
    }

    /// Most recently delivered record.
    pub fn last(&self) -> Option<&QueryRecord> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
