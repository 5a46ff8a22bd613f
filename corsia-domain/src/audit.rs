use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::sync::Mutex;
use uuid::Uuid;

use crate::pii::Masked;

/// Terminal outcome of one booking attempt, as published to the audit sink.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditOutcome {
    Success,
    InsufficientSeats,
    NotFound,
    ConflictExhausted,
    SystemError,
}

/// One record per booking attempt, success or failure. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub flight_id: Uuid,
    pub passenger_contact: Masked<String>,
    pub requested_seats: i32,
    /// Availability observed at the last attempt. None when the flight was
    /// never readable (NOT_FOUND, or the store failed before the first read).
    pub available_before: Option<i32>,
    pub outcome: AuditOutcome,
    pub error_detail: Option<String>,
    /// Set only on SUCCESS.
    pub reservation_id: Option<Uuid>,
}

/// Destination for completed audit entries: a compliance log, a queue, a
/// database. Object-safe for use behind `Arc<dyn AuditSink>`.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn publish(&self, entry: &AuditEntry) -> Result<(), Box<dyn Error + Send + Sync>>;
}

/// Collects entries in memory. Used by tests to assert on the audit trail.
#[derive(Default)]
pub struct MemoryAuditSink {
    entries: Mutex<Vec<AuditEntry>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries.lock().unwrap().clone()
    }
}

#[async_trait]
impl AuditSink for MemoryAuditSink {
    async fn publish(&self, entry: &AuditEntry) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.entries.lock().unwrap().push(entry.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_serialization_format() {
        let json = serde_json::to_string(&AuditOutcome::InsufficientSeats).unwrap();
        assert_eq!(json, "\"INSUFFICIENT_SEATS\"");
        let json = serde_json::to_string(&AuditOutcome::ConflictExhausted).unwrap();
        assert_eq!(json, "\"CONFLICT_EXHAUSTED\"");
    }

    #[tokio::test]
    async fn test_memory_sink_collects_entries() {
        let sink = MemoryAuditSink::new();
        let entry = AuditEntry {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            flight_id: Uuid::new_v4(),
            passenger_contact: Masked::new("ada@example.com".to_string()),
            requested_seats: 2,
            available_before: Some(180),
            outcome: AuditOutcome::Success,
            error_detail: None,
            reservation_id: Some(Uuid::new_v4()),
        };
        sink.publish(&entry).await.unwrap();
        assert_eq!(sink.entries().len(), 1);
        assert_eq!(sink.entries()[0].outcome, AuditOutcome::Success);
    }
}
