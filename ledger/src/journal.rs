//! Ledger notifications and the sequenced event journal.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tinydex_common::{Address, TokenAmount};
use uuid::Uuid;

/// Notification emitted by a successful mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    /// Balance movement. Genesis minting is a transfer from the null address.
    Transfer {
        from: Address,
        to: Address,
        value: TokenAmount,
    },
    /// Allowance set by `owner` for `spender`.
    Approval {
        owner: Address,
        spender: Address,
        value: TokenAmount,
    },
}

impl Event {
    /// Event name as seen by observers.
    pub fn name(&self) -> &'static str {
        match self {
            Event::Transfer { .. } => "Transfer",
            Event::Approval { .. } => "Approval",
        }
    }
}

/// A journaled event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    /// Unique record ID.
    pub id: Uuid,
    /// Position in the journal, starting at 0 for genesis.
    pub sequence: u64,
    /// The event.
    pub event: Event,
    /// When the event was recorded.
    pub recorded_at: DateTime<Utc>,
}

/// Append-only ordered record of ledger events.
///
/// Sequence numbers keep increasing even when old records are evicted under
/// a retention limit.
#[derive(Debug, Clone, Default)]
pub struct Journal {
    records: VecDeque<EventRecord>,
    next_sequence: u64,
    limit: Option<usize>,
}

impl Journal {
    /// Create a journal retaining at most `limit` records.
    pub fn with_limit(limit: Option<usize>) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }

    /// Append an event and return its record.
    pub fn append(&mut self, event: Event) -> EventRecord {
        let record = EventRecord {
            id: Uuid::now_v7(),
            sequence: self.next_sequence,
            event,
            recorded_at: Utc::now(),
        };
        self.next_sequence += 1;

        if let Some(limit) = self.limit {
            while self.records.len() >= limit.max(1) {
                self.records.pop_front();
            }
        }
        self.records.push_back(record.clone());
        record
    }

    /// Retained records with `sequence >= from`.
    pub fn events_since(&self, from: u64) -> Vec<EventRecord> {
        self.records
            .iter()
            .filter(|r| r.sequence >= from)
            .cloned()
            .collect()
    }

    /// Sequence number the next record will get.
    pub fn next_sequence(&self) -> u64 {
        self.next_sequence
    }
}
