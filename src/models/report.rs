//! Per-cycle delivery reporting.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Outcome of sending one listing to one recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "error", rename_all = "snake_case")]
pub enum DeliveryOutcome {
    Delivered,
    Failed(String),
}

impl DeliveryOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, DeliveryOutcome::Delivered)
    }
}

/// Delivery outcome for a single recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecipientOutcome {
    pub recipient: String,
    pub outcome: DeliveryOutcome,
}

/// All recipient outcomes for one listing.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ListingDelivery {
    pub listing_id: String,
    pub outcomes: Vec<RecipientOutcome>,
}

impl ListingDelivery {
    /// True when at least one recipient received the listing.
    pub fn delivered_any(&self) -> bool {
        self.outcomes.iter().any(|o| o.outcome.is_delivered())
    }

    /// Outcome for a specific recipient, if it was attempted.
    pub fn outcome_for(&self, recipient: &str) -> Option<&DeliveryOutcome> {
        self.outcomes
            .iter()
            .find(|o| o.recipient == recipient)
            .map(|o| &o.outcome)
    }
}

/// How a cycle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleStatus {
    /// Traversal reached the last page
    Completed,
    /// A later page failed; earlier pages were processed
    Partial,
    /// The first page failed; nothing was delivered or saved
    FetchFailed,
}

/// Summary of one fetch → dedup → deliver → persist cycle.
#[derive(Debug, Clone, Serialize)]
pub struct DeliveryReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub status: CycleStatus,
    /// Pages traversed
    pub pages: usize,
    /// Raw listings returned by the fetcher
    pub fetched: usize,
    /// Fresh listing ids in delivery order (oldest first)
    pub fresh_ids: Vec<String>,
    /// Listings handed to the notifier
    pub attempted: usize,
    /// Listings that reached at least one recipient
    pub delivered: usize,
    /// Listings that reached no recipient
    pub failed: usize,
    pub deliveries: Vec<ListingDelivery>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fetch_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persist_error: Option<String>,
}

impl DeliveryReport {
    /// Report for a cycle whose first page could not be fetched.
    pub fn fetch_failed(started_at: DateTime<Utc>, error: impl ToString) -> Self {
        Self {
            started_at,
            finished_at: Utc::now(),
            status: CycleStatus::FetchFailed,
            pages: 0,
            fetched: 0,
            fresh_ids: Vec::new(),
            attempted: 0,
            delivered: 0,
            failed: 0,
            deliveries: Vec::new(),
            fetch_error: Some(error.to_string()),
            persist_error: None,
        }
    }

    /// Whether the scheduler should back off before the next attempt.
    pub fn is_failure(&self) -> bool {
        self.status == CycleStatus::FetchFailed
    }

    /// One-line human summary.
    pub fn summary(&self) -> String {
        match self.status {
            CycleStatus::FetchFailed => format!(
                "Fetch failed: {}",
                self.fetch_error.as_deref().unwrap_or("unknown error")
            ),
            _ if self.attempted == 0 => "No new listings found".to_string(),
            _ => format!(
                "{} new listings found, {} sent, {} failed",
                self.attempted, self.delivered, self.failed
            ),
        }
    }
}
