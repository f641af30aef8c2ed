// src/models/mod.rs

//! Domain models for the notifier.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod listing;
mod report;
mod seen;

// Re-export all public types
pub use config::{
    Config, LoggingConfig, NotifyConfig, PacingConfig, PathsConfig, ScheduleConfig, SearchConfig,
    TelegramConfig, parse_chat_ids,
};
pub use listing::Listing;
pub use report::{CycleStatus, DeliveryOutcome, DeliveryReport, ListingDelivery, RecipientOutcome};
pub use seen::SeenSet;
