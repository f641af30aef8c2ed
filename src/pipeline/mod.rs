//! Pipeline entry points for the notifier.
//!
//! - `PaginatedFetcher`: walk every search page
//! - `select_fresh`: filter against the seen-set, oldest first
//! - `Notifier`: fan a listing out to recipients
//! - `CrawlEngine`: one locked fetch → dedup → deliver → persist cycle
//! - `Scheduler`: periodic trigger with failure backoff

pub mod cycle;
pub mod dedup;
pub mod fetch;
pub mod notify;
pub mod pacing;
pub mod schedule;

pub use cycle::{CrawlEngine, EngineSettings};
pub use dedup::select_fresh;
pub use fetch::{FetchOutcome, PaginatedFetcher};
pub use notify::Notifier;
pub use pacing::Pacing;
pub use schedule::{Backoff, Scheduler, sleep_or_cancel};
