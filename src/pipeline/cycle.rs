// src/pipeline/cycle.rs

//! The fetch → dedup → deliver → persist cycle.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;

use crate::error::{AppError, Result};
use crate::models::{Config, CycleStatus, DeliveryReport};
use crate::pipeline::{Notifier, Pacing, PaginatedFetcher, select_fresh};
use crate::services::{ListingSource, MessageSender};
use crate::storage::SeenStore;

/// Engine settings that are fixed for the life of the process.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub recipients: Vec<String>,
    pub post_base_url: String,
    pub pacing: Pacing,
    pub max_pages: Option<usize>,
}

impl EngineSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            recipients: config.telegram.chat_ids.clone(),
            post_base_url: config.notify.post_base_url.clone(),
            pacing: Pacing::from(&config.pacing),
            max_pages: config.search.max_pages,
        }
    }
}

/// Runs crawl cycles, at most one at a time.
pub struct CrawlEngine {
    store: Arc<dyn SeenStore>,
    fetcher: PaginatedFetcher,
    notifier: Notifier,
    recipients: Vec<String>,
    pacing: Pacing,
    cycle_lock: Mutex<()>,
}

impl CrawlEngine {
    pub fn new(
        store: Arc<dyn SeenStore>,
        source: Arc<dyn ListingSource>,
        sender: Arc<dyn MessageSender>,
        settings: EngineSettings,
    ) -> Self {
        let fetcher =
            PaginatedFetcher::new(source, settings.pacing).with_max_pages(settings.max_pages);
        let notifier = Notifier::new(sender, settings.post_base_url, settings.pacing);
        Self {
            store,
            fetcher,
            notifier,
            recipients: settings.recipients,
            pacing: settings.pacing,
            cycle_lock: Mutex::new(()),
        }
    }

    pub fn recipients(&self) -> &[String] {
        &self.recipients
    }

    /// Whether a cycle currently holds the lock.
    pub fn is_busy(&self) -> bool {
        self.cycle_lock.try_lock().is_err()
    }

    /// Run one cycle unless another is already running.
    ///
    /// A trigger that arrives mid-cycle is rejected with
    /// [`AppError::CycleInProgress`] rather than queued.
    pub async fn try_run_cycle(&self) -> Result<DeliveryReport> {
        let _guard = self
            .cycle_lock
            .try_lock()
            .map_err(|_| AppError::CycleInProgress)?;
        Ok(self.run_locked().await)
    }

    async fn run_locked(&self) -> DeliveryReport {
        let started_at = Utc::now();

        let mut seen = self.store.load().await;
        let known = seen.len();

        let fetched = match self.fetcher.fetch_all().await {
            Ok(outcome) => outcome,
            Err(e) => {
                log::error!("Cycle aborted: {}", e);
                return DeliveryReport::fetch_failed(started_at, e);
            }
        };

        let pages = fetched.pages;
        let raw_count = fetched.listings.len();
        let fresh = select_fresh(fetched.listings, &mut seen);
        log::info!(
            "Fetched {} listings over {} pages, {} new ({} already seen)",
            raw_count,
            pages,
            fresh.len(),
            known
        );

        let mut deliveries = Vec::with_capacity(fresh.len());
        for (i, listing) in fresh.iter().enumerate() {
            if i > 0 {
                self.pacing.between_listings().await;
            }
            log::info!("Sending new listing {}: {}", listing.id, listing.title);
            deliveries.push(self.notifier.deliver(listing, &self.recipients).await);
        }

        let persist_error = match self.store.save(&seen).await {
            Ok(()) => None,
            Err(e) => {
                log::error!(
                    "Failed to persist seen-set ({} ids): {}. Listings may be re-sent next cycle.",
                    seen.len(),
                    e
                );
                Some(e.to_string())
            }
        };

        let delivered = deliveries.iter().filter(|d| d.delivered_any()).count();
        let report = DeliveryReport {
            started_at,
            finished_at: Utc::now(),
            status: if fetched.error.is_some() {
                CycleStatus::Partial
            } else {
                CycleStatus::Completed
            },
            pages,
            fetched: raw_count,
            fresh_ids: fresh.iter().map(|l| l.id.clone()).collect(),
            attempted: fresh.len(),
            delivered,
            failed: fresh.len() - delivered,
            deliveries,
            fetch_error: fetched.error.map(|e| e.to_string()),
            persist_error,
        };

        log::info!("Cycle finished: {}", report.summary());
        report
    }
}
