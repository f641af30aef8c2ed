//! Courtesy delays between remote calls.

use std::time::Duration;

use crate::models::PacingConfig;

/// Fixed pauses applied by the fetcher and the notifier.
///
/// These are plain sleeps, not cancellation points: once a cycle starts it
/// runs to completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pacing {
    /// Before each follow-up page request
    pub page_delay: Duration,
    /// Between delivered listings
    pub listing_delay: Duration,
    /// Between recipients of one listing
    pub recipient_delay: Duration,
}

impl Pacing {
    /// No delays at all.
    pub fn none() -> Self {
        Self::default()
    }

    pub async fn before_next_page(&self) {
        pause(self.page_delay).await;
    }

    pub async fn between_listings(&self) {
        pause(self.listing_delay).await;
    }

    pub async fn between_recipients(&self) {
        pause(self.recipient_delay).await;
    }
}

impl From<&PacingConfig> for Pacing {
    fn from(config: &PacingConfig) -> Self {
        Self {
            page_delay: Duration::from_millis(config.page_delay_ms),
            listing_delay: Duration::from_millis(config.listing_delay_ms),
            recipient_delay: Duration::from_millis(config.recipient_delay_ms),
        }
    }
}

async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config() {
        let pacing = Pacing::from(&PacingConfig::default());
        assert_eq!(pacing.page_delay, Duration::from_secs(2));
        assert_eq!(pacing.listing_delay, Duration::from_secs(1));
        assert_eq!(pacing.recipient_delay, Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_page_delay_sleeps() {
        let pacing = Pacing {
            page_delay: Duration::from_secs(3),
            ..Pacing::none()
        };
        let start = tokio::time::Instant::now();
        pacing.before_next_page().await;
        assert!(start.elapsed() >= Duration::from_secs(3));
    }
}
