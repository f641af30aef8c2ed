// src/pipeline/notify.rs

//! Per-recipient fan-out of a single listing.

use std::sync::Arc;

use crate::models::{DeliveryOutcome, Listing, ListingDelivery, RecipientOutcome};
use crate::pipeline::Pacing;
use crate::services::MessageSender;
use crate::utils::{escape_html, truncate_chars};

/// Telegram's limit for photo captions, in characters.
const MAX_CAPTION_CHARS: usize = 1024;

/// Telegram's limit for text messages, in characters.
const MAX_MESSAGE_CHARS: usize = 4096;

/// Longest title kept before truncation.
const MAX_TITLE_CHARS: usize = 256;

/// Renders listings and sends them to every recipient.
pub struct Notifier {
    sender: Arc<dyn MessageSender>,
    post_base_url: String,
    pacing: Pacing,
}

impl Notifier {
    pub fn new(sender: Arc<dyn MessageSender>, post_base_url: impl Into<String>, pacing: Pacing) -> Self {
        Self {
            sender,
            post_base_url: post_base_url.into(),
            pacing,
        }
    }

    /// Format a listing as a Telegram HTML message.
    ///
    /// Annotations are cut so the result stays within Telegram's message
    /// limit; the title and link are always kept.
    pub fn render(&self, listing: &Listing) -> String {
        let header = format!(
            "🏠 <b>{}</b>\n\n",
            escape_html(&truncate_chars(&listing.title, MAX_TITLE_CHARS))
        );
        let footer = format!(
            "\n🔗 <a href=\"{}\">View Post</a>",
            escape_html(&listing.post_url(&self.post_base_url))
        );

        let mut budget = MAX_MESSAGE_CHARS
            .saturating_sub(header.chars().count())
            .saturating_sub(footer.chars().count());
        let mut body = String::new();
        for annotation in &listing.annotations {
            let line = format!("📝 {}\n", escape_html(annotation));
            let len = line.chars().count();
            if len <= budget {
                body.push_str(&line);
                budget -= len;
                continue;
            }

            // Escaping can only lengthen text, so a raw cut to the budget is
            // an upper bound; shrink until the escaped line fits.
            let mut keep = budget.saturating_sub(3);
            while keep > 0 {
                let line = format!("📝 {}\n", escape_html(&truncate_chars(annotation, keep)));
                if line.chars().count() <= budget {
                    body.push_str(&line);
                    break;
                }
                keep /= 2;
            }
            break;
        }

        header + &body + &footer
    }

    /// Deliver one listing to each recipient independently.
    ///
    /// A failure for one recipient is logged and recorded; the remaining
    /// recipients are still attempted. Nothing is retried.
    pub async fn deliver(&self, listing: &Listing, recipients: &[String]) -> ListingDelivery {
        let message = self.render(listing);
        let photo = listing
            .photo_url()
            .filter(|_| message.chars().count() <= MAX_CAPTION_CHARS);

        let mut delivery = ListingDelivery {
            listing_id: listing.id.clone(),
            outcomes: Vec::with_capacity(recipients.len()),
        };

        for (i, recipient) in recipients.iter().enumerate() {
            if i > 0 {
                self.pacing.between_recipients().await;
            }

            let result = match photo {
                Some(url) => self.sender.send_photo(recipient, url, &message).await,
                None => self.sender.send_text(recipient, &message).await,
            };

            let outcome = match result {
                Ok(()) => DeliveryOutcome::Delivered,
                Err(e) => {
                    log::warn!(
                        "Failed to send listing {} to {}: {}",
                        listing.id,
                        recipient,
                        e
                    );
                    DeliveryOutcome::Failed(e.to_string())
                }
            };
            delivery.outcomes.push(RecipientOutcome {
                recipient: recipient.clone(),
                outcome,
            });
        }

        delivery
    }
}
