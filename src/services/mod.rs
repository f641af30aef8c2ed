//! Service layer for remote APIs.
//!
//! - Listing search (`DivarClient`, behind `ListingSource`)
//! - Message delivery (`TelegramClient`, behind `MessageSender`)

mod divar;
mod telegram;

pub use divar::{DivarClient, ListingSource, PageCursor, SearchPage};
pub use telegram::{Chat, IncomingMessage, MessageSender, TelegramClient, Update, User};
