//! Telegram transport
//!
//! Webhook receiver, Bot API client, and the wire types between them.

mod client;
mod types;
mod webhook;

pub use client::TelegramClient;
pub use webhook::{create_router, WebhookState};

use crate::state_machine::Reply;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TelegramError {
    #[error("Telegram request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Telegram {method} returned {status}: {description}")]
    Api {
        method: String,
        status: u16,
        description: String,
    },
}

/// Delivers replies to a chat
#[async_trait]
pub trait MessageSender: Send + Sync {
    async fn send(&self, chat_id: i64, reply: &Reply) -> Result<(), TelegramError>;
}

#[async_trait]
impl<T: MessageSender + ?Sized> MessageSender for Arc<T> {
    async fn send(&self, chat_id: i64, reply: &Reply) -> Result<(), TelegramError> {
        (**self).send(chat_id, reply).await
    }
}
