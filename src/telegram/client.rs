//! Bot API client

use super::types::{ApiResponse, SendMessage, SetWebhook};
use super::{MessageSender, TelegramError};
use crate::state_machine::Reply;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

const API_BASE: &str = "https://api.telegram.org";

/// The request URL carries the bot token, so it never goes into errors
fn http_error(e: reqwest::Error) -> TelegramError {
    TelegramError::Http(e.without_url())
}

pub struct TelegramClient {
    client: Client,
    /// `https://api.telegram.org/bot<token>`
    endpoint: String,
}

impl TelegramClient {
    pub fn new(token: &str, timeout: Duration) -> Result<Self, TelegramError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(http_error)?;

        Ok(Self {
            client,
            endpoint: format!("{API_BASE}/bot{token}"),
        })
    }

    async fn call<T: Serialize + Sync>(&self, method: &str, body: &T) -> Result<(), TelegramError> {
        let response = self
            .client
            .post(format!("{}/{method}", self.endpoint))
            .json(body)
            .send()
            .await
            .map_err(http_error)?;

        let status = response.status();
        let api: ApiResponse = response.json().await.map_err(http_error)?;
        if api.ok {
            Ok(())
        } else {
            Err(TelegramError::Api {
                method: method.to_string(),
                status: status.as_u16(),
                description: api.description.unwrap_or_default(),
            })
        }
    }

    /// Register `url` as the webhook for message updates
    pub async fn set_webhook(&self, url: &str) -> Result<(), TelegramError> {
        self.call(
            "setWebhook",
            &SetWebhook {
                url,
                allowed_updates: &["message"],
            },
        )
        .await
    }
}

#[async_trait]
impl MessageSender for TelegramClient {
    async fn send(&self, chat_id: i64, reply: &Reply) -> Result<(), TelegramError> {
        self.call("sendMessage", &SendMessage::from_reply(chat_id, reply))
            .await
    }
}
