//! Webhook receiver
//!
//! Telegram POSTs each update to `/<token>`. The update is dispatched and the
//! replies sent before the request is answered, so a slow backend delays the
//! next delivery rather than reordering a user's messages.

use super::types::Update;
use super::MessageSender;
use crate::dispatcher::Dispatcher;
use crate::runtime::Backend;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;

/// State shared across handlers
pub struct WebhookState<B: Backend> {
    pub dispatcher: Arc<Dispatcher<B>>,
    pub sender: Arc<dyn MessageSender>,
    /// Only updates posted to this path segment are accepted
    pub token: Arc<str>,
}

impl<B: Backend> Clone for WebhookState<B> {
    fn clone(&self) -> Self {
        Self {
            dispatcher: self.dispatcher.clone(),
            sender: self.sender.clone(),
            token: self.token.clone(),
        }
    }
}

pub fn create_router<B: Backend + 'static>(state: WebhookState<B>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/:token", post(handle_update::<B>))
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

async fn handle_update<B: Backend + 'static>(
    State(state): State<WebhookState<B>>,
    Path(token): Path<String>,
    Json(update): Json<Update>,
) -> StatusCode {
    if token.as_str() != &*state.token {
        return StatusCode::NOT_FOUND;
    }

    let update_id = update.update_id;
    let Some(incoming) = update.into_incoming() else {
        tracing::debug!(update_id, "Ignoring update without a user message");
        return StatusCode::OK;
    };

    let replies = state
        .dispatcher
        .dispatch(&incoming.user, incoming.input)
        .await;

    for reply in &replies {
        if let Err(e) = state.sender.send(incoming.chat_id, reply).await {
            tracing::error!(
                update_id,
                chat_id = incoming.chat_id,
                error = %e,
                "Failed to send reply"
            );
        }
    }

    // Telegram retries anything but 2xx; a failed send is not worth a redelivery
    StatusCode::OK
}
