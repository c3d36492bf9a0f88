//! Remote data store
//!
//! Provides the production implementations of the runtime collaborator
//! traits, plus a logging wrapper.

mod client;
mod error;
mod wire;

pub use client::HttpBackend;
pub use error::{BackendError, BackendErrorKind};

use crate::runtime::{Authenticator, DetailsStore, FeedbackSink, ScheduleStore, UserIdentity};
use crate::schedule::{ActivityRecord, ParticipantDetails};
use crate::state_machine::{CredentialExchangeResult, Identity, ParticipantCode};
use async_trait::async_trait;
use std::time::Instant;

/// Logging wrapper for backends
pub struct LoggingBackend<B> {
    inner: B,
}

impl<B> LoggingBackend<B> {
    pub fn new(inner: B) -> Self {
        Self { inner }
    }
}

fn log_outcome<T>(call: &'static str, started: Instant, result: &Result<T, BackendError>) {
    let duration = started.elapsed();
    match result {
        Ok(_) => tracing::info!(
            call,
            duration_ms = %duration.as_millis(),
            "Backend request completed"
        ),
        Err(e) => tracing::error!(
            call,
            duration_ms = %duration.as_millis(),
            kind = ?e.kind,
            error = %e.message,
            "Backend request failed"
        ),
    }
}

#[async_trait]
impl<B: Authenticator> Authenticator for LoggingBackend<B> {
    async fn exchange(
        &self,
        code: &ParticipantCode,
        user: &UserIdentity,
    ) -> CredentialExchangeResult {
        let started = Instant::now();
        let result = self.inner.exchange(code, user).await;
        tracing::info!(
            call = "exchange",
            duration_ms = %started.elapsed().as_millis(),
            outcome = ?result,
            "Backend request completed"
        );
        result
    }
}

#[async_trait]
impl<B: FeedbackSink> FeedbackSink for LoggingBackend<B> {
    async fn submit(
        &self,
        code: Option<&ParticipantCode>,
        user: &UserIdentity,
        text: &str,
    ) -> Result<(), BackendError> {
        let started = Instant::now();
        let result = self.inner.submit(code, user, text).await;
        log_outcome("submit_feedback", started, &result);
        result
    }
}

#[async_trait]
impl<B: ScheduleStore> ScheduleStore for LoggingBackend<B> {
    async fn fetch_activities(
        &self,
        identity: &Identity,
    ) -> Result<Vec<ActivityRecord>, BackendError> {
        let started = Instant::now();
        let result = self.inner.fetch_activities(identity).await;
        log_outcome("fetch_activities", started, &result);
        result
    }
}

#[async_trait]
impl<B: DetailsStore> DetailsStore for LoggingBackend<B> {
    async fn fetch_details(&self, identity: &Identity) -> Result<ParticipantDetails, BackendError> {
        let started = Instant::now();
        let result = self.inner.fetch_details(identity).await;
        log_outcome("fetch_details", started, &result);
        result
    }
}
