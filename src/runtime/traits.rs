//! Trait abstractions for runtime I/O
//!
//! These traits enable testing the executor with mock implementations.

use crate::backend::BackendError;
use crate::schedule::{ActivityRecord, ParticipantDetails};
use crate::state_machine::{CredentialExchangeResult, Identity, ParticipantCode};
use async_trait::async_trait;
use std::sync::Arc;

/// Who sent a message, as reported by the chat platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserIdentity {
    pub id: i64,
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: Option<String>,
}

impl UserIdentity {
    pub fn new(id: i64, first_name: impl Into<String>) -> Self {
        Self {
            id,
            first_name: first_name.into(),
            last_name: None,
            username: None,
        }
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn with_last_name(mut self, last_name: impl Into<String>) -> Self {
        self.last_name = Some(last_name.into());
        self
    }
}

/// Exchanges participant codes for credentials
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Present a code on behalf of a user. Transport failures are reported as
    /// `ServiceUnavailable`, never as errors.
    async fn exchange(&self, code: &ParticipantCode, user: &UserIdentity)
        -> CredentialExchangeResult;
}

/// Accepts feedback, attributed to a participant when one is logged in
#[async_trait]
pub trait FeedbackSink: Send + Sync {
    async fn submit(
        &self,
        code: Option<&ParticipantCode>,
        user: &UserIdentity,
        text: &str,
    ) -> Result<(), BackendError>;
}

/// Source of a participant's activity list
#[async_trait]
pub trait ScheduleStore: Send + Sync {
    async fn fetch_activities(&self, identity: &Identity)
        -> Result<Vec<ActivityRecord>, BackendError>;
}

/// Source of a participant's static details
#[async_trait]
pub trait DetailsStore: Send + Sync {
    async fn fetch_details(&self, identity: &Identity) -> Result<ParticipantDetails, BackendError>;
}

/// Combined collaborator trait for convenience
pub trait Backend: Authenticator + FeedbackSink + ScheduleStore + DetailsStore {}
impl<T: Authenticator + FeedbackSink + ScheduleStore + DetailsStore> Backend for T {}

// ============================================================================
// Arc implementations for trait objects
// ============================================================================

#[async_trait]
impl<T: Authenticator + ?Sized> Authenticator for Arc<T> {
    async fn exchange(
        &self,
        code: &ParticipantCode,
        user: &UserIdentity,
    ) -> CredentialExchangeResult {
        (**self).exchange(code, user).await
    }
}

#[async_trait]
impl<T: FeedbackSink + ?Sized> FeedbackSink for Arc<T> {
    async fn submit(
        &self,
        code: Option<&ParticipantCode>,
        user: &UserIdentity,
        text: &str,
    ) -> Result<(), BackendError> {
        (**self).submit(code, user, text).await
    }
}

#[async_trait]
impl<T: ScheduleStore + ?Sized> ScheduleStore for Arc<T> {
    async fn fetch_activities(
        &self,
        identity: &Identity,
    ) -> Result<Vec<ActivityRecord>, BackendError> {
        (**self).fetch_activities(identity).await
    }
}

#[async_trait]
impl<T: DetailsStore + ?Sized> DetailsStore for Arc<T> {
    async fn fetch_details(&self, identity: &Identity) -> Result<ParticipantDetails, BackendError> {
        (**self).fetch_details(identity).await
    }
}
