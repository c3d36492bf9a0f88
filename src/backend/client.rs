//! HTTP client for the remote data store

use super::wire::{parse_activities, RejectionBody, TokenResponse};
use super::BackendError;
use crate::runtime::{Authenticator, DetailsStore, FeedbackSink, ScheduleStore, UserIdentity};
use crate::schedule::{ActivityRecord, ParticipantDetails};
use crate::state_machine::{Credential, CredentialExchangeResult, Identity, ParticipantCode};
use async_trait::async_trait;
use chrono_tz::Tz;
use reqwest::{Client, StatusCode, Url};
use std::time::Duration;

/// Path segment used for feedback from users who are not logged in
const ANONYMOUS: &str = "nil";

/// Remote data store over HTTP
pub struct HttpBackend {
    client: Client,
    base_url: Url,
    tz: Tz,
}

impl HttpBackend {
    pub fn new(base_url: &str, tz: Tz, timeout: Duration) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::network(format!("Failed to build HTTP client: {e}")))?;

        let base_url = Url::parse(base_url)
            .map_err(|e| BackendError::network(format!("Invalid data store URL {base_url:?}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(BackendError::network(format!(
                "Invalid data store URL {base_url}: not a base URL"
            )));
        }

        Ok(Self {
            client,
            base_url,
            tz,
        })
    }

    /// `{base}/{resource}/{code}/` followed by `extra` segments, each ending in
    /// a slash. The code is percent-encoded as a single segment, so `/` or
    /// `..` in user input cannot leave the resource path.
    fn url(&self, resource: &str, code: &str, extra: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .push(resource)
                .push(code)
                .extend(extra)
                .push("");
        }
        url
    }

    /// GET a participant resource with the session token header
    async fn get_authorized(
        &self,
        resource: &str,
        identity: &Identity,
    ) -> Result<String, BackendError> {
        let path = format!("{resource}/{}/1/", identity.code);
        let response = self
            .client
            .get(self.url(resource, identity.code.as_str(), &["1"]))
            .header("token", identity.credential.expose())
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let body = response.text().await.map_err(transport_error)?;
        if status != StatusCode::OK {
            return Err(BackendError::status(
                status.as_u16(),
                format!("GET {path} returned {status}"),
            ));
        }
        Ok(body)
    }
}

fn transport_error(e: reqwest::Error) -> BackendError {
    if e.is_timeout() {
        BackendError::network(format!("Request timeout: {e}"))
    } else {
        BackendError::network(format!("Request failed: {e}"))
    }
}

fn user_form<'a>(code: &'a str, user: &'a UserIdentity) -> Vec<(&'static str, &'a str)> {
    vec![
        ("participantCode", code),
        ("username", user.username.as_deref().unwrap_or_default()),
        ("firstname", user.first_name.as_str()),
        ("lastname", user.last_name.as_deref().unwrap_or_default()),
    ]
}

/// Map an exchange response onto its outcome
pub(crate) fn classify_exchange(status: u16, body: &str) -> CredentialExchangeResult {
    match status {
        200 => match serde_json::from_str::<TokenResponse>(body) {
            Ok(TokenResponse { token }) if !token.is_empty() => {
                CredentialExchangeResult::Authenticated {
                    credential: Credential::new(token),
                }
            }
            _ => {
                tracing::warn!("Exchange succeeded without a usable token");
                CredentialExchangeResult::ServiceUnavailable
            }
        },
        401 | 404 => {
            let rejection: RejectionBody = serde_json::from_str(body).unwrap_or_default();
            CredentialExchangeResult::Rejected {
                attempts_so_far: rejection.attempts,
            }
        }
        403 | 423 => CredentialExchangeResult::AccountLocked,
        _ => CredentialExchangeResult::ServiceUnavailable,
    }
}

#[async_trait]
impl Authenticator for HttpBackend {
    async fn exchange(
        &self,
        code: &ParticipantCode,
        user: &UserIdentity,
    ) -> CredentialExchangeResult {
        let response = self
            .client
            .post(self.url("user", code.as_str(), &[]))
            .form(&user_form(code.as_str(), user))
            .send()
            .await;

        let response = match response {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(code = %code, error = %transport_error(e), "Code exchange failed");
                return CredentialExchangeResult::ServiceUnavailable;
            }
        };

        let status = response.status().as_u16();
        match response.text().await {
            Ok(body) => classify_exchange(status, &body),
            Err(e) => {
                tracing::error!(code = %code, error = %transport_error(e), "Code exchange failed");
                CredentialExchangeResult::ServiceUnavailable
            }
        }
    }
}

#[async_trait]
impl FeedbackSink for HttpBackend {
    async fn submit(
        &self,
        code: Option<&ParticipantCode>,
        user: &UserIdentity,
        text: &str,
    ) -> Result<(), BackendError> {
        let code = code.map(ParticipantCode::as_str);
        let segment = code.unwrap_or(ANONYMOUS);
        let path = format!("feedback/{segment}/");

        let mut form = user_form(code.unwrap_or_default(), user);
        form.push(("feedback", text));

        let response = self
            .client
            .post(self.url("feedback", segment, &[]))
            .form(&form)
            .send()
            .await
            .map_err(transport_error)?;

        match response.status() {
            StatusCode::CREATED => Ok(()),
            status => Err(BackendError::status(
                status.as_u16(),
                format!("POST {path} returned {status}"),
            )),
        }
    }
}

#[async_trait]
impl ScheduleStore for HttpBackend {
    async fn fetch_activities(
        &self,
        identity: &Identity,
    ) -> Result<Vec<ActivityRecord>, BackendError> {
        let body = self
            .get_authorized("training", identity)
            .await?;
        parse_activities(&body, self.tz)
    }
}

#[async_trait]
impl DetailsStore for HttpBackend {
    async fn fetch_details(&self, identity: &Identity) -> Result<ParticipantDetails, BackendError> {
        let body = self
            .get_authorized("details", identity)
            .await?;
        serde_json::from_str(&body)
            .map_err(|e| BackendError::decode(format!("Failed to parse details: {e}")))
    }
}
