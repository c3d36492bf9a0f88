//! Mock implementations for testing
//!
//! These mocks enable integration testing without real I/O.

use super::traits::*;
use super::SessionRuntime;
use crate::backend::BackendError;
use crate::schedule::{
    ActivityRecord, CategoryRules, ParticipantDetails, ResponderSettings, ScheduleResponder,
};
use crate::state_machine::{
    CredentialExchangeResult, Identity, LoginPolicy, ParticipantCode, SessionContext,
};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone};
use chrono_tz::Asia::Singapore;
use chrono_tz::Tz;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

// ============================================================================
// Mock Backend
// ============================================================================

/// A feedback submission as seen by the mock
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedFeedback {
    pub code: Option<ParticipantCode>,
    pub user_id: i64,
    pub text: String,
}

/// Mock backend that returns queued responses
///
/// An empty exchange queue answers `ServiceUnavailable`; an empty feedback
/// queue answers success. Schedule reads return the configured snapshot.
pub struct MockBackend {
    exchanges: Mutex<VecDeque<CredentialExchangeResult>>,
    /// Exchanges left that never resolve
    stalled_exchanges: Mutex<usize>,
    feedback_results: Mutex<VecDeque<Result<(), BackendError>>>,
    activities: Mutex<Result<Vec<ActivityRecord>, BackendError>>,
    details: Mutex<Result<ParticipantDetails, BackendError>>,
    /// Record of all codes presented
    pub exchanged_codes: Mutex<Vec<ParticipantCode>>,
    /// Record of all feedback submitted
    pub feedback: Mutex<Vec<RecordedFeedback>>,
}

#[allow(dead_code)]
impl MockBackend {
    pub fn new() -> Self {
        Self {
            exchanges: Mutex::new(VecDeque::new()),
            stalled_exchanges: Mutex::new(0),
            feedback_results: Mutex::new(VecDeque::new()),
            activities: Mutex::new(Ok(Vec::new())),
            details: Mutex::new(Ok(ParticipantDetails::default())),
            exchanged_codes: Mutex::new(Vec::new()),
            feedback: Mutex::new(Vec::new()),
        }
    }

    /// Queue the outcome of the next code exchange
    pub fn queue_exchange(&self, result: CredentialExchangeResult) {
        self.exchanges.lock().unwrap().push_back(result);
    }

    /// Make the next `count` exchanges hang until the caller gives up
    pub fn stall_exchanges(&self, count: usize) {
        *self.stalled_exchanges.lock().unwrap() = count;
    }

    /// Queue the outcome of the next feedback submission
    pub fn queue_feedback_result(&self, result: Result<(), BackendError>) {
        self.feedback_results.lock().unwrap().push_back(result);
    }

    pub fn set_activities(&self, activities: Result<Vec<ActivityRecord>, BackendError>) {
        *self.activities.lock().unwrap() = activities;
    }

    pub fn set_details(&self, details: Result<ParticipantDetails, BackendError>) {
        *self.details.lock().unwrap() = details;
    }

    pub fn recorded_codes(&self) -> Vec<ParticipantCode> {
        self.exchanged_codes.lock().unwrap().clone()
    }

    pub fn recorded_feedback(&self) -> Vec<RecordedFeedback> {
        self.feedback.lock().unwrap().clone()
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Authenticator for MockBackend {
    async fn exchange(
        &self,
        code: &ParticipantCode,
        _user: &UserIdentity,
    ) -> CredentialExchangeResult {
        self.exchanged_codes.lock().unwrap().push(code.clone());

        let stall = {
            let mut stalled = self.stalled_exchanges.lock().unwrap();
            let stall = *stalled > 0;
            *stalled = stalled.saturating_sub(1);
            stall
        };
        if stall {
            std::future::pending::<()>().await;
        }

        self.exchanges
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(CredentialExchangeResult::ServiceUnavailable)
    }
}

#[async_trait]
impl FeedbackSink for MockBackend {
    async fn submit(
        &self,
        code: Option<&ParticipantCode>,
        user: &UserIdentity,
        text: &str,
    ) -> Result<(), BackendError> {
        self.feedback.lock().unwrap().push(RecordedFeedback {
            code: code.cloned(),
            user_id: user.id,
            text: text.to_string(),
        });
        self.feedback_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(()))
    }
}

#[async_trait]
impl ScheduleStore for MockBackend {
    async fn fetch_activities(
        &self,
        _identity: &Identity,
    ) -> Result<Vec<ActivityRecord>, BackendError> {
        self.activities.lock().unwrap().clone()
    }
}

#[async_trait]
impl DetailsStore for MockBackend {
    async fn fetch_details(&self, _identity: &Identity) -> Result<ParticipantDetails, BackendError> {
        self.details.lock().unwrap().clone()
    }
}

// ============================================================================
// Test Runtime
// ============================================================================

pub fn at(month: u32, day: u32, hour: u32, minute: u32) -> DateTime<Tz> {
    Singapore
        .with_ymd_and_hms(2022, month, day, hour, minute, 0)
        .unwrap()
}

pub fn test_responder() -> Arc<ScheduleResponder> {
    Arc::new(ScheduleResponder::new(
        Arc::new(CategoryRules::default()),
        ResponderSettings {
            program_name: "NDP 2022".to_string(),
            program_start: at(8, 9, 0, 0),
            encouragement_base: "https://www.sokaglobal.org/resources/daily-encouragement/"
                .to_string(),
        },
    ))
}

pub fn test_user() -> UserIdentity {
    UserIdentity::new(1001, "Mei").with_username("mei_sgs")
}

/// Runtime over a shared mock so tests can inspect recorded calls
pub fn test_runtime(policy: LoginPolicy) -> (SessionRuntime<Arc<MockBackend>>, Arc<MockBackend>) {
    let backend = Arc::new(MockBackend::new());
    let context = SessionContext::new(
        policy,
        crate::state_machine::FeedbackPolicy::default(),
        crate::state_machine::CodeGrammar::default(),
    );
    let runtime = SessionRuntime::new(Arc::new(context), backend.clone(), test_responder());
    (runtime, backend)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::{Moment, Question};
    use crate::state_machine::{Credential, Event, Flow, SessionState, TransitionError};

    fn identity() -> Identity {
        Identity {
            code: ParticipantCode::normalized("A015"),
            credential: Credential::new("token-1"),
        }
    }

    #[tokio::test]
    async fn test_login_exchanges_code_and_shows_menu() {
        let (runtime, backend) = test_runtime(LoginPolicy::ServerTracked);
        backend.queue_exchange(CredentialExchangeResult::Authenticated {
            credential: Credential::new("token-1"),
        });
        let mut state = SessionState::default();
        let now = at(7, 1, 9, 0);

        runtime
            .process(&mut state, &test_user(), Event::Start, now)
            .await
            .unwrap();
        let replies = runtime
            .process(&mut state, &test_user(), Event::Text("a015".into()), now)
            .await
            .unwrap();

        assert_eq!(backend.recorded_codes(), vec![ParticipantCode::normalized("A015")]);
        assert_eq!(state, SessionState::new(Flow::Idle, Some(identity())));
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].text, "Please select your query:");
        assert_eq!(replies[0].menu.as_ref().map(Vec::len), Some(6));
    }

    #[tokio::test]
    async fn test_unavailable_authenticator_ends_login() {
        let (runtime, _backend) = test_runtime(LoginPolicy::ServerTracked);
        let mut state = SessionState::new(Flow::login(), None);

        let replies = runtime
            .process(&mut state, &test_user(), Event::Text("A015".into()), at(7, 1, 9, 0))
            .await
            .unwrap();

        assert_eq!(state, SessionState::default());
        assert_eq!(
            replies[0].text,
            "Unable to process request at this time. Please try again later"
        );
    }

    #[tokio::test]
    async fn test_feedback_is_attributed_to_logged_in_code() {
        let (runtime, backend) = test_runtime(LoginPolicy::ServerTracked);
        let mut state = SessionState::new(Flow::feedback(), Some(identity()));

        let replies = runtime
            .process(
                &mut state,
                &test_user(),
                Event::Text("Please add more shade".into()),
                at(7, 1, 9, 0),
            )
            .await
            .unwrap();

        assert_eq!(replies[0].text, "Thank you for your feedback!");
        assert_eq!(
            backend.recorded_feedback(),
            vec![RecordedFeedback {
                code: Some(ParticipantCode::normalized("A015")),
                user_id: 1001,
                text: "Please add more shade".to_string(),
            }]
        );
        assert_eq!(state.flow, Flow::Idle);
    }

    #[tokio::test]
    async fn test_failed_feedback_submission() {
        let (runtime, backend) = test_runtime(LoginPolicy::ServerTracked);
        backend.queue_feedback_result(Err(BackendError::status(500, "boom")));
        let mut state = SessionState::new(Flow::feedback(), None);

        let replies = runtime
            .process(
                &mut state,
                &test_user(),
                Event::Text("Anonymous comment".into()),
                at(7, 1, 9, 0),
            )
            .await
            .unwrap();

        assert_eq!(replies[0].text, "Failed to submit feedback. Please try again later");
        assert_eq!(backend.recorded_feedback()[0].code, None);
        assert_eq!(state, SessionState::default());
    }

    #[tokio::test]
    async fn test_answer_renders_markdown_next_activity() {
        let (runtime, backend) = test_runtime(LoginPolicy::ServerTracked);
        backend.set_activities(Ok(vec![ActivityRecord::new(
            "Zoom Briefing",
            "Zoom",
            Moment::Known(at(7, 1, 20, 0)),
            Moment::Known(at(7, 1, 21, 0)),
        )]));
        backend.set_details(Ok(ParticipantDetails {
            zoom_link: "https://zoom.us/j/42".to_string(),
            ..ParticipantDetails::default()
        }));
        let mut state = SessionState::new(Flow::Idle, Some(identity()));

        let replies = runtime
            .process(
                &mut state,
                &test_user(),
                Event::Text(Question::NextActivity.label().into()),
                at(7, 1, 9, 0),
            )
            .await
            .unwrap();

        assert_eq!(replies.len(), 1);
        assert!(replies[0].markdown);
        assert!(replies[0].text.starts_with("*Zoom Briefing*"));
        assert!(replies[0].text.contains("Zoom Link: https://zoom.us/j/42"));
    }

    #[tokio::test]
    async fn test_answer_fetch_failure_keeps_session() {
        let (runtime, backend) = test_runtime(LoginPolicy::ServerTracked);
        backend.set_details(Err(BackendError::network("timed out")));
        let mut state = SessionState::new(Flow::Idle, Some(identity()));

        let replies = runtime
            .process(
                &mut state,
                &test_user(),
                Event::Text(Question::ZoomLink.label().into()),
                at(7, 1, 9, 0),
            )
            .await
            .unwrap();

        assert_eq!(
            replies[0].text,
            "Unable to get zoom link. Please try again later or type /start to reset"
        );
        assert!(!replies[0].markdown);
        assert_eq!(state, SessionState::new(Flow::Idle, Some(identity())));
    }

    #[tokio::test]
    async fn test_daily_encouragement_needs_no_fetch() {
        let (runtime, backend) = test_runtime(LoginPolicy::ServerTracked);
        backend.set_activities(Err(BackendError::network("down")));
        backend.set_details(Err(BackendError::network("down")));
        let mut state = SessionState::new(Flow::Idle, Some(identity()));

        let replies = runtime
            .process(
                &mut state,
                &test_user(),
                Event::Text(Question::DailyEncouragement.label().into()),
                at(7, 4, 9, 0),
            )
            .await
            .unwrap();

        assert_eq!(
            replies[0].text,
            "https://www.sokaglobal.org/resources/daily-encouragement/july-4.html"
        );
    }

    #[tokio::test]
    async fn test_busy_state_is_reported() {
        let (runtime, _backend) = test_runtime(LoginPolicy::ServerTracked);
        let mut state = SessionState::new(Flow::SubmittingFeedback, None);

        let result = runtime
            .process(&mut state, &test_user(), Event::NonText, at(7, 1, 9, 0))
            .await;

        assert_eq!(result.unwrap_err(), TransitionError::Busy);
        assert_eq!(state.flow, Flow::SubmittingFeedback);
    }
}
