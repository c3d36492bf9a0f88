//! Pure state transition function
//!
//! Login: `Login -> Authenticating -> {Idle (logged in), Login (retry), Idle (locked), Idle (error)}`
//! Feedback: `Feedback -> SubmittingFeedback -> {Idle (submitted), Idle (error)}`

use super::code::ParticipantCode;
use super::event::CredentialExchangeResult;
use super::state::{Flow, Identity, LoginPolicy, SessionContext, SessionState};
use super::{Effect, Event};
use crate::schedule::Question;
use thiserror::Error;

/// Reminders about /cancel start on this many repeated failures
const REMINDER_AFTER: u32 = 3;

pub(crate) const LOGIN_PROMPT: &str = "What's your participant code:";
pub(crate) const LOGIN_NON_TEXT: &str = "Please type your participant code:";
pub(crate) const INVALID_CODE: &str = "Invalid participant code. Please try again:";
pub(crate) const CANCEL_REMINDER: &str = "You can type /cancel to exit";
pub(crate) const LOGIN_SUCCESS: &str = "Please select your query:";
pub(crate) const ACCOUNT_LOCKED: &str = "Your account has been blocked after too many failed login attempts. \
    Please submit a request to unblock it through /feedback";
pub(crate) const LOGIN_UNAVAILABLE: &str =
    "Unable to process request at this time. Please try again later";

pub(crate) const FEEDBACK_INTRO: &str = "NamjaNinjaBot will listen to all feedback. \
    Please follow the steps to submit one. If you decided to change your mind, just type /cancel";
pub(crate) const FEEDBACK_PROMPT: &str = "Please type your feedback:";
pub(crate) const FEEDBACK_NON_TEXT: &str = "Please type your feedback as text:";
pub(crate) const FEEDBACK_RESERVED: &str = "Feedback cannot be one of the questions that NamjaNinja can help you with. \
    Type /cancel if you want to ask a question instead";
pub(crate) const FEEDBACK_THANKS: &str = "Thank you for your feedback!";
pub(crate) const FEEDBACK_FAILED: &str = "Failed to submit feedback. Please try again later";

pub(crate) const CANCELLED_LOGIN: &str = "Cancelled login process";
pub(crate) const CANCELLED_FEEDBACK: &str = "Cancelled feedback submission";
pub(crate) const NOTHING_TO_CANCEL: &str =
    "There is nothing to cancel. Type /help to see what I can do";

pub(crate) const START_FIRST: &str = "Please type /start first";
pub(crate) const INVALID_QUESTION: &str = "Please select a valid question or type /help";

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: SessionState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: SessionState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn with_effects(mut self, effects: impl IntoIterator<Item = Effect>) -> Self {
        self.effects.extend(effects);
        self
    }
}

/// Errors that can occur during transition
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Still working on your previous message, please wait")]
    Busy,
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
}

/// Pure transition function
///
/// Given the same inputs it always produces the same outputs, with no I/O.
pub fn transition(
    state: &SessionState,
    context: &SessionContext,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match (&state.flow, event) {
        // ============================================================
        // Flow entry (flows never nest: entering one abandons the other)
        // ============================================================

        // Logging in again always starts from a clean identity
        (_, Event::Start) => Ok(TransitionResult::new(SessionState::new(Flow::login(), None))
            .with_effect(Effect::reply(LOGIN_PROMPT))),

        (_, Event::BeginFeedback) => Ok(TransitionResult::new(SessionState::new(
            Flow::feedback(),
            state.identity.clone(),
        ))
        .with_effect(Effect::reply(FEEDBACK_INTRO))
        .with_effect(Effect::reply(FEEDBACK_PROMPT))),

        // ============================================================
        // Cancellation
        // ============================================================
        (Flow::Login { .. } | Flow::Authenticating { .. }, Event::Cancel) => Ok(
            TransitionResult::new(SessionState::new(Flow::Idle, None))
                .with_effect(Effect::reply(CANCELLED_LOGIN)),
        ),

        (Flow::Feedback { .. } | Flow::SubmittingFeedback, Event::Cancel) => Ok(
            TransitionResult::new(SessionState::new(Flow::Idle, state.identity.clone()))
                .with_effect(Effect::reply(CANCELLED_FEEDBACK)),
        ),

        (Flow::Idle, Event::Cancel) => {
            Ok(TransitionResult::new(state.clone()).with_effect(Effect::reply(NOTHING_TO_CANCEL)))
        }

        // ============================================================
        // Login
        // ============================================================
        (Flow::Login { retries, non_text }, Event::NonText) => {
            let non_text = non_text + 1;
            Ok(TransitionResult::new(SessionState::new(
                Flow::Login {
                    retries: *retries,
                    non_text,
                },
                None,
            ))
            .with_effects(with_reminder(LOGIN_NON_TEXT, non_text >= REMINDER_AFTER)))
        }

        (Flow::Login { retries, non_text }, Event::Text(text)) => {
            let code = ParticipantCode::normalized(&text);

            if context.login_policy == LoginPolicy::LocalValidation
                && !context.code_grammar.accepts(&code)
            {
                let retries = retries + 1;
                return Ok(TransitionResult::new(SessionState::new(
                    Flow::Login {
                        retries,
                        non_text: *non_text,
                    },
                    None,
                ))
                .with_effects(with_reminder(INVALID_CODE, retries >= REMINDER_AFTER)));
            }

            Ok(TransitionResult::new(SessionState::new(
                Flow::Authenticating {
                    code: code.clone(),
                    retries: *retries,
                    non_text: *non_text,
                },
                None,
            ))
            .with_effect(Effect::ExchangeCode { code }))
        }

        (
            Flow::Authenticating {
                code,
                retries,
                non_text,
            },
            Event::CodeExchanged(result),
        ) => Ok(exchange_outcome(
            context,
            code,
            *retries,
            *non_text,
            result,
        )),

        // ============================================================
        // Feedback
        // ============================================================
        (Flow::Feedback { non_text }, Event::NonText) => {
            let non_text = non_text + 1;
            Ok(TransitionResult::new(SessionState::new(
                Flow::Feedback { non_text },
                state.identity.clone(),
            ))
            .with_effects(with_reminder(FEEDBACK_NON_TEXT, non_text >= REMINDER_AFTER)))
        }

        (Flow::Feedback { .. }, Event::Text(text)) => {
            if let Some(rejection) = check_feedback(context, &text) {
                return Ok(TransitionResult::new(state.clone()).with_effect(Effect::reply(rejection)));
            }

            let code = state.identity.as_ref().map(|identity| identity.code.clone());
            Ok(TransitionResult::new(SessionState::new(
                Flow::SubmittingFeedback,
                state.identity.clone(),
            ))
            .with_effect(Effect::SubmitFeedback { code, text }))
        }

        (Flow::SubmittingFeedback, Event::FeedbackSubmitted { ok }) => {
            let message = if ok { FEEDBACK_THANKS } else { FEEDBACK_FAILED };
            Ok(
                TransitionResult::new(SessionState::new(Flow::Idle, state.identity.clone()))
                    .with_effect(Effect::reply(message)),
            )
        }

        // ============================================================
        // Questions (no flow active)
        // ============================================================
        (Flow::Idle, Event::Text(text)) => {
            let effect = match (&state.identity, Question::from_label(&text)) {
                (None, _) => Effect::reply(START_FIRST),
                (Some(identity), Some(question)) => Effect::Answer {
                    question,
                    identity: identity.clone(),
                },
                (Some(_), None) => Effect::reply(INVALID_QUESTION),
            };
            Ok(TransitionResult::new(state.clone()).with_effect(effect))
        }

        (Flow::Idle, Event::NonText) => {
            let message = if state.is_logged_in() {
                INVALID_QUESTION
            } else {
                START_FIRST
            };
            Ok(TransitionResult::new(state.clone()).with_effect(Effect::reply(message)))
        }

        // ============================================================
        // Input while a collaborator call is in flight
        // ============================================================
        (
            Flow::Authenticating { .. } | Flow::SubmittingFeedback,
            Event::Text(_) | Event::NonText,
        ) => Err(TransitionError::Busy),

        // ============================================================
        // Invalid Transitions
        // ============================================================
        (flow, event) => Err(TransitionError::InvalidTransition(format!(
            "No transition from {flow:?} with event {event:?}"
        ))),
    }
}

// Helper functions

fn exchange_outcome(
    context: &SessionContext,
    code: &ParticipantCode,
    retries: u32,
    non_text: u32,
    result: CredentialExchangeResult,
) -> TransitionResult {
    match result {
        CredentialExchangeResult::Authenticated { credential } => {
            let identity = Identity {
                code: code.clone(),
                credential,
            };
            TransitionResult::new(SessionState::new(Flow::Idle, Some(identity)))
                .with_effect(Effect::reply_with_menu(LOGIN_SUCCESS, context.menu_labels()))
        }

        CredentialExchangeResult::Rejected { attempts_so_far } => {
            let retries = retries + 1;
            let mut effects = Vec::new();
            if attempts_so_far >= REMINDER_AFTER {
                effects.push(Effect::reply(format!(
                    "You have made {attempts_so_far} failed login attempts"
                )));
            }
            effects.extend(with_reminder(
                INVALID_CODE,
                retries >= REMINDER_AFTER || attempts_so_far >= REMINDER_AFTER,
            ));
            TransitionResult::new(SessionState::new(Flow::Login { retries, non_text }, None))
                .with_effects(effects)
        }

        CredentialExchangeResult::AccountLocked => {
            TransitionResult::new(SessionState::new(Flow::Idle, None))
                .with_effect(Effect::reply(ACCOUNT_LOCKED))
        }

        CredentialExchangeResult::ServiceUnavailable => {
            TransitionResult::new(SessionState::new(Flow::Idle, None))
                .with_effect(Effect::reply(LOGIN_UNAVAILABLE))
        }
    }
}

/// The reminder goes first, then the re-prompt
fn with_reminder(message: &str, remind: bool) -> Vec<Effect> {
    let mut effects = Vec::with_capacity(2);
    if remind {
        effects.push(Effect::reply(CANCEL_REMINDER));
    }
    effects.push(Effect::reply(message));
    effects
}

/// Why a feedback text cannot be submitted, if it cannot
fn check_feedback(context: &SessionContext, text: &str) -> Option<String> {
    let policy = &context.feedback_policy;
    let length = text.chars().count();

    if Question::from_label(text).is_some() {
        return Some(FEEDBACK_RESERVED.to_string());
    }
    if let Some(min_len) = policy.min_len {
        if length <= min_len {
            return Some(format!(
                "Feedback is too short. It should be more than {min_len} characters. Please try again"
            ));
        }
    }
    if length > policy.max_len {
        return Some(format!(
            "Feedback is too long. It should be less than {} characters. \
             The submitted feedback was {length} characters long. Please try again",
            policy.max_len
        ));
    }
    None
}
