//! Session state types

use super::code::{CodeGrammar, ParticipantCode};
use crate::schedule::Question;
use std::fmt;

// ============================================================================
// Identity
// ============================================================================

/// Opaque session token issued by the authenticator
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(..)")
    }
}

/// A logged-in participant. The credential was issued for this code, so the
/// two only ever exist together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub code: ParticipantCode,
    pub credential: Credential,
}

// ============================================================================
// Session State
// ============================================================================

/// Which conversation, if any, the user is in
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Flow {
    /// No conversation; text is treated as a question label
    #[default]
    Idle,

    /// Waiting for the participant code
    Login {
        /// Rejected codes so far (local syntax failures or authenticator rejections)
        retries: u32,
        /// Non-text messages received while waiting
        non_text: u32,
    },

    /// Code sent to the authenticator, waiting for the exchange result
    Authenticating {
        code: ParticipantCode,
        retries: u32,
        non_text: u32,
    },

    /// Waiting for the feedback text
    Feedback { non_text: u32 },

    /// Feedback sent to the sink, waiting for the outcome
    SubmittingFeedback,
}

impl Flow {
    pub fn login() -> Self {
        Flow::Login {
            retries: 0,
            non_text: 0,
        }
    }

    pub fn feedback() -> Self {
        Flow::Feedback { non_text: 0 }
    }

    pub fn active(&self) -> ActiveFlow {
        match self {
            Flow::Idle => ActiveFlow::None,
            Flow::Login { .. } | Flow::Authenticating { .. } => ActiveFlow::Login,
            Flow::Feedback { .. } | Flow::SubmittingFeedback => ActiveFlow::Feedback,
        }
    }

    /// Waiting on a collaborator; user input is not accepted
    pub fn is_in_flight(&self) -> bool {
        matches!(self, Flow::Authenticating { .. } | Flow::SubmittingFeedback)
    }
}

/// Coarse view of [`Flow`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveFlow {
    None,
    Login,
    Feedback,
}

/// Everything the bot remembers about one user
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionState {
    pub flow: Flow,
    pub identity: Option<Identity>,
}

impl SessionState {
    pub fn new(flow: Flow, identity: Option<Identity>) -> Self {
        Self { flow, identity }
    }

    pub fn is_logged_in(&self) -> bool {
        self.identity.is_some()
    }
}

// ============================================================================
// Session Context
// ============================================================================

/// How login input is checked before it reaches the authenticator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoginPolicy {
    /// Malformed codes are rejected locally and never sent
    LocalValidation,
    /// Every text is forwarded; the authenticator counts attempts and locks
    #[default]
    ServerTracked,
}

/// Feedback length limits, in characters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedbackPolicy {
    /// Texts this short or shorter are rejected. `None` disables the check.
    pub min_len: Option<usize>,
    /// Texts longer than this are rejected
    pub max_len: usize,
}

impl Default for FeedbackPolicy {
    fn default() -> Self {
        Self {
            min_len: Some(5),
            max_len: 500,
        }
    }
}

/// Immutable configuration shared by every session
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub login_policy: LoginPolicy,
    pub feedback_policy: FeedbackPolicy,
    pub code_grammar: CodeGrammar,
    /// Questions offered on the keyboard after login
    pub menu: Vec<Question>,
}

impl SessionContext {
    pub fn new(
        login_policy: LoginPolicy,
        feedback_policy: FeedbackPolicy,
        code_grammar: CodeGrammar,
    ) -> Self {
        Self {
            login_policy,
            feedback_policy,
            code_grammar,
            menu: Question::ALL.to_vec(),
        }
    }

    pub fn with_menu(mut self, menu: Vec<Question>) -> Self {
        self.menu = menu;
        self
    }

    pub fn menu_labels(&self) -> Vec<String> {
        self.menu.iter().map(|q| q.label().to_string()).collect()
    }
}

#[cfg(test)]
impl Default for SessionContext {
    fn default() -> Self {
        Self::new(
            LoginPolicy::default(),
            FeedbackPolicy::default(),
            CodeGrammar::default(),
        )
    }
}
