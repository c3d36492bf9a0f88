//! Events that drive a session

use super::state::Credential;

/// Events that trigger state transitions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    // User commands
    Start,
    BeginFeedback,
    Cancel,

    // User input
    Text(String),
    /// A photo, sticker, voice note or anything else without text
    NonText,

    // Collaborator outcomes
    CodeExchanged(CredentialExchangeResult),
    FeedbackSubmitted { ok: bool },
}

/// Outcome of presenting a participant code to the authenticator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialExchangeResult {
    Authenticated { credential: Credential },
    Rejected { attempts_so_far: u32 },
    AccountLocked,
    ServiceUnavailable,
}
