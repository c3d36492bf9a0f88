//! Per-user session state machine
//!
//! Implements the Elm Architecture pattern with pure state transitions. The
//! login and feedback conversations are the two flows; everything that talks
//! to the outside world is returned as an [`Effect`].

mod code;
mod effect;
pub mod event;
pub mod state;
pub(crate) mod transition;

#[cfg(test)]
mod proptests;

pub use code::{CodeGrammar, ParticipantCode, DEFAULT_CODE_PATTERN};
pub use effect::{Effect, Reply};
pub use event::{CredentialExchangeResult, Event};
pub use state::{
    ActiveFlow, Credential, FeedbackPolicy, Flow, Identity, LoginPolicy, SessionContext,
    SessionState,
};
pub use transition::{transition, TransitionError, TransitionResult};
