//! Effects produced by state transitions

use super::code::ParticipantCode;
use super::state::Identity;
use crate::schedule::Question;

/// Effects to be executed after state transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Send a message to the user
    Reply(Reply),

    /// Present a code to the authenticator; answered by `Event::CodeExchanged`
    ExchangeCode { code: ParticipantCode },

    /// Hand feedback to the sink; answered by `Event::FeedbackSubmitted`
    SubmitFeedback {
        code: Option<ParticipantCode>,
        text: String,
    },

    /// Answer a schedule question for a logged-in participant
    Answer {
        question: Question,
        identity: Identity,
    },
}

impl Effect {
    pub fn reply(text: impl Into<String>) -> Self {
        Effect::Reply(Reply::text(text))
    }

    pub fn reply_with_menu(text: impl Into<String>, menu: Vec<String>) -> Self {
        Effect::Reply(Reply::text(text).with_menu(menu))
    }
}

/// Outgoing message handed back to the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    /// Keyboard to show with this message, one button per row
    pub menu: Option<Vec<String>>,
    /// Render `text` as Telegram Markdown
    pub markdown: bool,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            menu: None,
            markdown: false,
        }
    }

    pub fn markdown(text: impl Into<String>) -> Self {
        Self {
            markdown: true,
            ..Self::text(text)
        }
    }

    pub fn with_menu(mut self, menu: Vec<String>) -> Self {
        self.menu = Some(menu);
        self
    }
}
