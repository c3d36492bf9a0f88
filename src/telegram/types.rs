//! Telegram Bot API types, limited to the fields the bot reads or writes

use crate::dispatcher::Input;
use crate::runtime::UserIdentity;
use crate::state_machine::Reply;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub chat: Chat,
    #[serde(default)]
    pub from: Option<User>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
    pub first_name: String,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

impl From<User> for UserIdentity {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name,
            last_name: user.last_name,
            username: user.username,
        }
    }
}

/// A message the bot should act on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Incoming {
    pub chat_id: i64,
    pub user: UserIdentity,
    pub input: Input,
}

impl Update {
    /// `None` for updates without a human sender (edits, channel posts, bots)
    pub fn into_incoming(self) -> Option<Incoming> {
        let message = self.message?;
        let user = message.from.filter(|user| !user.is_bot)?;
        let input = match message.text {
            Some(text) => Input::Text(text),
            None => Input::NonText,
        };

        Some(Incoming {
            chat_id: message.chat.id,
            user: user.into(),
            input,
        })
    }
}

// ============================================================================
// Outgoing
// ============================================================================

#[derive(Debug, Serialize)]
pub struct SendMessage<'a> {
    pub chat_id: i64,
    pub text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_mode: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<ReplyKeyboardMarkup>,
}

impl<'a> SendMessage<'a> {
    pub fn from_reply(chat_id: i64, reply: &'a Reply) -> Self {
        Self {
            chat_id,
            text: &reply.text,
            parse_mode: reply.markdown.then_some("Markdown"),
            reply_markup: reply.menu.as_deref().map(ReplyKeyboardMarkup::one_per_row),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ReplyKeyboardMarkup {
    pub keyboard: Vec<Vec<KeyboardButton>>,
    pub resize_keyboard: bool,
}

impl ReplyKeyboardMarkup {
    pub fn one_per_row(labels: &[String]) -> Self {
        Self {
            keyboard: labels
                .iter()
                .map(|label| vec![KeyboardButton { text: label.clone() }])
                .collect(),
            resize_keyboard: true,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct KeyboardButton {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct SetWebhook<'a> {
    pub url: &'a str,
    pub allowed_updates: &'a [&'a str],
}

/// Envelope of every Bot API response
#[derive(Debug, Deserialize)]
pub struct ApiResponse {
    pub ok: bool,
    #[serde(default)]
    pub description: Option<String>,
}
