//! Routes incoming messages to commands, flows, and the responder

use crate::runtime::{Backend, SessionManager, SessionRuntime, UserIdentity};
use crate::state_machine::{ActiveFlow, Event, Reply};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;

const BOT_LINK: &str = "https://t.me/NamjaNinjabot";
const UNKNOWN_COMMAND_IN_FLOW: &str =
    "That command is not available right now. Type /cancel to exit first";

/// A message as far as the bot cares
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Text(String),
    /// Photos, stickers, voice notes and everything else without text
    NonText,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Start,
    Cancel,
    Feedback,
    Help,
    About,
    Share,
    Other,
}

impl Command {
    /// `/name` or `/name@botname`, optionally followed by arguments
    fn parse(text: &str) -> Option<Self> {
        let word = text.trim_start().strip_prefix('/')?.split_whitespace().next()?;
        let name = word.split('@').next().unwrap_or_default();

        Some(match name.to_lowercase().as_str() {
            "start" => Command::Start,
            "cancel" => Command::Cancel,
            "feedback" => Command::Feedback,
            "help" => Command::Help,
            "about" => Command::About,
            "share" => Command::Share,
            _ => Command::Other,
        })
    }

    fn name(self) -> &'static str {
        match self {
            Command::Start => "start",
            Command::Cancel => "cancel",
            Command::Feedback => "feedback",
            Command::Help => "help",
            Command::About => "about",
            Command::Share => "share",
            Command::Other => "other",
        }
    }
}

fn help_text(first_name: &str, program_name: &str) -> String {
    format!(
        "Hi {first_name}! I am NamjaNinja! I can assist you on your SGS {program_name} journey!\n\n\
         Send the following commands to get started:\n\
         /start - Lists all the queries I can help you with\n\
         /about - Learn more about me\n\
         /feedback - Tell me how I can improve\n\
         /help - Describes how to use me\n\
         /share - Share me with your fellow participants"
    )
}

fn about_text(program_name: &str) -> String {
    format!(
        "*About*\nNamjaNinjaBot is a telegram bot that is aimed at allowing Soka Gakkai Singapore (SGS) \
         {program_name} participants to obtain training and meeting details easily and quickly. \
         Participants can also get daily encouragements through the bot\n\n\
         *Disclaimer*\nThis bot was created in good faith by one of the participants to be a handy \
         companion to the participants and should strictly be used for such purposes only. \
         By using NamjaNinjaBot, you agree to the collection of user data that will solely be used for \
         NamjaNinjaBot performance monitoring and the bot is used for its intended purpose only. \
         Thank you for your understanding"
    )
}

fn share_text(program_name: &str) -> String {
    format!(
        "Hello! I am NamjaNinjaBot, a telegram Bot that can provide training information and \
         encouragement to SGS {program_name} participants\n{BOT_LINK}"
    )
}

/// Owns every session and feeds messages through the runtime
pub struct Dispatcher<B: Backend> {
    sessions: SessionManager,
    runtime: SessionRuntime<B>,
    timezone: Tz,
}

impl<B: Backend> Dispatcher<B> {
    pub fn new(runtime: SessionRuntime<B>, timezone: Tz) -> Self {
        Self {
            sessions: SessionManager::new(),
            runtime,
            timezone,
        }
    }

    /// Handle one message at the current time
    pub async fn dispatch(&self, user: &UserIdentity, input: Input) -> Vec<Reply> {
        let now = Utc::now().with_timezone(&self.timezone);
        self.dispatch_at(user, input, now).await
    }

    /// Handle one message as if it arrived at `now`
    pub async fn dispatch_at(
        &self,
        user: &UserIdentity,
        input: Input,
        now: DateTime<Tz>,
    ) -> Vec<Reply> {
        let program_name = &self.runtime.responder().settings().program_name;

        let event = match input {
            Input::NonText => Event::NonText,
            Input::Text(text) => match Command::parse(&text) {
                None => Event::Text(text),
                Some(command) => {
                    tracing::info!(
                        user_id = user.id,
                        username = user.username.as_deref().unwrap_or_default(),
                        command = command.name(),
                        "Command issued"
                    );
                    match command {
                        Command::Start => Event::Start,
                        Command::Cancel => Event::Cancel,
                        Command::Feedback => Event::BeginFeedback,
                        Command::Help => {
                            return vec![Reply::text(help_text(&user.first_name, program_name))]
                        }
                        Command::About => return vec![Reply::markdown(about_text(program_name))],
                        Command::Share => return vec![Reply::text(share_text(program_name))],
                        Command::Other => Event::Text(text),
                    }
                }
            },
        };

        let session = self.sessions.get_or_create(user.id).await;
        // Held for the whole input, collaborator calls included
        let mut state = session.lock().await;

        if matches!(event, Event::Text(ref text) if text.starts_with('/'))
            && state.flow.active() != ActiveFlow::None
        {
            return vec![Reply::text(UNKNOWN_COMMAND_IN_FLOW)];
        }

        match self.runtime.process(&mut state, user, event, now).await {
            Ok(replies) => replies,
            Err(e) => {
                tracing::warn!(user_id = user.id, error = %e, "Rejected input");
                vec![Reply::text(e.to_string())]
            }
        }
    }
}
