//! Answers to the question menu
//!
//! `ScheduleResponder::answer` does the fetching; the `render_*` functions
//! are pure and take already-fetched snapshots.

use super::question::Question;
use super::resolver::{
    countdown, daily_encouragement_slug, find_next_upcoming, format_date, format_moment_date,
    format_time_range, sort_upcoming, Countdown,
};
use super::rules::{CategoryRules, Extra};
use super::types::{ActivityRecord, ParticipantDetails};
use crate::runtime::{DetailsStore, ScheduleStore};
use crate::state_machine::Identity;
use chrono::DateTime;
use chrono_tz::Tz;
use std::fmt::Write as _;
use std::sync::Arc;

const RETRY_SUFFIX: &str = "Please try again later or type /start to reset";

/// Program-level settings used when rendering answers
#[derive(Debug, Clone)]
pub struct ResponderSettings {
    /// e.g. "NDP 2022"
    pub program_name: String,
    /// Start of the program day, target of the second countdown line
    pub program_start: DateTime<Tz>,
    /// Daily encouragement pages live at `<base><slug>.html`
    pub encouragement_base: String,
}

pub struct ScheduleResponder {
    rules: Arc<CategoryRules>,
    settings: ResponderSettings,
}

impl ScheduleResponder {
    pub fn new(rules: Arc<CategoryRules>, settings: ResponderSettings) -> Self {
        Self { rules, settings }
    }

    pub fn settings(&self) -> &ResponderSettings {
        &self.settings
    }

    /// Fetch what the question needs and render the answer.
    ///
    /// A failed fetch produces the question's "try again" message; nothing is
    /// retried here.
    pub async fn answer<S>(
        &self,
        store: &S,
        question: Question,
        identity: &Identity,
        now: DateTime<Tz>,
    ) -> String
    where
        S: ScheduleStore + DetailsStore + ?Sized,
    {
        let code = identity.code.as_str();
        let answer = match question {
            Question::NextActivity => {
                let fetched = tokio::try_join!(
                    store.fetch_activities(identity),
                    store.fetch_details(identity)
                );
                fetched.map(|(activities, details)| {
                    render_next_activity(&activities, &details, &self.rules, &self.settings, &now)
                })
            }
            Question::AllActivities => store
                .fetch_activities(identity)
                .await
                .map(|activities| render_all_activities(&activities, &self.settings, &now)),
            Question::ZoomLink => store
                .fetch_details(identity)
                .await
                .map(|details| format!("Zoom Link: {}", details.zoom_link)),
            Question::LastUpdated => store.fetch_details(identity).await.map(|details| {
                format!(
                    "The training schedule for the bot was last updated on: {}",
                    details.last_update
                )
            }),
            Question::Countdown => store
                .fetch_activities(identity)
                .await
                .map(|activities| render_countdown(&activities, &self.settings, &now)),
            Question::DailyEncouragement => Ok(render_daily_encouragement(&self.settings, &now)),
        };

        match answer {
            Ok(text) => {
                tracing::info!(code = %code, question = question.label(), "Answered question");
                text
            }
            Err(e) => {
                tracing::error!(
                    code = %code,
                    question = question.label(),
                    error = %e,
                    "Failed to get schedule data"
                );
                failure_message(question)
            }
        }
    }
}

/// The "try again" text for a question whose data could not be fetched
pub fn failure_message(question: Question) -> String {
    let what = match question {
        Question::NextActivity => "next training details",
        Question::AllActivities => "the training schedule",
        Question::ZoomLink => "zoom link",
        Question::Countdown => "countdown",
        Question::DailyEncouragement => "daily encouragement",
        Question::LastUpdated => "training schedule last updated details",
    };
    format!("Unable to get {what}. {RETRY_SUFFIX}")
}

fn concluded_message(settings: &ResponderSettings) -> String {
    format!(
        "{} has concluded. Thank you for being part of it!",
        settings.program_name
    )
}

fn winding_down_message(settings: &ResponderSettings) -> String {
    format!(
        "{} is winding down. Details of the post-celebration will be shared soon!",
        settings.program_name
    )
}

/// Escape store text for Telegram's legacy Markdown, outside any entity
fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '_' | '*' | '`' | '[') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Bold entity around store text. Escapes are not allowed inside an entity,
/// so a literal `*` closes the entity, is escaped, and reopens it.
fn bold(text: &str) -> String {
    format!("*{}*", text.replace('*', "*\\**"))
}

pub fn render_next_activity(
    activities: &[ActivityRecord],
    details: &ParticipantDetails,
    rules: &CategoryRules,
    settings: &ResponderSettings,
    now: &DateTime<Tz>,
) -> String {
    let Some(next) = find_next_upcoming(activities, now) else {
        return match rules.closing_activity(activities) {
            Some(closing) if !closing.end.is_known() => winding_down_message(settings),
            _ => concluded_message(settings),
        };
    };

    // The date line follows the start; fall back to the end for open-ended starts
    let date = if next.start.is_known() {
        format_moment_date(&next.start)
    } else {
        format_moment_date(&next.end)
    };

    let mut reply = format!(
        "{}\n📍: {}\n📅: {}\n🕓: {}",
        bold(&next.title),
        escape_markdown(&next.location),
        date,
        format_time_range(&next.start, &next.end)
    );

    if let Some(note) = &next.note {
        let _ = write!(reply, "\n📝: {}", escape_markdown(note));
    }

    let extras = rules.extras_for(next);
    if extras.contains(&Extra::ZoomLink) {
        let _ = write!(reply, "\nZoom Link: {}", escape_markdown(&details.zoom_link));
    }
    if extras.contains(&Extra::Attire) {
        reply.push_str("\n\nAttire: ");
        for item in &details.training_attire {
            let _ = write!(reply, "\n    - {}", escape_markdown(item));
        }
    }
    if extras.contains(&Extra::ThingsToBring) {
        reply.push_str("\nThings to Bring: ");
        let costume = extras.contains(&Extra::Costume).then_some("Costume");
        let items = details.things_to_bring.iter().map(String::as_str).chain(costume);
        for (index, item) in items.enumerate() {
            let _ = write!(reply, "\n    {}) {}", index + 1, escape_markdown(item));
        }
    }

    reply
}

pub fn render_all_activities(
    activities: &[ActivityRecord],
    settings: &ResponderSettings,
    now: &DateTime<Tz>,
) -> String {
    let upcoming = sort_upcoming(activities, now);
    if upcoming.is_empty() {
        return concluded_message(settings);
    }

    let mut reply = bold(&format!("Upcoming {} activities", settings.program_name));
    for (index, activity) in upcoming.iter().enumerate() {
        let _ = write!(
            reply,
            "\n{}. {} | {} | {} | {}",
            index + 1,
            escape_markdown(&activity.title),
            format_moment_date(&activity.end),
            format_time_range(&activity.start, &activity.end),
            escape_markdown(&activity.location)
        );
    }
    reply
}

pub fn render_countdown(
    activities: &[ActivityRecord],
    settings: &ResponderSettings,
    now: &DateTime<Tz>,
) -> String {
    let to_next = find_next_upcoming(activities, now)
        .and_then(|next| next.start.known().or_else(|| next.end.known()))
        .map_or(Countdown::Ended, |target| countdown(&target, now));
    let to_program = countdown(&settings.program_start, now);

    format!(
        "🎉 *Countdown* 🎉\nNext activity: {to_next}\n{}: {to_program}",
        escape_markdown(&settings.program_name)
    )
}

pub fn render_daily_encouragement(settings: &ResponderSettings, now: &DateTime<Tz>) -> String {
    format!(
        "{}{}.html",
        settings.encouragement_base,
        daily_encouragement_slug(now)
    )
}
