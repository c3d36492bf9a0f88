//! Schedule queries
//!
//! Temporal resolution over the activity list, the category rule table, and
//! the responder that renders answers to the fixed question menu.

mod question;
pub mod resolver;
mod responder;
pub mod rules;
mod types;

#[cfg(test)]
mod proptests;

pub use question::Question;
pub use responder::{ResponderSettings, ScheduleResponder};
pub use rules::CategoryRules;
pub use types::{ActivityRecord, Moment, ParticipantDetails};
