//! Schedule record types

use chrono::DateTime;
use chrono_tz::Tz;
use serde::Deserialize;

/// A point in time that the organisers may not have announced yet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Moment {
    Known(DateTime<Tz>),
    /// Published as "TBA" or null
    Unknown,
}

impl Moment {
    pub fn known(&self) -> Option<DateTime<Tz>> {
        match self {
            Moment::Known(at) => Some(*at),
            Moment::Unknown => None,
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, Moment::Known(_))
    }

    /// Known and strictly later than `now`
    pub fn is_after(&self, now: &DateTime<Tz>) -> bool {
        matches!(self, Moment::Known(at) if at > now)
    }
}

/// One scheduled activity of the program
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityRecord {
    pub title: String,
    pub location: String,
    pub start: Moment,
    pub end: Moment,
    pub note: Option<String>,
}

impl ActivityRecord {
    pub fn new(
        title: impl Into<String>,
        location: impl Into<String>,
        start: Moment,
        end: Moment,
    ) -> Self {
        Self {
            title: title.into(),
            location: location.into(),
            start,
            end,
            note: None,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// Per-participant supplementary details
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct ParticipantDetails {
    #[serde(rename = "zoomlink", default)]
    pub zoom_link: String,
    #[serde(default)]
    pub training_attire: Vec<String>,
    #[serde(rename = "training_bring", default)]
    pub things_to_bring: Vec<String>,
    #[serde(rename = "lastupdate", default)]
    pub last_update: String,
}
