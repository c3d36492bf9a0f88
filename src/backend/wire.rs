//! JSON shapes of the remote data store
//!
//! The store marks unknown times with `"TBA"` or `null` and absent notes with
//! `"Nil"`. The sentinels stop here; the rest of the crate sees [`Moment`] and
//! `Option<String>`.

use super::BackendError;
use crate::schedule::{ActivityRecord, Moment};
use chrono::{NaiveDateTime, TimeZone};
use chrono_tz::Tz;
use serde::Deserialize;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
const UNKNOWN_TIME: &str = "TBA";
const NO_NOTE: &str = "Nil";

/// One entry of `training/{code}/1/`
#[derive(Debug, Deserialize)]
pub struct RawActivity {
    pub title: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub datetime_start: Option<String>,
    #[serde(default)]
    pub datetime_end: Option<String>,
    #[serde(rename = "Note", default)]
    pub note: Option<String>,
}

impl RawActivity {
    /// Interpret naive store timestamps as wall-clock time in `tz`
    pub fn into_record(self, tz: Tz) -> Result<ActivityRecord, BackendError> {
        let start = parse_moment(self.datetime_start.as_deref(), tz)?;
        let end = parse_moment(self.datetime_end.as_deref(), tz)?;
        let record = ActivityRecord::new(self.title, self.location, start, end);

        Ok(match self.note {
            Some(note) if !note.trim().is_empty() && note != NO_NOTE => record.with_note(note),
            _ => record,
        })
    }
}

pub fn parse_activities(body: &str, tz: Tz) -> Result<Vec<ActivityRecord>, BackendError> {
    let raw: Vec<RawActivity> = serde_json::from_str(body)
        .map_err(|e| BackendError::decode(format!("Failed to parse activities: {e}")))?;
    raw.into_iter().map(|activity| activity.into_record(tz)).collect()
}

fn parse_moment(raw: Option<&str>, tz: Tz) -> Result<Moment, BackendError> {
    let raw = match raw.map(str::trim) {
        None | Some(UNKNOWN_TIME) => return Ok(Moment::Unknown),
        Some(raw) => raw,
    };

    let naive = NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
        .map_err(|e| BackendError::decode(format!("Invalid timestamp {raw:?}: {e}")))?;
    tz.from_local_datetime(&naive)
        .earliest()
        .map(Moment::Known)
        .ok_or_else(|| BackendError::decode(format!("Timestamp {raw:?} does not exist in {tz}")))
}

/// Body of a successful code exchange
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Body of a rejected code exchange
#[derive(Debug, Default, Deserialize)]
pub struct RejectionBody {
    #[serde(default)]
    pub attempts: u32,
}
