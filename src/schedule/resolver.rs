//! Temporal resolution over activity lists
//!
//! Everything here is pure. `now` is always supplied by the caller and is
//! expected to be in the event timezone; formatting renders in whatever zone
//! the timestamps carry, so records and `now` must share it.

use super::types::{ActivityRecord, Moment};
use chrono::{DateTime, Datelike};
use chrono_tz::Tz;
use std::fmt;

const SECONDS_PER_DAY: i64 = 86_400;
const TBA: &str = "TBA";

/// The activity whose known end is closest in the future.
///
/// Ties go to the earliest entry in `activities`.
pub fn find_next_upcoming<'a>(
    activities: &'a [ActivityRecord],
    now: &DateTime<Tz>,
) -> Option<&'a ActivityRecord> {
    activities
        .iter()
        .filter_map(|activity| match activity.end {
            Moment::Known(end) if end > *now => Some((activity, end)),
            _ => None,
        })
        // min_by_key keeps the first of equal minima
        .min_by_key(|(_, end)| *end)
        .map(|(activity, _)| activity)
}

/// Upcoming activities in display order.
///
/// Activities with a future known end come first, ascending by end. Activities
/// whose end is unknown trail in their original order. Finished activities are
/// dropped.
pub fn sort_upcoming<'a>(
    activities: &'a [ActivityRecord],
    now: &DateTime<Tz>,
) -> Vec<&'a ActivityRecord> {
    let (mut dated, undated): (Vec<_>, Vec<_>) = activities
        .iter()
        .filter(|activity| !activity.end.is_known() || activity.end.is_after(now))
        .partition(|activity| activity.end.is_known());

    // stable
    dated.sort_by_key(|activity| activity.end.known());
    dated.extend(undated);
    dated
}

/// Time left until a target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Countdown {
    Ended,
    Remaining {
        days: i64,
        hours: i64,
        minutes: i64,
        seconds: i64,
    },
}

impl Countdown {
    pub fn total_seconds(&self) -> i64 {
        match self {
            Countdown::Ended => 0,
            Countdown::Remaining {
                days,
                hours,
                minutes,
                seconds,
            } => days * SECONDS_PER_DAY + hours * 3600 + minutes * 60 + seconds,
        }
    }
}

impl fmt::Display for Countdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Countdown::Ended => f.write_str("Countdown has ended"),
            Countdown::Remaining {
                days,
                hours,
                minutes,
                seconds,
            } => {
                let unit = if *days == 1 { "Day" } else { "Days" };
                write!(f, "{days} {unit}, {hours}h {minutes}m {seconds}s")
            }
        }
    }
}

/// Whole units remaining until `target`, truncated at every boundary
pub fn countdown(target: &DateTime<Tz>, now: &DateTime<Tz>) -> Countdown {
    if target <= now {
        return Countdown::Ended;
    }

    let total = target.signed_duration_since(*now).num_seconds();
    Countdown::Remaining {
        days: total / SECONDS_PER_DAY,
        hours: total % SECONDS_PER_DAY / 3600,
        minutes: total % 3600 / 60,
        seconds: total % 60,
    }
}

/// `9:05AM`
pub fn format_clock(at: &DateTime<Tz>) -> String {
    at.format("%-I:%M%p").to_string()
}

/// `9:05AM - 11:30AM`
pub fn format_clock_range(start: &DateTime<Tz>, end: &DateTime<Tz>) -> String {
    format!("{} - {}", format_clock(start), format_clock(end))
}

/// Like [`format_clock_range`], with each unknown side rendered as `TBA`
pub fn format_time_range(start: &Moment, end: &Moment) -> String {
    let side = |moment: &Moment| moment.known().map_or_else(|| TBA.to_string(), |at| format_clock(&at));
    format!("{} - {}", side(start), side(end))
}

/// `9 Jul 2022, Sat`
pub fn format_date(at: &DateTime<Tz>) -> String {
    at.format("%-d %b %Y, %a").to_string()
}

/// Like [`format_date`], `TBA` when unknown
pub fn format_moment_date(moment: &Moment) -> String {
    moment
        .known()
        .map_or_else(|| TBA.to_string(), |at| format_date(&at))
}

/// `july-9`, the daily encouragement page for `now`
pub fn daily_encouragement_slug(now: &DateTime<Tz>) -> String {
    format!("{}-{}", now.format("%B").to_string().to_lowercase(), now.day())
}
