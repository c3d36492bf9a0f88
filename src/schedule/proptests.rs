//! Property-based tests for schedule resolution

use super::resolver::{countdown, find_next_upcoming, sort_upcoming, Countdown};
use super::types::{ActivityRecord, Moment};
use chrono::{DateTime, Duration, TimeZone};
use chrono_tz::Asia::Singapore;
use chrono_tz::Tz;
use proptest::prelude::*;

fn base() -> DateTime<Tz> {
    Singapore.with_ymd_and_hms(2022, 7, 1, 0, 0, 0).unwrap()
}

/// Offsets in minutes from `base`, `None` for an unknown end
fn arb_end() -> impl Strategy<Value = Option<i64>> {
    proptest::option::weighted(0.8, 0i64..(60 * 24 * 90))
}

fn arb_activities() -> impl Strategy<Value = Vec<ActivityRecord>> {
    proptest::collection::vec(arb_end(), 0..20).prop_map(|ends| {
        ends.into_iter()
            .enumerate()
            .map(|(i, end)| {
                let end = match end {
                    Some(minutes) => Moment::Known(base() + Duration::minutes(minutes)),
                    None => Moment::Unknown,
                };
                ActivityRecord::new(format!("activity-{i}"), "Keat Hong Camp", Moment::Unknown, end)
            })
            .collect()
    })
}

fn arb_now() -> impl Strategy<Value = DateTime<Tz>> {
    (0i64..(60 * 24 * 90)).prop_map(|minutes| base() + Duration::minutes(minutes))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn prop_next_upcoming_is_future_and_minimal(activities in arb_activities(), now in arb_now()) {
        match find_next_upcoming(&activities, &now) {
            Some(next) => {
                let end = next.end.known();
                prop_assert!(end.is_some(), "unknown end chosen: {:?}", next);
                let end = end.unwrap();
                prop_assert!(end > now);
                for other in &activities {
                    if let Moment::Known(other_end) = other.end {
                        prop_assert!(other_end <= now || other_end >= end);
                    }
                }
                // first of any ties
                let first = activities.iter().position(|a| a.end == Moment::Known(end));
                prop_assert_eq!(first.map(|i| &activities[i].title), Some(&next.title));
            }
            None => {
                prop_assert!(activities.iter().all(|a| !a.end.is_after(&now)));
            }
        }
    }

    #[test]
    fn prop_sort_upcoming_is_ordered_and_stable(activities in arb_activities(), now in arb_now()) {
        let sorted = sort_upcoming(&activities, &now);

        let expected_len = activities
            .iter()
            .filter(|a| !a.end.is_known() || a.end.is_after(&now))
            .count();
        prop_assert_eq!(sorted.len(), expected_len);

        // known ends first, unknown after
        let split = sorted.iter().position(|a| !a.end.is_known()).unwrap_or(sorted.len());
        prop_assert!(sorted[split..].iter().all(|a| !a.end.is_known()));

        let index_of = |a: &ActivityRecord| activities.iter().position(|b| b.title == a.title);
        for pair in sorted[..split].windows(2) {
            prop_assert!(pair[0].end.known() <= pair[1].end.known());
            if pair[0].end == pair[1].end {
                prop_assert!(index_of(pair[0]) < index_of(pair[1]));
            }
        }
        for pair in sorted[split..].windows(2) {
            prop_assert!(index_of(pair[0]) < index_of(pair[1]));
        }
    }

    #[test]
    fn prop_countdown_reconstructs_duration(
        now in arb_now(),
        offset in -100_000i64..10_000_000,
        millis in 0i64..1000
    ) {
        let target = now + Duration::seconds(offset) + Duration::milliseconds(millis);
        let result = countdown(&target, &now);

        prop_assert_eq!(result == Countdown::Ended, target <= now);
        if let Countdown::Remaining { hours, minutes, seconds, .. } = result {
            prop_assert!((0..24).contains(&hours));
            prop_assert!((0..60).contains(&minutes));
            prop_assert!((0..60).contains(&seconds));

            let exact = target.signed_duration_since(now).num_milliseconds();
            let rebuilt = result.total_seconds() * 1000;
            prop_assert!(rebuilt <= exact && exact - rebuilt < 1000);
        }
    }
}
