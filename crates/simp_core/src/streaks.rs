//! Streak tracker: consecutive-calendar-day activity count.
//!
//! Pure date arithmetic; persistence of the resulting state belongs to the
//! orchestrator. Dates are calendar days in the account's reference
//! calendar, so any number of same-day registrations is a single no-op.

use chrono::NaiveDate;

use crate::error::{Error, Result};
use crate::model::StreakState;

/// Advance streak state for one activity on `day`.
///
/// - same day as last activity: unchanged
/// - next day: count + 1
/// - gap of more than one day, or no prior state: reset to 1
/// - day before last activity (clock skew, out-of-order event): rejected
pub fn advance(prev: Option<&StreakState>, day: NaiveDate) -> Result<StreakState> {
    let Some(prev) = prev else {
        return Ok(StreakState {
            count: 1,
            last_activity: day,
        });
    };

    let delta = day.signed_duration_since(prev.last_activity).num_days();
    if delta < 0 {
        return Err(Error::validation(format!(
            "activity date {} is before last recorded activity {}",
            day, prev.last_activity
        )));
    }

    Ok(match delta {
        0 => prev.clone(),
        1 => StreakState {
            count: prev.count + 1,
            last_activity: day,
        },
        _ => StreakState {
            count: 1,
            last_activity: day,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_first_activity_starts_streak() {
        let state = advance(None, date("2026-08-01")).unwrap();
        assert_eq!(state.count, 1);
        assert_eq!(state.last_activity, date("2026-08-01"));
    }

    #[test]
    fn test_same_day_is_noop() {
        let prev = StreakState {
            count: 4,
            last_activity: date("2026-08-01"),
        };
        // Any number of same-day calls leaves the count alone.
        for _ in 0..3 {
            let state = advance(Some(&prev), date("2026-08-01")).unwrap();
            assert_eq!(state, prev);
        }
    }

    #[test]
    fn test_next_day_increments() {
        let prev = StreakState {
            count: 4,
            last_activity: date("2026-08-01"),
        };
        let state = advance(Some(&prev), date("2026-08-02")).unwrap();
        assert_eq!(state.count, 5);
        assert_eq!(state.last_activity, date("2026-08-02"));
    }

    #[test]
    fn test_gap_resets_to_one() {
        let prev = StreakState {
            count: 9,
            last_activity: date("2026-08-01"),
        };
        let state = advance(Some(&prev), date("2026-08-05")).unwrap();
        assert_eq!(state.count, 1);
        assert_eq!(state.last_activity, date("2026-08-05"));
    }

    #[test]
    fn test_out_of_order_date_rejected() {
        let prev = StreakState {
            count: 2,
            last_activity: date("2026-08-05"),
        };
        let err = advance(Some(&prev), date("2026-08-04")).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_month_boundary() {
        let prev = StreakState {
            count: 1,
            last_activity: date("2026-08-31"),
        };
        let state = advance(Some(&prev), date("2026-09-01")).unwrap();
        assert_eq!(state.count, 2);
    }
}
