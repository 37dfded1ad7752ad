//! crates/launchpad_core/src/schedule.rs
//!
//! When the periodic jobs fire. All times are UTC.

use chrono::{DateTime, Duration, NaiveTime, TimeZone, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
    /// Fires at every multiple of the period since the Unix epoch.
    Every(Duration),
    /// Fires once a day at the given time.
    DailyAt(NaiveTime),
}

impl Schedule {
    pub fn every_hours(hours: i64) -> Self {
        Schedule::Every(Duration::hours(hours))
    }

    /// The first firing strictly after `now`.
    pub fn next_after(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match *self {
            Schedule::Every(period) => {
                let period_ms = period.num_milliseconds().max(1);
                let now_ms = now.timestamp_millis();
                let next_ms = (now_ms.div_euclid(period_ms) + 1) * period_ms;
                Utc.timestamp_millis_opt(next_ms)
                    .single()
                    .unwrap_or(now + period)
            }
            Schedule::DailyAt(time) => {
                let today = now.date_naive().and_time(time).and_utc();
                if today > now {
                    today
                } else {
                    today + Duration::days(1)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    #[test]
    fn six_hourly_fires_on_quarter_days() {
        let schedule = Schedule::every_hours(6);

        assert_eq!(schedule.next_after(utc(2024, 1, 1, 0, 0, 0)), utc(2024, 1, 1, 6, 0, 0));
        assert_eq!(schedule.next_after(utc(2024, 1, 1, 5, 59, 59)), utc(2024, 1, 1, 6, 0, 0));
        assert_eq!(schedule.next_after(utc(2024, 1, 1, 23, 0, 0)), utc(2024, 1, 2, 0, 0, 0));
    }

    #[test]
    fn daily_fires_later_today_or_tomorrow() {
        let at_0005 = NaiveTime::from_hms_opt(0, 5, 0).unwrap();
        let schedule = Schedule::DailyAt(at_0005);

        assert_eq!(schedule.next_after(utc(2024, 1, 1, 0, 1, 0)), utc(2024, 1, 1, 0, 5, 0));
        assert_eq!(schedule.next_after(utc(2024, 1, 1, 0, 5, 0)), utc(2024, 1, 2, 0, 5, 0));
        assert_eq!(schedule.next_after(utc(2024, 12, 31, 12, 0, 0)), utc(2025, 1, 1, 0, 5, 0));
    }
}
