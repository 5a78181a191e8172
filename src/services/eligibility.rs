//! Win-cap eligibility and draw selection.
//!
//! Everything here is pure: the caller passes the page configuration, the
//! complete list of win records and the current instant. Period boundaries
//! are computed in the time zone of `now` (server local time in production).

use std::collections::HashSet;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use rand::Rng;
use rand::seq::SliceRandom;

use crate::models::{FieldMap, PageConfig, Submission, WinCounts, WinRecord};

/// Wins older than this never count toward any cap when the rolling window is on.
pub const ROLLING_WINDOW_DAYS: i64 = 30;

/// Lower bounds (inclusive) of the day / week / month cap windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowBounds {
    pub day: DateTime<Utc>,
    pub week: DateTime<Utc>,
    pub month: DateTime<Utc>,
}

impl WindowBounds {
    pub fn at<Tz: TimeZone>(now: &DateTime<Tz>, rolling_window: bool) -> Self {
        let tz = now.timezone();
        let today = now.date_naive();
        let week_start =
            today - Duration::days(today.weekday().num_days_from_sunday() as i64);
        let month_start =
            NaiveDate::from_ymd_opt(today.year(), today.month(), 1).unwrap_or(today);

        let mut bounds = WindowBounds {
            day: local_midnight(&tz, today),
            week: local_midnight(&tz, week_start),
            month: local_midnight(&tz, month_start),
        };

        if rolling_window {
            let floor = now.with_timezone(&Utc) - Duration::days(ROLLING_WINDOW_DAYS);
            bounds.day = bounds.day.max(floor);
            bounds.week = bounds.week.max(floor);
            bounds.month = bounds.month.max(floor);
        }
        bounds
    }
}

/// Start of `date` in `tz`. When midnight does not exist (DST gap) the
/// earliest valid instant after it is used.
fn local_midnight<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> DateTime<Utc> {
    let naive = date.and_time(NaiveTime::MIN);
    for hour in 0..3 {
        if let Some(dt) = tz
            .from_local_datetime(&(naive + Duration::hours(hour)))
            .earliest()
        {
            return dt.with_timezone(&Utc);
        }
    }
    Utc.from_utc_datetime(&naive)
}

/// `[start, end)` of a calendar date in `tz`.
pub fn day_range<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let next = date.succ_opt().unwrap_or(date);
    (local_midnight(tz, date), local_midnight(tz, next))
}

/// The participant's account identifier, if present and non-blank.
pub fn account_id<'a>(data: &'a FieldMap, config: &PageConfig) -> Option<&'a str> {
    data.get(&config.account_id_field)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
}

/// Wins recorded for `account` inside each cap window.
pub fn count_wins<Tz: TimeZone>(
    account: &str,
    wins: &[WinRecord],
    config: &PageConfig,
    now: &DateTime<Tz>,
) -> WinCounts {
    let bounds = WindowBounds::at(now, config.rolling_window_enabled);
    let mut counts = WinCounts {
        day: 0,
        week: 0,
        month: 0,
    };

    for win in wins {
        if account_id(&win.submission_data, config) != Some(account) {
            continue;
        }
        if win.won_at >= bounds.day {
            counts.day += 1;
        }
        if win.won_at >= bounds.week {
            counts.week += 1;
        }
        if win.won_at >= bounds.month {
            counts.month += 1;
        }
    }
    counts
}

pub fn within_caps(counts: &WinCounts, config: &PageConfig) -> bool {
    counts.day < config.max_daily_wins
        && counts.week < config.max_weekly_wins
        && counts.month < config.max_monthly_wins
}

/// Participants without an account identifier cannot be tracked and are
/// always eligible.
pub fn can_win<Tz: TimeZone>(
    data: &FieldMap,
    wins: &[WinRecord],
    config: &PageConfig,
    now: &DateTime<Tz>,
) -> bool {
    match account_id(data, config) {
        None => true,
        Some(account) => within_caps(&count_wins(account, wins, config, now), config),
    }
}

/// Postback gate. `None` means validation is off.
pub fn passes_validation(
    data: &FieldMap,
    config: &PageConfig,
    validated: Option<&HashSet<String>>,
) -> bool {
    match validated {
        None => true,
        Some(ids) => account_id(data, config).is_some_and(|id| ids.contains(id)),
    }
}

/// Submissions currently allowed to win, in their original order.
pub fn eligible_submissions<Tz: TimeZone>(
    submissions: Vec<Submission>,
    wins: &[WinRecord],
    config: &PageConfig,
    validated: Option<&HashSet<String>>,
    now: &DateTime<Tz>,
) -> Vec<Submission> {
    submissions
        .into_iter()
        .filter(|s| {
            can_win(&s.data, wins, config, now) && passes_validation(&s.data, config, validated)
        })
        .collect()
}

/// Uniformly random `min(count, len)` items, in draw order (Fisher–Yates).
pub fn pick_random<T, R: Rng + ?Sized>(mut pool: Vec<T>, count: usize, rng: &mut R) -> Vec<T> {
    pool.shuffle(rng);
    pool.truncate(count);
    pool
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn config(daily: u32, weekly: u32, monthly: u32) -> PageConfig {
        PageConfig {
            max_daily_wins: daily,
            max_weekly_wins: weekly,
            max_monthly_wins: monthly,
            ..PageConfig::default()
        }
    }

    fn data(account: &str) -> FieldMap {
        let mut m = FieldMap::new();
        m.insert("fullName".into(), "Ana".into());
        if !account.is_empty() {
            m.insert("accountId".into(), account.into());
        }
        m
    }

    fn win(account: &str, at: DateTime<Utc>) -> WinRecord {
        WinRecord {
            id: format!("w-{}", at.timestamp()),
            submission_id: "s".into(),
            submission_data: data(account),
            won_at: at,
            tip_value: None,
            tip_assigned_at: None,
        }
    }

    fn utc(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn test_no_account_id_is_always_eligible() {
        let cfg = config(1, 1, 1);
        let now = utc(2024, 3, 15, 12);
        let wins: Vec<WinRecord> = (0..5).map(|i| win("", now - Duration::minutes(i))).collect();
        assert!(can_win(&data(""), &wins, &cfg, &now));

        let mut blank = data("");
        blank.insert("accountId".into(), "   ".into());
        assert!(can_win(&blank, &wins, &cfg, &now));
    }

    #[test]
    fn test_daily_cap_blocks_until_midnight() {
        let cfg = config(2, 10, 10);
        let now = utc(2024, 3, 15, 18);
        let wins = vec![win("A1", utc(2024, 3, 15, 9)), win("A1", utc(2024, 3, 15, 10))];
        assert!(!can_win(&data("A1"), &wins, &cfg, &now));

        let tomorrow = utc(2024, 3, 16, 0) + Duration::seconds(1);
        assert!(can_win(&data("A1"), &wins, &cfg, &tomorrow));
    }

    #[test]
    fn test_other_accounts_do_not_count() {
        let cfg = config(1, 1, 1);
        let now = utc(2024, 3, 15, 18);
        let wins = vec![win("B2", utc(2024, 3, 15, 9))];
        assert!(can_win(&data("A1"), &wins, &cfg, &now));
    }

    #[test]
    fn test_week_starts_on_sunday() {
        // 2024-03-17 is a Sunday
        let cfg = config(10, 1, 10);
        let saturday_win = vec![win("A1", utc(2024, 3, 16, 12))];
        assert!(!can_win(&data("A1"), &saturday_win, &cfg, &utc(2024, 3, 16, 20)));
        assert!(can_win(&data("A1"), &saturday_win, &cfg, &utc(2024, 3, 17, 1)));
    }

    #[test]
    fn test_month_window_and_rolling_bound() {
        let mut cfg = config(10, 10, 1);
        let now = utc(2024, 3, 31, 12);
        let wins = vec![win("A1", utc(2024, 3, 1, 0) + Duration::hours(1))];

        cfg.rolling_window_enabled = false;
        assert_eq!(count_wins("A1", &wins, &cfg, &now).month, 1);
        assert!(!can_win(&data("A1"), &wins, &cfg, &now));

        // 30 天前之外的记录即使在本月也不计入
        cfg.rolling_window_enabled = true;
        assert_eq!(count_wins("A1", &wins, &cfg, &now).month, 0);
        assert!(can_win(&data("A1"), &wins, &cfg, &now));
    }

    #[test]
    fn test_bounds_follow_local_time_zone() {
        let sao_paulo = FixedOffset::west_opt(3 * 3600).unwrap();
        // 02:00 UTC on the 16th is still the 15th in UTC-3
        let now = utc(2024, 3, 16, 2).with_timezone(&sao_paulo);
        let bounds = WindowBounds::at(&now, false);
        assert_eq!(bounds.day, utc(2024, 3, 15, 3));
        assert_eq!(bounds.month, utc(2024, 3, 1, 3));
    }

    #[test]
    fn test_passes_validation() {
        let cfg = PageConfig::default();
        let ids: HashSet<String> = ["A1".to_string()].into_iter().collect();
        assert!(passes_validation(&data("A1"), &cfg, Some(&ids)));
        assert!(!passes_validation(&data("B2"), &cfg, Some(&ids)));
        assert!(!passes_validation(&data(""), &cfg, Some(&ids)));
        assert!(passes_validation(&data("B2"), &cfg, None));
    }

    #[test]
    fn test_pick_random_never_exceeds_pool_or_count() {
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(pick_random(vec![1, 2, 3], 5, &mut rng).len(), 3);
        assert_eq!(pick_random(vec![1, 2, 3, 4, 5], 2, &mut rng).len(), 2);
        assert!(pick_random(Vec::<u8>::new(), 3, &mut rng).is_empty());

        let picked = pick_random((0..10).collect::<Vec<_>>(), 10, &mut rng);
        let unique: HashSet<_> = picked.iter().collect();
        assert_eq!(unique.len(), 10);
    }

    #[test]
    fn test_pick_random_is_roughly_uniform() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut first = [0u32; 4];
        for _ in 0..8000 {
            let picked = pick_random(vec![0usize, 1, 2, 3], 1, &mut rng);
            first[picked[0]] += 1;
        }
        for count in first {
            assert!((1700..=2300).contains(&count), "biased shuffle: {first:?}");
        }
    }
}
