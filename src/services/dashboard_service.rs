use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Duration, Local, TimeZone};

use crate::error::AppResult;
use crate::models::{
    DailyWinCount, DashboardPeriod, DashboardStats, PageConfig, Submission, TopWinner, WinRecord,
};
use crate::services::eligibility::{WindowBounds, account_id, day_range};
use crate::services::{ConfigService, RaffleService, SubmissionService};

const TOP_WINNERS: usize = 5;
const DAILY_SERIES_DAYS: i64 = 7;

/// 统计面板数据，纯计算；期间边界使用 `now` 所在时区
pub fn compute_stats<Tz: TimeZone>(
    period: DashboardPeriod,
    submissions: &[Submission],
    wins: &[WinRecord],
    config: &PageConfig,
    now: &DateTime<Tz>,
) -> DashboardStats {
    let bounds = WindowBounds::at(now, false);
    let since = match period {
        DashboardPeriod::Day => bounds.day,
        DashboardPeriod::Week => bounds.week,
        DashboardPeriod::Month => bounds.month,
    };
    let in_period: Vec<&WinRecord> = wins.iter().filter(|w| w.won_at >= since).collect();

    // 按账号统计本期中奖次数；没有账号 ID 的记录不参与排行
    let mut per_account: HashMap<&str, (u32, &WinRecord)> = HashMap::new();
    for &w in &in_period {
        if let Some(acc) = account_id(&w.submission_data, config) {
            per_account.entry(acc).or_insert((0, w)).0 += 1;
        }
    }
    let mut top_winners: Vec<TopWinner> = per_account
        .iter()
        .map(|(acc, (count, w))| TopWinner {
            account_id: acc.to_string(),
            name: w
                .submission_data
                .get("fullName")
                .map(|n| n.trim())
                .filter(|n| !n.is_empty())
                .unwrap_or(*acc)
                .to_string(),
            count: *count,
        })
        .collect();
    top_winners.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.account_id.cmp(&b.account_id)));
    top_winners.truncate(TOP_WINNERS);

    let days_in_period = match period {
        DashboardPeriod::Day => 1,
        _ => (now.date_naive() - since.with_timezone(&now.timezone()).date_naive()).num_days() + 1,
    }
    .max(1);

    let tz = now.timezone();
    let today = now.date_naive();
    let wins_per_day = (0..DAILY_SERIES_DAYS)
        .rev()
        .map(|back| {
            let date = today - Duration::days(back);
            let (start, end) = day_range(&tz, date);
            DailyWinCount {
                date: date.format("%d/%m/%Y").to_string(),
                count: wins
                    .iter()
                    .filter(|w| w.won_at >= start && w.won_at < end)
                    .count() as u32,
            }
        })
        .collect();

    let all_time_participants: HashSet<&str> = wins
        .iter()
        .filter_map(|w| account_id(&w.submission_data, config))
        .collect();

    let mut submissions_per_account: HashMap<&str, usize> = HashMap::new();
    for s in submissions {
        if let Some(acc) = account_id(&s.data, config) {
            *submissions_per_account.entry(acc).or_default() += 1;
        }
    }
    let single = submissions_per_account.values().filter(|&&n| n == 1).count();

    DashboardStats {
        period,
        current_submissions: submissions.len(),
        total_wins: in_period.len(),
        unique_winners: per_account.len(),
        avg_wins_per_day: in_period.len() as f64 / days_in_period as f64,
        top_winners,
        wins_per_day,
        all_time_participants: all_time_participants.len(),
        all_time_wins: wins.len(),
        single_submission_accounts: single,
        multiple_submission_accounts: submissions_per_account.len() - single,
    }
}

#[derive(Clone)]
pub struct DashboardService {
    config_service: ConfigService,
    submission_service: SubmissionService,
    raffle_service: RaffleService,
}

impl DashboardService {
    pub fn new(
        config_service: ConfigService,
        submission_service: SubmissionService,
        raffle_service: RaffleService,
    ) -> Self {
        Self {
            config_service,
            submission_service,
            raffle_service,
        }
    }

    pub async fn stats(&self, period: DashboardPeriod) -> AppResult<DashboardStats> {
        let config = self.config_service.get().await;
        let submissions = self.submission_service.list();
        let wins = self.raffle_service.all_wins().await?;
        Ok(compute_stats(
            period,
            &submissions,
            &wins,
            &config,
            &Local::now(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FieldMap;
    use chrono::Utc;

    fn data(name: &str, account: &str) -> FieldMap {
        let mut m = FieldMap::new();
        m.insert("fullName".into(), name.into());
        m.insert("accountId".into(), account.into());
        m
    }

    fn win(name: &str, account: &str, at: DateTime<Utc>) -> WinRecord {
        WinRecord {
            id: format!("{account}-{}", at.timestamp()),
            submission_id: "s".into(),
            submission_data: data(name, account),
            won_at: at,
            tip_value: None,
            tip_assigned_at: None,
        }
    }

    #[test]
    fn test_compute_week_stats() {
        let cfg = PageConfig::default();
        // 周三；本周从 2024-03-10（周日）开始
        let now = Utc.with_ymd_and_hms(2024, 3, 13, 18, 0, 0).unwrap();
        let wins = vec![
            win("Ana", "A1", Utc.with_ymd_and_hms(2024, 3, 13, 9, 0, 0).unwrap()),
            win("Ana", "A1", Utc.with_ymd_and_hms(2024, 3, 12, 9, 0, 0).unwrap()),
            win("Bia", "B2", Utc.with_ymd_and_hms(2024, 3, 11, 9, 0, 0).unwrap()),
            win("Caio", "C3", Utc.with_ymd_and_hms(2024, 3, 2, 9, 0, 0).unwrap()),
        ];
        let submissions = vec![
            Submission {
                id: "1".into(),
                data: data("Ana", "A1"),
                created_at: now,
            },
            Submission {
                id: "2".into(),
                data: data("Bia", "B2"),
                created_at: now,
            },
        ];

        let stats = compute_stats(DashboardPeriod::Week, &submissions, &wins, &cfg, &now);
        assert_eq!(stats.current_submissions, 2);
        assert_eq!(stats.total_wins, 3);
        assert_eq!(stats.unique_winners, 2);
        assert_eq!(stats.top_winners[0].name, "Ana");
        assert_eq!(stats.top_winners[0].count, 2);
        assert!((stats.avg_wins_per_day - 0.75).abs() < 1e-9);
        assert_eq!(stats.wins_per_day.len(), 7);
        assert_eq!(stats.wins_per_day[6].date, "13/03/2024");
        assert_eq!(stats.wins_per_day[6].count, 1);
        assert_eq!(stats.all_time_participants, 3);
        assert_eq!(stats.all_time_wins, 4);
        assert_eq!(stats.single_submission_accounts, 2);
        assert_eq!(stats.multiple_submission_accounts, 0);

        let day = compute_stats(DashboardPeriod::Day, &submissions, &wins, &cfg, &now);
        assert_eq!(day.total_wins, 1);
        assert_eq!(day.avg_wins_per_day, 1.0);
    }
}
