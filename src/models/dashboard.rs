use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DashboardPeriod {
    Day,
    #[default]
    Week,
    Month,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct DashboardQuery {
    #[serde(default)]
    pub period: DashboardPeriod,
}

#[derive(Debug, Clone, Serialize, PartialEq, ToSchema)]
pub struct TopWinner {
    pub account_id: String,
    pub name: String,
    pub count: u32,
}

#[derive(Debug, Clone, Serialize, PartialEq, ToSchema)]
pub struct DailyWinCount {
    /// dd/mm/YYYY
    pub date: String,
    pub count: u32,
}

#[derive(Debug, Clone, Serialize, PartialEq, ToSchema)]
pub struct DashboardStats {
    pub period: DashboardPeriod,
    pub current_submissions: usize,
    pub total_wins: usize,
    pub unique_winners: usize,
    pub avg_wins_per_day: f64,
    pub top_winners: Vec<TopWinner>,
    pub wins_per_day: Vec<DailyWinCount>,
    pub all_time_participants: usize,
    pub all_time_wins: usize,
    pub single_submission_accounts: usize,
    pub multiple_submission_accounts: usize,
}
