use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::submission::{FieldMap, Submission, field_map_from_json};
use crate::entities::raffle_win_entity;

/// 中奖记录
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct WinRecord {
    pub id: String,
    /// 抽中的报名 ID（报名之后可能已被删除）
    pub submission_id: String,
    /// 抽奖时的字段快照
    #[schema(value_type = Object)]
    pub submission_data: FieldMap,
    pub won_at: DateTime<Utc>,
    pub tip_value: Option<String>,
    pub tip_assigned_at: Option<DateTime<Utc>>,
}

impl From<raffle_win_entity::Model> for WinRecord {
    fn from(m: raffle_win_entity::Model) -> Self {
        WinRecord {
            id: m.id,
            submission_id: m.submission_id,
            submission_data: field_map_from_json(&m.submission_data),
            won_at: m.won_at,
            tip_value: m.tip_value,
            tip_assigned_at: m.tip_assigned_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct DrawRandomRequest {
    /// 需要抽取的人数
    pub count: usize,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct DrawSelectedRequest {
    /// 按顺序处理的报名 ID 列表
    pub submission_ids: Vec<String>,
}

/// 抽奖结果；winners 与 wins 顺序一致（即抽取顺序）
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DrawResponse {
    pub requested: usize,
    pub winners: Vec<Submission>,
    pub wins: Vec<WinRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AssignTipRequest {
    pub tip_value: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TipBudgetResponse {
    pub weekly_budget: Option<f64>,
    /// 本周已分配的小费总额
    pub spent_this_week: f64,
    pub remaining: Option<f64>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, ToSchema)]
pub struct WinCounts {
    pub day: u32,
    pub week: u32,
    pub month: u32,
}

/// 报名及其当前可中奖状态（手动抽奖选择列表使用）
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EligibilityEntry {
    pub submission: Submission,
    pub eligible: bool,
    pub validated: bool,
    pub wins: WinCounts,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct WinsByDateQuery {
    /// YYYY-MM-DD（服务器本地日期）
    pub date: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct WinListQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}
