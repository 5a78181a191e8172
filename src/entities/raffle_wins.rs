use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 中奖记录
/// - submission_data 为抽奖时的报名快照，报名被修改或删除后仍保持不变
/// - tip_value 抽奖后由管理员选择，只能设置一次；tip_assigned_at 为设置时间，用于每周预算
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "raffle_wins")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub submission_id: String,
    pub submission_data: Json,
    pub won_at: DateTime<Utc>,
    pub tip_value: Option<String>,
    pub tip_assigned_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
