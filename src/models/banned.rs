use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::{BanType, banned_entry_entity};

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateBanRequest {
    pub ban_type: BanType,
    pub value: String,
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BannedEntryResponse {
    pub id: String,
    pub ban_type: BanType,
    pub value: String,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

impl From<banned_entry_entity::Model> for BannedEntryResponse {
    fn from(m: banned_entry_entity::Model) -> Self {
        BannedEntryResponse {
            id: m.id,
            ban_type: m.ban_type,
            value: m.value,
            reason: m.reason,
            created_at: m.created_at,
        }
    }
}
