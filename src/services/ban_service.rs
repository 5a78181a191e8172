use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::entities::{BanType, banned_entry_entity as banned};
use crate::error::{AppError, AppResult};
use crate::models::{BannedEntryResponse, CreateBanRequest, FieldMap, PageConfig};
use crate::utils::normalize_identifier;

#[derive(Clone)]
pub struct BanService {
    pool: DatabaseConnection,
}

impl BanService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    /// 黑名单（最新在前）
    pub async fn list(&self) -> AppResult<Vec<BannedEntryResponse>> {
        let list = banned::Entity::find()
            .order_by_desc(banned::Column::CreatedAt)
            .all(&self.pool)
            .await?;
        Ok(list.into_iter().map(Into::into).collect())
    }

    /// 添加黑名单；同类型同值已存在时直接返回已有记录
    pub async fn add(&self, req: CreateBanRequest) -> AppResult<BannedEntryResponse> {
        let value = normalize_identifier(&req.value);
        if value.is_empty() {
            return Err(AppError::ValidationError(
                "Ban value cannot be empty".to_string(),
            ));
        }

        if let Some(existing) = self.find(req.ban_type, &value).await? {
            return Ok(existing.into());
        }

        let model = banned::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            ban_type: Set(req.ban_type),
            value: Set(value),
            reason: Set(req.reason.trim().to_string()),
            created_at: Set(Utc::now()),
        }
        .insert(&self.pool)
        .await?;

        log::info!("Banned {}: {}", model.ban_type, model.value);
        Ok(model.into())
    }

    pub async fn remove(&self, id: &str) -> AppResult<()> {
        let res = banned::Entity::delete_by_id(id.to_string())
            .exec(&self.pool)
            .await?;
        if res.rows_affected == 0 {
            return Err(AppError::NotFound("Banned entry not found".to_string()));
        }
        Ok(())
    }

    /// 报名的邮箱或账号 ID 是否命中同类型黑名单
    pub async fn is_banned(&self, data: &FieldMap, config: &PageConfig) -> AppResult<bool> {
        let checks = [
            (BanType::Email, data.get(&config.email_field)),
            (BanType::AccountId, data.get(&config.account_id_field)),
        ];
        for (ban_type, value) in checks {
            let Some(value) = value.map(|v| normalize_identifier(v)) else {
                continue;
            };
            if value.is_empty() {
                continue;
            }
            if self.find(ban_type, &value).await?.is_some() {
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn find(&self, ban_type: BanType, value: &str) -> AppResult<Option<banned::Model>> {
        Ok(banned::Entity::find()
            .filter(banned::Column::BanType.eq(ban_type))
            .filter(banned::Column::Value.eq(value))
            .one(&self.pool)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_db::setup_test_db;

    fn ban(ban_type: BanType, value: &str) -> CreateBanRequest {
        CreateBanRequest {
            ban_type,
            value: value.to_string(),
            reason: "fraude".to_string(),
        }
    }

    #[tokio::test]
    async fn test_add_is_normalized_and_idempotent() {
        let svc = BanService::new(setup_test_db().await);
        let first = svc.add(ban(BanType::Email, "  Ana@Example.COM ")).await.unwrap();
        assert_eq!(first.value, "ana@example.com");

        let second = svc.add(ban(BanType::Email, "ana@example.com")).await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(svc.list().await.unwrap().len(), 1);

        assert!(svc.add(ban(BanType::AccountId, "   ")).await.is_err());
    }

    #[tokio::test]
    async fn test_is_banned_matches_by_type() {
        let svc = BanService::new(setup_test_db().await);
        let cfg = PageConfig::default();
        svc.add(ban(BanType::AccountId, "a1")).await.unwrap();

        let mut data = FieldMap::new();
        data.insert("accountId".into(), " A1 ".into());
        assert!(svc.is_banned(&data, &cfg).await.unwrap());

        // 邮箱黑名单里没有 a1，不应串类型命中
        let mut other = FieldMap::new();
        other.insert("email".into(), "a1".into());
        assert!(!svc.is_banned(&other, &cfg).await.unwrap());
    }

    #[tokio::test]
    async fn test_remove() {
        let svc = BanService::new(setup_test_db().await);
        let entry = svc.add(ban(BanType::Email, "x@y.z")).await.unwrap();
        svc.remove(&entry.id).await.unwrap();
        assert!(matches!(svc.remove(&entry.id).await, Err(AppError::NotFound(_))));
    }
}
