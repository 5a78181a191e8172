use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryOrder, Set,
};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::entities::submission_entity as submissions;
use crate::error::{AppError, AppResult};
use crate::models::{FieldMap, FieldType, PageConfig, Submission, field_map_to_json};
use crate::services::eligibility::account_id;
use crate::services::feed::{EventFeed, FeedEvent, SubmissionEvent, SubmissionCache};
use crate::services::{BanService, ConfigService};
use crate::utils::{access_password_matches, is_valid_email};

#[derive(Clone)]
pub struct SubmissionService {
    pool: DatabaseConnection,
    config_service: ConfigService,
    ban_service: BanService,
    feed: EventFeed,
    cache: SubmissionCache,
    /// 串行化 "查重 -> 写入"，保证单进程内账号 ID 不重复
    insert_lock: Arc<Mutex<()>>,
}

impl SubmissionService {
    pub fn new(
        pool: DatabaseConnection,
        config_service: ConfigService,
        ban_service: BanService,
        feed: EventFeed,
    ) -> Self {
        Self {
            pool,
            config_service,
            ban_service,
            feed,
            cache: SubmissionCache::new(),
            insert_lock: Arc::new(Mutex::new(())),
        }
    }

    /// 启动时用数据库内容填充缓存
    pub async fn prime(&self) -> AppResult<usize> {
        let all = self.load_all().await?;
        let n = all.len();
        self.cache.prime(all);
        Ok(n)
    }

    /// 按报名时间升序读取全部报名
    pub async fn load_all(&self) -> AppResult<Vec<Submission>> {
        let list = submissions::Entity::find()
            .order_by_asc(submissions::Column::CreatedAt)
            .all(&self.pool)
            .await?;
        Ok(list.into_iter().map(Into::into).collect())
    }

    pub fn list(&self) -> Vec<Submission> {
        self.cache.snapshot()
    }

    /// 访客报名
    ///
    /// 校验顺序：访问密码 -> 活动关闭 -> 必填 -> 格式 -> 规则 -> 黑名单 -> 重复账号；
    /// 任何一步失败都不会写库。
    pub async fn submit(
        &self,
        data: FieldMap,
        rules_accepted: bool,
        access_password: Option<&str>,
    ) -> AppResult<Submission> {
        let config = self.config_service.get().await;

        if config.access_password_enabled
            && !access_password
                .is_some_and(|p| access_password_matches(p, &config.access_password))
        {
            return Err(AppError::AccessDenied);
        }

        if config.tips_disabled {
            return Err(AppError::ValidationError(
                config.tips_disabled_message.clone(),
            ));
        }

        let data = sanitize(data, &config)?;

        if config.rules_enabled && !rules_accepted {
            return Err(AppError::RulesNotAccepted);
        }

        if self.ban_service.is_banned(&data, &config).await? {
            log::warn!("Blocked submission attempt: {:?}", account_id(&data, &config));
            return Err(AppError::Blocked);
        }

        let _guard = self.insert_lock.lock().await;
        self.ensure_unique(&data, &config, None).await?;

        let model = submissions::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            data: Set(field_map_to_json(&data)),
            created_at: Set(Utc::now()),
        }
        .insert(&self.pool)
        .await?;

        let submission = Submission::from(model);
        self.apply(SubmissionEvent::Inserted(submission.clone()));
        Ok(submission)
    }

    /// 管理员修改报名字段（查重时排除自身）
    pub async fn update(&self, id: &str, data: FieldMap) -> AppResult<Submission> {
        let config = self.config_service.get().await;
        let data: FieldMap = data
            .into_iter()
            .map(|(k, v)| (k, v.trim().to_string()))
            .collect();

        let _guard = self.insert_lock.lock().await;
        let existing = submissions::Entity::find_by_id(id.to_string())
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Submission not found".to_string()))?;

        self.ensure_unique(&data, &config, Some(id)).await?;

        let mut am = existing.into_active_model();
        am.data = Set(field_map_to_json(&data));
        let model = am.update(&self.pool).await?;

        let submission = Submission::from(model);
        self.apply(SubmissionEvent::Updated(submission.clone()));
        Ok(submission)
    }

    pub async fn delete(&self, id: &str) -> AppResult<()> {
        let res = submissions::Entity::delete_by_id(id.to_string())
            .exec(&self.pool)
            .await?;
        if res.rows_affected == 0 {
            return Err(AppError::NotFound("Submission not found".to_string()));
        }
        self.apply(SubmissionEvent::Deleted { id: id.to_string() });
        Ok(())
    }

    /// 清空报名；中奖记录保留
    pub async fn clear(&self) -> AppResult<u64> {
        let res = submissions::Entity::delete_many().exec(&self.pool).await?;
        self.apply(SubmissionEvent::Cleared);
        log::info!("Cleared {} submissions", res.rows_affected);
        Ok(res.rows_affected)
    }

    fn apply(&self, event: SubmissionEvent) {
        self.cache.apply(&event);
        self.feed.publish(FeedEvent::Submission(event));
    }

    async fn ensure_unique(
        &self,
        data: &FieldMap,
        config: &PageConfig,
        exclude_id: Option<&str>,
    ) -> AppResult<()> {
        let Some(account) = account_id(data, config) else {
            return Ok(());
        };
        let duplicate = self.load_all().await?.into_iter().any(|s| {
            Some(s.id.as_str()) != exclude_id && account_id(&s.data, config) == Some(account)
        });
        if duplicate {
            log::warn!("Duplicate account id rejected: {account}");
            return Err(AppError::DuplicateAccountId);
        }
        Ok(())
    }
}

/// 只保留启用的字段并去除首尾空白，然后校验必填与格式
fn sanitize(raw: FieldMap, config: &PageConfig) -> AppResult<FieldMap> {
    let mut data = FieldMap::new();
    for field in config.enabled_fields() {
        let value = raw
            .get(&field.id)
            .map(|v| v.trim().to_string())
            .unwrap_or_default();

        if value.is_empty() {
            if field.required {
                return Err(AppError::MissingField(field.label.clone()));
            }
            continue;
        }

        match field.field_type {
            FieldType::Email if !is_valid_email(&value) => {
                return Err(AppError::ValidationError(format!(
                    "Invalid email: {}",
                    field.label
                )));
            }
            FieldType::Number if value.replace(',', ".").parse::<f64>().is_err() => {
                return Err(AppError::ValidationError(format!(
                    "Invalid number: {}",
                    field.label
                )));
            }
            _ => {}
        }
        data.insert(field.id.clone(), value);
    }
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::BanType;
    use crate::models::CreateBanRequest;
    use crate::services::test_db::setup_test_db;
    use sea_orm::PaginatorTrait;
    use serde_json::json;

    async fn setup() -> (SubmissionService, ConfigService, BanService, DatabaseConnection) {
        let db = setup_test_db().await;
        let config = ConfigService::load(db.clone()).await.unwrap();
        let bans = BanService::new(db.clone());
        let svc = SubmissionService::new(db.clone(), config.clone(), bans.clone(), EventFeed::new(16));
        (svc, config, bans, db)
    }

    fn form(name: &str, email: &str, account: &str) -> FieldMap {
        let mut m = FieldMap::new();
        m.insert("fullName".into(), name.into());
        m.insert("email".into(), email.into());
        m.insert("accountId".into(), account.into());
        m
    }

    async fn stored(db: &DatabaseConnection) -> u64 {
        submissions::Entity::find().count(db).await.unwrap()
    }

    #[tokio::test]
    async fn test_submit_trims_and_drops_unknown_fields() {
        let (svc, _, _, _) = setup().await;
        let mut data = form("  Ana ", "ana@example.com", " A1 ");
        data.insert("hacker".into(), "x".into());
        let s = svc.submit(data, false, None).await.unwrap();
        assert_eq!(s.data.get("fullName").unwrap(), "Ana");
        assert_eq!(s.data.get("accountId").unwrap(), "A1");
        assert!(!s.data.contains_key("hacker"));
        assert_eq!(svc.list().len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_account_id_rejected() {
        let (svc, _, _, db) = setup().await;
        svc.submit(form("Ana", "ana@example.com", "A1"), false, None).await.unwrap();
        let err = svc
            .submit(form("Bia", "bia@example.com", "A1"), false, None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::DuplicateAccountId));
        assert_eq!(stored(&db).await, 1);
    }

    #[tokio::test]
    async fn test_blank_account_id_never_duplicate() {
        let (svc, config, _, db) = setup().await;
        config
            .update(json!({ "fields": [
                { "id": "fullName", "label": "Nome", "type": "text", "required": true },
                { "id": "email", "label": "Email", "type": "email", "required": true },
                { "id": "accountId", "label": "ID", "type": "text", "required": false }
            ] }))
            .await
            .unwrap();
        svc.submit(form("Ana", "ana@example.com", ""), false, None).await.unwrap();
        svc.submit(form("Bia", "bia@example.com", "   "), false, None).await.unwrap();
        assert_eq!(stored(&db).await, 2);
    }

    #[tokio::test]
    async fn test_banned_rejected_before_write() {
        let (svc, _, bans, db) = setup().await;
        bans.add(CreateBanRequest {
            ban_type: BanType::Email,
            value: "ANA@example.com".into(),
            reason: String::new(),
        })
        .await
        .unwrap();

        let err = svc
            .submit(form("Ana", " ana@EXAMPLE.com ", "A1"), false, None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Blocked));
        assert_eq!(stored(&db).await, 0);
    }

    #[tokio::test]
    async fn test_validation_errors() {
        let (svc, config, _, db) = setup().await;
        assert!(matches!(
            svc.submit(form("", "ana@example.com", "A1"), false, None).await,
            Err(AppError::MissingField(_))
        ));
        assert!(matches!(
            svc.submit(form("Ana", "nope", "A1"), false, None).await,
            Err(AppError::ValidationError(_))
        ));

        config.update(json!({ "rulesEnabled": true })).await.unwrap();
        assert!(matches!(
            svc.submit(form("Ana", "ana@example.com", "A1"), false, None).await,
            Err(AppError::RulesNotAccepted)
        ));

        config
            .update(json!({ "rulesEnabled": false, "tipsDisabled": true }))
            .await
            .unwrap();
        assert!(svc.submit(form("Ana", "ana@example.com", "A1"), false, None).await.is_err());
        assert_eq!(stored(&db).await, 0);
    }

    #[tokio::test]
    async fn test_access_password_enforced_on_submit() {
        let (svc, config, _, db) = setup().await;
        config
            .update(json!({ "accessPasswordEnabled": true, "accessPassword": "Sorteio" }))
            .await
            .unwrap();

        assert!(matches!(
            svc.submit(form("Ana", "ana@example.com", "A1"), false, None).await,
            Err(AppError::AccessDenied)
        ));
        assert!(matches!(
            svc.submit(form("Ana", "ana@example.com", "A1"), false, Some("errado")).await,
            Err(AppError::AccessDenied)
        ));
        assert_eq!(stored(&db).await, 0);

        svc.submit(form("Ana", "ana@example.com", "A1"), false, Some(" sorteio "))
            .await
            .unwrap();
        assert_eq!(stored(&db).await, 1);
    }

    #[tokio::test]
    async fn test_update_delete_clear() {
        let (svc, _, _, db) = setup().await;
        let a = svc.submit(form("Ana", "ana@example.com", "A1"), false, None).await.unwrap();
        let b = svc.submit(form("Bia", "bia@example.com", "B2"), false, None).await.unwrap();

        // 保持自己的账号 ID 不算重复
        let updated = svc.update(&a.id, form("Ana Maria", "ana@example.com", "A1")).await.unwrap();
        assert_eq!(updated.data.get("fullName").unwrap(), "Ana Maria");
        assert!(matches!(
            svc.update(&a.id, form("Ana", "ana@example.com", "B2")).await,
            Err(AppError::DuplicateAccountId)
        ));

        svc.delete(&b.id).await.unwrap();
        assert!(matches!(svc.delete(&b.id).await, Err(AppError::NotFound(_))));
        assert_eq!(svc.list().len(), 1);

        assert_eq!(svc.clear().await.unwrap(), 1);
        assert!(svc.list().is_empty());
        assert_eq!(stored(&db).await, 0);
    }
}
